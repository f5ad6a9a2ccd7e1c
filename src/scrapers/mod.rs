//! Site-specific page layouts

pub mod fragrantica;
