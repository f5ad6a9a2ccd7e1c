//! Best-effort element lookups over a parsed page

use scraper::{ElementRef, Selector};

use crate::error::ScrapeError;
use crate::traits::PageSchema;

/// First element matching `selector` inside `scope`.
///
/// An absent scope resolves to `None`, so lookups can be chained without
/// checking each intermediate step.
pub fn extract<'a>(scope: Option<ElementRef<'a>>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope?.select(selector).next()
}

/// Concatenated text of an element and its descendants
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

pub fn attr_of(element: ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(str::to_string)
}

/// A [`PageSchema`] with every selector parsed
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub title: Selector,
    pub info_section: Selector,
    pub info_section_index: usize,
    pub brand_name: Selector,
    pub brand_logo: Selector,
    pub accord: Selector,
    pub bottle_image: Selector,
    pub rating_value: Selector,
    pub rating_count: Selector,
    pub description: Selector,
    pub description_paragraph: Selector,
    pub review_list: Selector,
    pub review_box: Selector,
    pub review_grid: Selector,
    pub review_body: Selector,
    pub review_author: Selector,
    pub review_date: Selector,
    pub review_date_attr: String,
    pub max_reviews: usize,
}

impl CompiledSchema {
    pub fn compile(schema: &PageSchema) -> Result<Self, ScrapeError> {
        Ok(Self {
            title: compile("title", &schema.title)?,
            info_section: compile("info_section", &schema.info_section)?,
            info_section_index: schema.info_section_index,
            brand_name: compile("brand_name", &schema.brand_name)?,
            brand_logo: compile("brand_logo", &schema.brand_logo)?,
            accord: compile("accord", &schema.accord)?,
            bottle_image: compile("bottle_image", &schema.bottle_image)?,
            rating_value: compile("rating_value", &schema.rating_value)?,
            rating_count: compile("rating_count", &schema.rating_count)?,
            description: compile("description", &schema.description)?,
            description_paragraph: compile(
                "description_paragraph",
                &schema.description_paragraph,
            )?,
            review_list: compile("review_list", &schema.review_list)?,
            review_box: compile("review_box", &schema.review_box)?,
            review_grid: compile("review_grid", &schema.review_grid)?,
            review_body: compile("review_body", &schema.review_body)?,
            review_author: compile("review_author", &schema.review_author)?,
            review_date: compile("review_date", &schema.review_date)?,
            review_date_attr: schema.review_date_attr.clone(),
            max_reviews: schema.max_reviews,
        })
    }
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|_| ScrapeError::InvalidSelector {
        field,
        selector: selector.to_string(),
    })
}
