use scraper::ElementRef;
use tracing::debug;

use super::PageDocument;
use super::extract::{CompiledSchema, attr_of, extract, text_of};
use crate::models::{ReviewList, ReviewRecord};

/// Read up to `max_reviews` review blocks from the page, in document order.
///
/// Only direct children of the review container are blocks. Blocks without the
/// inner wrapper still use up the cap but add nothing to the returned list.
pub fn parse_reviews(document: &PageDocument, schema: &CompiledSchema) -> ReviewList {
    let Some(container) = document.html().select(&schema.review_list).next() else {
        debug!("No review container on page");
        return ReviewList::NoReviews;
    };

    let reviews: Vec<ReviewRecord> = container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| schema.review_box.matches(el))
        .take(schema.max_reviews)
        .enumerate()
        .filter_map(|(index, block)| {
            let Some(grid) = extract(Some(block), &schema.review_grid) else {
                debug!("Skipping review block {index}: no inner wrapper");
                return None;
            };
            Some(read_review(grid, schema))
        })
        .collect();

    debug!("Parsed {} reviews", reviews.len());
    ReviewList::Found(reviews)
}

fn read_review(grid: ElementRef<'_>, schema: &CompiledSchema) -> ReviewRecord {
    let grid = Some(grid);

    ReviewRecord {
        author: extract(grid, &schema.review_author).map(|el| text_of(el).trim().to_string()),
        date: extract(grid, &schema.review_date)
            .and_then(|el| attr_of(el, &schema.review_date_attr)),
        body: extract(grid, &schema.review_body).map(|el| text_of(el).trim().to_string()),
    }
}
