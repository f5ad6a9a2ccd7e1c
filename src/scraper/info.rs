use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

use super::PageDocument;
use super::extract::{CompiledSchema, attr_of, extract, text_of};
use super::reviews::parse_reviews;
use crate::error::ScrapeError;
use crate::models::{Gender, PerfumeRecord};

const FOR_TOKEN: &str = "for";

/// Result of reading the info section of a page
#[derive(Debug, Clone, PartialEq)]
pub enum InfoOutcome {
    Record(PerfumeRecord),
    /// The page has no info section
    NoInformation,
}

/// Build a [`PerfumeRecord`] from a product page.
///
/// A missing info section yields [`InfoOutcome::NoInformation`]. Inside the
/// section the brand, rating, rating count and description are required and
/// their absence is a [`ScrapeError::MissingField`]; the two images are
/// optional and no accord bars yields an empty list.
pub fn parse_info(
    document: &PageDocument,
    schema: &CompiledSchema,
) -> Result<InfoOutcome, ScrapeError> {
    let Some(section) = document
        .html()
        .select(&schema.info_section)
        .nth(schema.info_section_index)
    else {
        warn!("No info section on page");
        return Ok(InfoOutcome::NoInformation);
    };
    let section = Some(section);

    let raw_title = extract(Some(document.root()), &schema.title)
        .map(text_of)
        .ok_or(ScrapeError::MissingField("title"))?;
    let (name, gender) = split_title(&raw_title);

    let brand = required_text(section, &schema.brand_name, "brand")?;
    let brand_image_url = optional_attr(section, &schema.brand_logo, "src", "brand logo");
    let bottle_image_url = optional_attr(section, &schema.bottle_image, "src", "bottle image");

    let accords: Vec<String> = section
        .into_iter()
        .flat_map(|s| s.select(&schema.accord))
        .map(|accord| text_of(accord).trim().to_string())
        .collect();

    let rating = required_text(section, &schema.rating_value, "rating")?;
    let rating_count = parse_rating_count(&required_text(
        section,
        &schema.rating_count,
        "rating count",
    )?)?;

    let description = extract(
        extract(section, &schema.description),
        &schema.description_paragraph,
    )
    .map(|p| text_of(p).trim_end().to_string())
    .ok_or(ScrapeError::MissingField("description"))?;

    debug!("Parsed info for {name} by {brand} with {} accords", accords.len());

    Ok(InfoOutcome::Record(PerfumeRecord {
        name,
        gender,
        brand,
        brand_image_url,
        accords,
        bottle_image_url,
        rating,
        rating_count,
        description,
        reviews: parse_reviews(document, schema),
    }))
}

/// Split a raw title like `"Sauvage Dior for men"` into the product name and
/// its audience.
///
/// Without a standalone `for` the perfume is taken to be unisex. Words after
/// `for` that are not `men`/`women` also fall back to unisex.
pub fn split_title(raw: &str) -> (String, Vec<Gender>) {
    let raw = raw.trim();
    let Some(index) = find_for_token(raw) else {
        return (raw.to_string(), Gender::UNISEX.to_vec());
    };

    let name = raw[..index].trim_end().to_string();
    let words: Vec<&str> = raw[index + FOR_TOKEN.len()..].split_whitespace().collect();

    let first = words.first().and_then(|w| Gender::from_word(w));
    let last = words.last().and_then(|w| Gender::from_word(w));

    let gender = match (first, last) {
        (Some(first), Some(last)) if first == last => vec![first],
        (Some(first), Some(last)) => vec![first, last],
        _ => {
            warn!("Unrecognised audience in title {raw:?}, assuming unisex");
            Gender::UNISEX.to_vec()
        }
    };

    (name, gender)
}

/// Byte offset of the first `for` that stands as a word of its own
fn find_for_token(title: &str) -> Option<usize> {
    title.match_indices(FOR_TOKEN).map(|(i, _)| i).find(|&i| {
        let before = title[..i].chars().next_back().is_none_or(char::is_whitespace);
        let after = title[i + FOR_TOKEN.len()..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace);
        before && after
    })
}

/// Parse a vote count such as `"1,234"`
pub fn parse_rating_count(raw: &str) -> Result<i64, ScrapeError> {
    raw.trim()
        .replace(',', "")
        .parse()
        .map_err(|_| ScrapeError::InvalidRatingCount(raw.to_string()))
}

fn required_text(
    scope: Option<ElementRef<'_>>,
    selector: &Selector,
    field: &'static str,
) -> Result<String, ScrapeError> {
    extract(scope, selector)
        .map(|el| text_of(el).trim().to_string())
        .ok_or(ScrapeError::MissingField(field))
}

fn optional_attr(
    scope: Option<ElementRef<'_>>,
    selector: &Selector,
    attr: &str,
    field: &'static str,
) -> Option<String> {
    let value = extract(scope, selector).and_then(|el| attr_of(el, attr));
    if value.is_none() {
        debug!("No {field} on page");
    }
    value
}
