//! Fragrantica product-page layout

use crate::traits::{PageSchema, RetryPolicy, ScraperConfig};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Default configuration for scraping Fragrantica perfume pages
pub fn config() -> ScraperConfig {
    ScraperConfig {
        name: "Fragrantica".to_string(),
        user_agent: USER_AGENT.to_string(),
        retry: RetryPolicy::default(),
        selectors: schema(),
    }
}

/// Selectors matching the current Fragrantica markup
pub fn schema() -> PageSchema {
    // Review fields all live under the same column of a review block
    let review_column = "div.cell.small-10.flex-container.flex-dir-column";

    PageSchema {
        title: "div#toptop".to_string(),
        info_section: r#"div[class="cell small-12"]"#.to_string(),
        info_section_index: 1,
        brand_name: r#"div.cell.small-6.text-center span[itemprop="name"]"#.to_string(),
        brand_logo: r#"div.cell.small-6.text-center img[itemprop="logo"]"#.to_string(),
        accord: "div.accord-bar".to_string(),
        bottle_image: r#"div.cell.small-6.text-center img[itemprop="image"]"#.to_string(),
        rating_value: r#"div.small-12.medium-6.text-center span[itemprop="ratingValue"]"#
            .to_string(),
        rating_count: r#"div.small-12.medium-6.text-center span[itemprop="ratingCount"]"#
            .to_string(),
        description: r#"div.cell.small-12[itemprop="description"]"#.to_string(),
        description_paragraph: "p".to_string(),
        review_list: r#"div[class="grid-x grid-padding-x grid-margin-y"]"#.to_string(),
        review_box: "div.cell.fragrance-review-box".to_string(),
        review_grid: "div.grid-x".to_string(),
        review_body: format!("{review_column} div.flex-child-auto"),
        review_author: format!("{review_column} div.flex-child-shrink p b.idLinkify"),
        review_date: format!(r#"{review_column} div.flex-child-shrink p span[itemprop="datePublished"]"#),
        review_date_attr: "content".to_string(),
        max_reviews: 21,
    }
}
