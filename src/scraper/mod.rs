//! Golf course scorecard scraper.
//!
//! Renders a page in a headless browser, then runs the extraction strategy
//! that fits the site: embedded JSON with a DOM fallback for the known
//! provider, header-driven table parsing for everything else.

pub mod assembler;
pub mod browser;
pub mod course;
pub mod parsers;

pub use assembler::assemble;
pub use browser::{Browser, RenderedPage};
pub use course::{CourseDocument, ExtractionMethod, Hole, Tee, TeeKey};

use tracing::{info, warn};

use crate::config::BrowserSettings;
use crate::error::{Result, ScrapeError};
use parsers::{DomFallbackParser, EmbeddedDataParser, TableParser};

/// Host fragment identifying provider scorecard pages
pub const PROVIDER_HOST: &str = "bluegolf.com";

/// Which extraction path a URL takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteHint {
    Provider,
    Generic,
}

impl SiteHint {
    pub fn from_url(url: &str) -> Self {
        if url.to_lowercase().contains(PROVIDER_HOST) {
            SiteHint::Provider
        } else {
            SiteHint::Generic
        }
    }
}

/// Fetch `url` and extract its scorecard
pub async fn scrape_course(url: &str, settings: &BrowserSettings) -> Result<CourseDocument> {
    let page = browser::fetch(url, settings).await?;
    extract_course(&page, url, SiteHint::from_url(url))
}

/// Run the extraction strategies for `hint` against an already rendered page.
/// Strategies run one after another; a structural failure moves on to the next
/// strategy for the site, the last failure is returned.
pub fn extract_course(page: &RenderedPage, source_url: &str, hint: SiteHint) -> Result<CourseDocument> {
    let course = match hint {
        SiteHint::Generic => TableParser::parse(&page.html, source_url)?,
        SiteHint::Provider => {
            match EmbeddedDataParser::parse(&page.script_contents, &page.title, source_url) {
                Ok(course) => course,
                Err(ScrapeError::NoEmbeddedData) => {
                    warn!("No embedded scorecard data, falling back to DOM tables");
                    DomFallbackParser::parse(&page.html, &page.title, source_url)?
                }
                Err(e) => return Err(e),
            }
        }
    };

    info!(
        "Scraped {} holes from {} via {} (total par {}, tees: {})",
        course.hole_count,
        course.name,
        course.extraction_method,
        course.total_par,
        course
            .tees
            .iter()
            .map(|t| t.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(course)
}
