//! HTML metadata extraction
//!
//! Resolves a page title and description from static HTML using ordered
//! fallback chains:
//!
//! | Field | 1st | 2nd | 3rd |
//! |-------|-----|-----|-----|
//! | title | `og:title` | `<title>` | `twitter:title` |
//! | description | `og:description` | `meta name="description"` | `twitter:description` |
//!
//! The first candidate that is present and non-empty after trimming wins.
//! Each field resolves independently of the other.

use scraper::{Html, Selector};

/// Metadata extracted from a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Where a candidate value is read from
enum Source {
    /// The `content` attribute of the first element matching the selector
    Content(&'static str),
    /// The text of the first element matching the selector
    Text(&'static str),
}

const TITLE_CHAIN: [Source; 3] = [
    Source::Content(r#"meta[property="og:title"]"#),
    Source::Text("title"),
    Source::Content(r#"meta[name="twitter:title"]"#),
];

const DESCRIPTION_CHAIN: [Source; 3] = [
    Source::Content(r#"meta[property="og:description"]"#),
    Source::Content(r#"meta[name="description"]"#),
    Source::Content(r#"meta[name="twitter:description"]"#),
];

/// Extracts the title and description from an HTML document
///
/// Never fails: malformed markup or missing tags simply yield `None` fields.
///
/// # Example
///
/// ```
/// use shiori::enrich::extract_metadata;
///
/// let html = r#"<title>Example Website</title>
///     <meta name="description" content="This is an example website for testing">"#;
/// let metadata = extract_metadata(html);
/// assert_eq!(metadata.title.as_deref(), Some("Example Website"));
/// assert_eq!(
///     metadata.description.as_deref(),
///     Some("This is an example website for testing")
/// );
/// ```
pub fn extract_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    PageMetadata {
        title: first_match(&document, &TITLE_CHAIN),
        description: first_match(&document, &DESCRIPTION_CHAIN),
    }
}

fn first_match(document: &Html, chain: &[Source]) -> Option<String> {
    chain.iter().find_map(|source| lookup(document, source))
}

/// Reads one candidate; any failure along the way counts as "not present"
fn lookup(document: &Html, source: &Source) -> Option<String> {
    let (selector, attribute) = match source {
        Source::Content(selector) => (*selector, Some("content")),
        Source::Text(selector) => (*selector, None),
    };

    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;

    let raw = match attribute {
        Some(name) => element.value().attr(name)?.to_string(),
        None => element.text().collect::<String>(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
