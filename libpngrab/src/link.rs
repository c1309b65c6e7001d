use crate::errors::PngError;
use scraper::{Html, Selector};
use tracing::{event, instrument, Level};
use url::{ParseError, Url};

/// Attributes an image url is looked up in, highest priority first.
/// Lazy loading markup keeps a placeholder in `src` and the real asset
/// in one of the data attributes.
pub const SOURCE_ATTRIBUTES: [&str; 4] = ["data-srcset", "data-src", "data-fallback-src", "src"];

/// An `img` element lifted out of the parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageTag {
    attributes: Vec<(String, String)>,
}

/// The url value picked for an image together with the attribute it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    pub attribute: &'static str,
    pub value: String,
}

impl ImageTag {
    pub fn new<K, V, I>(attributes: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Best available source for this image. Declaration order in the markup
    /// does not matter, only [`SOURCE_ATTRIBUTES`] order does.
    pub fn source(&self) -> Option<ImageSource> {
        SOURCE_ATTRIBUTES.iter().find_map(|&attribute| {
            self.attr(attribute).map(|value| ImageSource {
                attribute,
                value: value.to_string(),
            })
        })
    }
}

/// Gets every `img` element of the page in document order.
#[instrument(skip(html_string))]
pub fn get_image_tags(html_string: &str) -> Vec<ImageTag> {
    let html_document = Html::parse_document(html_string);
    let img_tag_selector = Selector::parse("img").unwrap();
    let tags: Vec<ImageTag> = html_document
        .select(&img_tag_selector)
        .map(|element| ImageTag::new(element.value().attrs()))
        .collect();
    tracing::debug!("Found {} image tags", tags.len());
    tags
}

/// Get the full link to an image given the url of the page it was found on.
fn get_full_link(link: &str, page_url: &Url) -> Result<Url, PngError> {
    if link.is_empty() {
        return Err(PngError::InvalidUrl {
            url: link.to_string(),
            message: "empty link".into(),
        });
    }
    match Url::parse(link) {
        Ok(url) => Ok(url),
        Err(e)
            if e == ParseError::EmptyHost
                || e == ParseError::RelativeUrlWithoutBase
                || e == ParseError::RelativeUrlWithCannotBeABaseBase =>
        {
            page_url.join(link).map_err(|e| PngError::InvalidUrl {
                url: link.to_string(),
                message: e.to_string(),
            })
        }
        Err(e) => {
            event!(Level::ERROR, "Failed to get full link for {}", link);
            event!(Level::ERROR, "{}", e);
            Err(PngError::InvalidUrl {
                url: link.to_string(),
                message: e.to_string(),
            })
        }
    }
}

/// The url that is actually requested for an image source. For srcset
/// values only the first candidate is used.
pub fn resolve_request_url(source: &ImageSource, page_url: &Url) -> Result<Url, PngError> {
    let link = if source.attribute == "data-srcset" {
        first_srcset_candidate(&source.value)
    } else {
        source.value.trim()
    };
    let full_link = get_full_link(link, page_url)?;
    tracing::debug!("Full link for {} => {}", source.value, &full_link);
    Ok(full_link)
}

/// Candidate urls run up to the next whitespace. Commas inside them (as in
/// `data:` urls) belong to the url, only trailing ones separate candidates.
fn first_srcset_candidate(srcset: &str) -> &str {
    srcset
        .trim_start_matches(|c: char| c.is_whitespace() || c == ',')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_end_matches(',')
}
