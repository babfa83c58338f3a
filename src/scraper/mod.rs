pub(crate) mod battlefy;
pub(crate) mod challengermode;
pub(crate) mod primeleague;
pub(crate) mod summoners_inn;
pub(crate) mod toornament;

pub(crate) use ::scraper::Html;
use ::scraper::{ElementRef, Selector};
use itertools::Itertools;
use tracing::debug;

use crate::error::{Result, StalkError};

/// Fetch a URL and parse the response body as an HTML document.
pub(crate) async fn get_document(client: &reqwest::Client, url: &str) -> Result<Html> {
    debug!(url, "fetching page");

    let response = client.get(url).send().await.map_err(|e| StalkError::Http {
        url: url.to_owned(),
        source: e,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(StalkError::UnexpectedStatus {
            url: url.to_owned(),
            status,
        });
    }

    let body = response.text().await.map_err(|e| StalkError::ResponseBody {
        url: url.to_owned(),
        source: e,
    })?;

    Ok(Html::parse_document(&body))
}

/// Extract trimmed text content from the first element matching `selector`
/// inside `element`. Returns an empty string if nothing matches.
pub(crate) fn select_text(element: &ElementRef, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|e| element_text(&e))
        .unwrap_or_default()
}

/// All text below `element`, trimmed and joined by single spaces.
pub(crate) fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .join(" ")
}

/// `href` of every link matching `selector`, absolute and in page order,
/// with duplicates removed.
pub(crate) fn collect_links(
    element: &ElementRef,
    selector: &Selector,
    base_url: &str,
) -> Vec<String> {
    element
        .select(selector)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| absolute_url(base_url, href.trim()))
        .unique()
        .collect()
}

/// Normalize a potentially relative link to an absolute URL on `base_url`.
pub(crate) fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{}{href}", base_url.trim_end_matches('/'))
    } else {
        href.to_string()
    }
}

/// Scheme and host of `url`, e.g. `https://www.toornament.com`.
pub(crate) fn origin(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("https", url));
    let host = rest.split('/').next().unwrap_or_default();
    format!("{scheme}://{host}")
}
