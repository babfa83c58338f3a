use ::scraper::error::SelectorErrorKind;
use std::num::ParseIntError;

/// All errors that can occur while classifying, extracting or scheduling.
#[derive(thiserror::Error, Debug)]
pub enum StalkError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// The HTTP client could not be configured.
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// A CSS selector string could not be parsed.
    #[error("invalid CSS selector: {0}")]
    Selector(String),

    /// Failed to parse an integer from scraped text.
    #[error("failed to parse integer: {0}")]
    IntParse(#[from] ParseIntError),

    /// Failed to parse a date/time from scraped text.
    #[error("failed to parse date: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// Scraped date or time text that does not describe a point in time.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// An expected HTML element was not found on the page.
    #[error("expected element not found: {context}")]
    ElementNotFound { context: &'static str },

    /// No site or resource pattern matches the URL.
    #[error("unrecognized url: {url}")]
    UnrecognizedUrl { url: String },

    /// A command argument is neither a call, a filter nor a time frame.
    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    /// A site extractor gave up on a page.
    #[error("extraction failed for {url}: {reason}")]
    Extraction { url: String, reason: String },

    /// The configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl<'a> From<SelectorErrorKind<'a>> for StalkError {
    fn from(err: SelectorErrorKind<'a>) -> Self {
        StalkError::Selector(err.to_string())
    }
}

/// Errors raised while reading or validating the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has fields of the wrong type.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required option is unset, e.g. the Battlefy URL of a region.
    #[error("missing config option [{section}] {option}")]
    MissingOption { section: String, option: String },

    /// The timezone is not a known IANA zone name.
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// A `Result` alias where the error type is [`StalkError`].
pub type Result<T> = std::result::Result<T, StalkError>;
