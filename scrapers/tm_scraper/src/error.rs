use thiserror::Error;

/// Everything the extraction pipeline can fail with.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Could not get url: {url}. Status code: {status}. Response url: {final_url}")]
    RetrievalFailed {
        url: String,
        status: u16,
        final_url: String,
    },
    #[error("{url} was redirected to {final_url}. The entity is probably disabled")]
    RedirectedToDisabledEntity { url: String, final_url: String },
    #[error("No keys found in session storage for {0}")]
    EmptySessionCache(String),
    #[error("No session storage key matching '{topic}' for url: {url}")]
    NoMatchingCacheKey { url: String, topic: String },
    #[error("Competition url contains neither a cup nor a league marker: {0}")]
    UnrecognizedCompetitionPageShape(String),
    #[error("Country '{0}' not found in the countries cache")]
    UnknownCountry(String),
    #[error("Invalid season label: {0}")]
    InvalidSeasonLabel(String),
    #[error("Year {0} has no neighbouring season")]
    YearOutOfRange(i32),
    #[error("Missing element '{what}' in page {url}")]
    MissingElement { what: String, url: String },
    #[error("Could not parse an id from url: {0}")]
    InvalidId(String),
    #[error("Invalid selector: {0}")]
    Selector(String),
    #[error("WebDriver error: {0}")]
    WebDriver(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    pub(crate) fn missing(what: impl Into<String>, url: impl Into<String>) -> Self {
        Self::MissingElement {
            what: what.into(),
            url: url.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
