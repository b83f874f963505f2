use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("fetch returned non-success status {0}")]
    BadStatus(u16),
    #[error("{0}")]
    Other(String),
}
