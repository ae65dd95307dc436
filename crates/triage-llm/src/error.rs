use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Provider returned no usable text")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, ProviderError>;
