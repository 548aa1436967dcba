#[derive(Debug, thiserror::Error)]
pub enum WastewatchError {
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WastewatchError>;
