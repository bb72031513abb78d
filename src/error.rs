use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Profile is missing required keys or points at unusable files.
    #[error("cannot find the phpIPAM configuration: {0}")]
    Configuration(String),

    #[error("phpIPAM authentication failed at {url}: {source}")]
    Authentication {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("phpIPAM request failed at {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body did not have the expected shape.
    #[error("unexpected phpIPAM response: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
