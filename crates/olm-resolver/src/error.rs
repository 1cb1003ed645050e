use std::time::Duration;

use thiserror::Error;

use crate::operator::SourceKey;
use crate::resolver::ResolutionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A catalog could not be listed; resolution never runs on partial data
    #[error("failed to fetch catalog {catalog}: {source}")]
    Fetch {
        catalog: SourceKey,
        #[source]
        source: Box<Error>,
    },
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("resolution cancelled")]
    Cancelled,
    #[error("resolution did not finish within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Unsatisfiable(#[from] ResolutionError),
}

impl Error {
    /// Attach the catalog a fetch error came from
    pub fn fetch(catalog: SourceKey, err: Error) -> Self {
        match err {
            Error::Cancelled => Error::Cancelled,
            err => Error::Fetch {
                catalog,
                source: Box::new(err),
            },
        }
    }
}
