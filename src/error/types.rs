use thiserror::Error;

use crate::chat::ChatError;
use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::venue::CatalogError;

/// Unified result type for the venue guide crate.
pub type Result<T> = std::result::Result<T, PageError>;

/// Errors surfaced by the runtime and the sections it hosts.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("layout tree is empty")]
    EmptyLayout,
    #[error("zone `{0}` not found")]
    ZoneNotFound(String),
    #[error("terminal backend error: {0}")]
    Backend(String),
    #[error("venue catalogue error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
