use thiserror::Error;

use intake_spec::CatalogError;

use crate::archive::ArchiveError;
use crate::config::ConfigError;
use crate::notify::NotifyError;
use crate::repository::RepositoryError;

/// Failures while wiring a session together from configuration.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}
