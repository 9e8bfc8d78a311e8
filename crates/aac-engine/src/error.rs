// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] aac_storage::StorageError),

    #[error(transparent)]
    Config(#[from] aac_config::ConfigError),

    #[error(transparent)]
    Multiplex(#[from] aac_multiplex::MultiplexError),

    #[error("unknown query '{0}'")]
    UnknownQuery(String),

    #[error("invalid query parameters: {0}")]
    InvalidQueryParams(String),
}
