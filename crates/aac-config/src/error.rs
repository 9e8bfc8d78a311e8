// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config layer {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config layer {path} failed to parse: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("config layer {path} violated schema: {message}")]
    Schema { path: PathBuf, message: String },

    #[error("unrecognized config file extension in {path}")]
    UnknownFormat { path: PathBuf },
}
