// SPDX-License-Identifier: MIT

//! aac-config: the Configuration Service (spec §4.1).
//!
//! Loads routing rules, SLA targets, and query templates from layered
//! TOML/YAML/JSON files under `config/base`, `config/environments/<env>`,
//! and `config/local`, deep-merges them, and publishes an immutable
//! [`Snapshot`] that the rest of the system reads through [`ConfigService`].

mod error;
mod loader;
mod merge;
mod schema;
mod service;
mod snapshot;

pub use error::ConfigError;
pub use schema::{QueriesFile, RawQueryTemplate, RawRoutingRule, RoutingRulesFile, SlaRulesFile};
pub use service::ConfigService;
pub use snapshot::{FallbackRule, Snapshot};
