// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aac-storage: the embedded SQL store backing the Queue Store, Session
//! Registry, and assignment event log (spec §6: "a relational database
//! (default: embedded single-file SQL store)").

mod error;
mod events;
mod migration;
mod queue;
mod query;
mod registry;
mod store;

pub use error::StorageError;
pub use events::EventLog;
pub use migration::CURRENT_SCHEMA_VERSION;
pub use queue::Queue;
pub use query::run_named_query;
pub use registry::Registry;
pub use store::Store;
