// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aac-daemon: the long-running process (`aacd`) that owns the Store,
//! Configuration Service, Session Probe, Routing Engine, Dispatcher, and
//! Lifecycle Supervisor, and exposes them to `aac` over a Unix socket
//! (spec §6).

pub mod env;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod supervisor;
pub mod wire;

pub use env::{DaemonEnv, EnvError};
pub use handler::Handler;
pub use protocol::{ExportFormat, Request, Response};
pub use server::Server;
