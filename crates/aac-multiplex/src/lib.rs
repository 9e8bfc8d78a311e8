// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aac-multiplex: the terminal-multiplexer control surface and the Session
//! Probe built on top of it (spec §4.4).

mod adapter;
mod classifier;
mod fake;
mod probe;
mod tmux;

pub use adapter::{MultiplexAdapter, MultiplexError, WindowInfo};
pub use classifier::{classify, Classification, PatternTable};
pub use fake::FakeMultiplexAdapter;
pub use probe::{ProbeConfig, ProbeSink, SessionProbe};
pub use tmux::TmuxAdapter;
