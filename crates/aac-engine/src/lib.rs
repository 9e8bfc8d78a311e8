// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aac-engine: the Routing Engine, Dispatcher, Lifecycle Supervisor, Drift &
//! Circuit Control, and Telemetry & Query API (spec §4.5-§4.9) built atop
//! aac-storage, aac-config, and aac-multiplex.

mod dispatcher;
mod drift;
mod error;
mod intake;
mod lifecycle;
mod routing;
mod telemetry;

pub use dispatcher::{DeliveryOutcome, Dispatcher, DispatcherConfig};
pub use drift::{DriftConfig, DriftControl};
pub use error::EngineError;
pub use intake::Intake;
pub use lifecycle::{LifecycleConfig, LifecycleSupervisor};
pub use routing::{Assignment, RoutingConfig, RoutingEngine};
pub use telemetry::{ExportFormat, QueryPage, Telemetry};
