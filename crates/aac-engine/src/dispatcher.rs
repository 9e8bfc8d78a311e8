// SPDX-License-Identifier: MIT

//! Dispatcher: delivers a claimed work item's payload to its session and
//! records the handoff (spec §4.6).

use crate::drift::{DriftConfig, DriftControl};
use aac_core::{AssignmentAction, AssignmentEvent, AssignmentEventId, Clock, IdGen};
use aac_multiplex::MultiplexAdapter;
use aac_storage::{EventLog, Queue, Registry, Store};
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub send_timeout: Duration,
    pub drift: DriftConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            send_timeout: Duration::from_secs(5),
            drift: DriftConfig::default(),
        }
    }
}

/// Outcome of one `deliver` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Payload transmitted; item moved to `in_progress`, session bound.
    Delivered,
    /// All attempts failed; item returned to `pending` for another routing
    /// pass, and the caller should report the delivery failure to the
    /// circuit controller.
    Failed,
}

pub struct Dispatcher;

impl Dispatcher {
    /// Transmit `item`'s payload to `session_name`'s terminal, retrying with
    /// exponential backoff and jitter up to `config.max_attempts` times.
    pub async fn deliver<A: MultiplexAdapter, C: Clock, G: IdGen>(
        store: &Store,
        adapter: &A,
        clock: &C,
        id_gen: &G,
        work_item_id: &str,
        session_name: &str,
        payload: &str,
        config: &DispatcherConfig,
    ) -> DeliveryOutcome {
        let queue = Queue::new(store);
        let registry = Registry::new(store);
        let events = EventLog::new(store);

        for attempt in 1..=config.max_attempts {
            let sent = adapter.send_text(session_name, payload, config.send_timeout).await;
            let submitted = match sent {
                Ok(()) => adapter.send_submit(session_name, config.send_timeout).await,
                Err(err) => Err(err),
            };

            match submitted {
                Ok(()) => {
                    let now_ms = clock.epoch_ms();
                    let _ = queue.mark_in_progress(work_item_id);
                    let _ = registry.bind(session_name, work_item_id, now_ms);
                    let _ = events.append(&AssignmentEvent::new(
                        AssignmentEventId::new(id_gen.next()),
                        work_item_id,
                        Some(session_name.to_string()),
                        AssignmentAction::Delivered,
                        now_ms,
                        json!({ "attempt": attempt }),
                    ));
                    info!(work_item_id, session_name, attempt, "delivered work item");
                    return DeliveryOutcome::Delivered;
                }
                Err(err) => {
                    warn!(work_item_id, session_name, attempt, error = %err, "delivery attempt failed");
                    if attempt < config.max_attempts {
                        let backoff = config.base_backoff * 2u32.pow(attempt - 1);
                        let jitter_ms = rand::random::<u64>() % 50;
                        tokio::time::sleep(backoff + Duration::from_millis(jitter_ms)).await;
                    }
                }
            }
        }

        let now_ms = clock.epoch_ms();
        let _ = queue.retry(work_item_id, "delivery failed after max attempts");
        let _ = events.append(&AssignmentEvent::new(
            AssignmentEventId::new(id_gen.next()),
            work_item_id,
            Some(session_name.to_string()),
            AssignmentAction::Failed,
            now_ms,
            json!({ "reason": "delivery_exhausted" }),
        ));

        // Feed the exhausted delivery into the circuit controller (spec
        // §4.6: "records the session as delivery-failing for the circuit
        // controller"), the same counters a lifecycle-observed failure uses.
        let _ = registry.record_outcome(session_name, false);
        if let Ok(session) = registry.get(session_name) {
            let _ = DriftControl::on_outcome(&registry, session_name, false, session.circuit_state, session.consecutive_failures, now_ms, &config.drift);
        }

        DeliveryOutcome::Failed
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
