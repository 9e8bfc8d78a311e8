// SPDX-License-Identifier: MIT

//! Lifecycle Supervisor: turns session observations and timeouts into queue
//! state transitions (spec §4.7).

use crate::drift::{DriftConfig, DriftControl};
use crate::error::EngineError;
use aac_config::Snapshot;
use aac_core::{AssignmentAction, AssignmentEvent, AssignmentEventId, IdGen, WorkItemStatus};
use aac_multiplex::{Classification, ProbeSink};
use aac_storage::{EventLog, Queue, Registry, Store};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// C: consecutive idle/waiting_input probes required before completion
    /// is considered (spec §4.7: "suppresses spurious idle detections").
    pub consecutive_idle_probes: u32,
    /// Q: quiescence window after the last busy observation, past which
    /// completion is inferred even with no matching evidence pattern.
    pub quiescence_window: Duration,
    /// Substrings in captured output that confirm completion.
    pub completion_patterns: Vec<String>,
    /// Substrings in captured output that indicate a (retryable) failure.
    pub failure_patterns: Vec<String>,
    /// Multiplier applied to `SlaTarget.target_minutes` when a WorkItem has
    /// no explicit timeout override.
    pub critical_multiplier: f64,
    pub drift: DriftConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            consecutive_idle_probes: 2,
            quiescence_window: Duration::from_secs(20),
            completion_patterns: vec!["Human:".to_string(), "$ ".to_string()],
            failure_patterns: vec!["error:".to_string(), "panicked".to_string(), "Traceback".to_string()],
            critical_multiplier: 1.0,
            drift: DriftConfig::default(),
        }
    }
}

#[derive(Default, Clone, Copy)]
struct Tracking {
    idle_streak: u32,
    last_busy_ms: Option<i64>,
    progress_observed: bool,
}

/// Which terminal status an exhausted-retries bound item lands in. Timeouts
/// and session disappearance map to `expired` (spec §4.2: "any non-terminal
/// → expired (equivalent to failed for retry purposes)"); a matched failure
/// pattern maps to `failed`, the DAG's named terminal for that path, with
/// `last_error` populated from the triggering pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerminalKind {
    Expired,
    Failed,
}

/// Consumes Session Probe observations and drives Queue Store transitions.
/// Also performs the periodic timeout sweep (spec §4.7's second trigger,
/// which is wall-clock driven rather than probe driven).
pub struct LifecycleSupervisor<G: IdGen> {
    store: Arc<Store>,
    id_gen: G,
    config: LifecycleConfig,
    tracking: Mutex<HashMap<String, Tracking>>,
}

impl<G: IdGen> LifecycleSupervisor<G> {
    pub fn new(store: Arc<Store>, id_gen: G, config: LifecycleConfig) -> Self {
        Self { store, id_gen, config, tracking: Mutex::new(HashMap::new()) }
    }

    /// Sweep all `assigned`/`in_progress` items for expired deadlines (spec
    /// §4.7: "if (now − assigned_at) > effective_timeout, call expire").
    pub fn sweep_timeouts(&self, snapshot: &Snapshot, now_ms: i64) -> Result<usize, EngineError> {
        let queue = Queue::new(&self.store);
        let mut expired_count = 0;

        for status in [WorkItemStatus::Assigned, WorkItemStatus::InProgress] {
            for item in queue.list(Some(status), None)? {
                let Some(assigned_at) = item.assigned_at_ms else { continue };
                let effective_timeout_minutes = match item.timeout_minutes {
                    Some(minutes) => minutes,
                    None => snapshot.sla_for(&item.task_type).effective_timeout_minutes(self.config.critical_multiplier),
                };
                let deadline_ms = assigned_at + (effective_timeout_minutes as i64) * 60_000;
                if now_ms < deadline_ms {
                    continue;
                }

                self.append_event(item.id.as_str(), item.assigned_session.clone(), AssignmentAction::TimedOut, now_ms, json!({}))?;
                self.resolve_bound_outcome(item.id.as_str(), item.assigned_session.as_deref(), item.retries_exhausted(), now_ms, "timed out", TerminalKind::Expired)?;
                expired_count += 1;
            }
        }

        Ok(expired_count)
    }

    /// Completion, or terminal failure after retries are exhausted, or a
    /// retry: the three ways a bound item can leave its session (spec
    /// §4.7). `fatal` items skip retry and go straight to `failed`.
    fn resolve_bound_outcome(
        &self,
        work_item_id: &str,
        session_name: Option<&str>,
        retries_exhausted: bool,
        now_ms: i64,
        error: &str,
        terminal: TerminalKind,
    ) -> Result<(), EngineError> {
        let queue = Queue::new(&self.store);
        let registry = Registry::new(&self.store);

        if retries_exhausted {
            match terminal {
                TerminalKind::Expired => {
                    queue.expire(work_item_id, now_ms)?;
                }
                TerminalKind::Failed => {
                    queue.mark_failed(work_item_id, error, now_ms)?;
                }
            }
        } else {
            queue.retry(work_item_id, error)?;
            self.append_event(work_item_id, session_name.map(String::from), AssignmentAction::Retried, now_ms, json!({}))?;
        }

        if let Some(session_name) = session_name {
            registry.release(session_name, now_ms)?;
            registry.record_outcome(session_name, false)?;
            let session = registry.get(session_name)?;
            DriftControl::on_outcome(
                &registry,
                session_name,
                false,
                session.circuit_state,
                session.consecutive_failures,
                now_ms,
                &self.config.drift,
            )?;
            self.tracking.lock().remove(session_name);
        }

        Ok(())
    }

    fn append_event(
        &self,
        work_item_id: &str,
        session_name: Option<String>,
        action: AssignmentAction,
        now_ms: i64,
        details: serde_json::Value,
    ) -> Result<(), EngineError> {
        let events = EventLog::new(&self.store);
        events.append(&AssignmentEvent::new(AssignmentEventId::new(self.id_gen.next()), work_item_id, session_name, action, now_ms, details))?;
        Ok(())
    }

    fn contains_any(captured: &str, patterns: &[String]) -> bool {
        patterns.iter().any(|p| captured.contains(p.as_str()))
    }
}

#[async_trait::async_trait]
impl<G: IdGen> ProbeSink for LifecycleSupervisor<G> {
    async fn observe(&self, session_name: &str, classification: Classification, captured: &str, now_ms: i64) {
        let registry = Registry::new(&self.store);
        if registry.update_observed_state(session_name, classification.status, classification.provider, captured, now_ms).is_err() {
            return;
        }

        let Ok(session) = registry.get(session_name) else { return };
        let Some(work_item_id) = session.current_work_id.clone() else {
            self.tracking.lock().remove(session_name);
            return;
        };

        match classification.status {
            aac_core::SessionStatus::Busy => {
                let mut tracking = self.tracking.lock();
                let entry = tracking.entry(session_name.to_string()).or_default();
                entry.last_busy_ms = Some(now_ms);
                entry.idle_streak = 0;
                if !entry.progress_observed {
                    entry.progress_observed = true;
                    drop(tracking);
                    let _ = self.append_event(&work_item_id, Some(session_name.to_string()), AssignmentAction::ObservedProgress, now_ms, json!({}));
                }
            }
            aac_core::SessionStatus::Idle | aac_core::SessionStatus::WaitingInput => {
                if Self::contains_any(captured, &self.config.failure_patterns) {
                    let retries_exhausted = match Queue::new(&self.store).get(&work_item_id) {
                        Ok(item) => item.retries_exhausted(),
                        Err(_) => true,
                    };
                    let _ = self.append_event(&work_item_id, Some(session_name.to_string()), AssignmentAction::Failed, now_ms, json!({}));
                    let _ = self.resolve_bound_outcome(&work_item_id, Some(session_name), retries_exhausted, now_ms, "failure pattern matched", TerminalKind::Failed);
                    return;
                }

                let (idle_streak, last_busy_ms) = {
                    let mut tracking = self.tracking.lock();
                    let entry = tracking.entry(session_name.to_string()).or_default();
                    entry.idle_streak += 1;
                    (entry.idle_streak, entry.last_busy_ms)
                };

                let quiescent = last_busy_ms.map(|t| now_ms.saturating_sub(t) as u64 >= self.config.quiescence_window.as_millis() as u64).unwrap_or(true);
                let evidence = Self::contains_any(captured, &self.config.completion_patterns);

                if idle_streak >= self.config.consecutive_idle_probes && (evidence || quiescent) {
                    let queue = Queue::new(&self.store);
                    if queue.mark_completed(&work_item_id, now_ms).unwrap_or(false) {
                        let _ = registry.release(session_name, now_ms);
                        let _ = registry.record_outcome(session_name, true);
                        if let Ok(session) = registry.get(session_name) {
                            let _ = DriftControl::on_outcome(&registry, session_name, true, session.circuit_state, session.consecutive_failures, now_ms, &self.config.drift);
                        }
                        let _ = self.append_event(&work_item_id, Some(session_name.to_string()), AssignmentAction::Completed, now_ms, json!({}));
                        self.tracking.lock().remove(session_name);
                        info!(work_item_id, session_name, "work item completed");
                    }
                }
            }
            aac_core::SessionStatus::Unknown | aac_core::SessionStatus::Offline => {}
        }
    }

    async fn mark_offline(&self, session_name: &str, now_ms: i64) {
        let registry = Registry::new(&self.store);
        let Ok(Some(work_item_id)) = registry.mark_offline(session_name, now_ms) else {
            return;
        };
        let retries_exhausted = match Queue::new(&self.store).get(&work_item_id) {
            Ok(item) => item.retries_exhausted(),
            Err(_) => true,
        };
        let _ = self.append_event(&work_item_id, Some(session_name.to_string()), AssignmentAction::TimedOut, now_ms, json!({ "reason": "session_offline" }));
        if retries_exhausted {
            let _ = Queue::new(&self.store).expire(&work_item_id, now_ms);
        } else {
            let _ = Queue::new(&self.store).retry(&work_item_id, "session went offline");
            let _ = self.append_event(&work_item_id, Some(session_name.to_string()), AssignmentAction::Retried, now_ms, json!({}));
        }
        self.tracking.lock().remove(session_name);
    }

    async fn known_session_names(&self) -> Vec<String> {
        Registry::new(&self.store).list().map(|sessions| sessions.into_iter().map(|s| s.name).collect()).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
