// SPDX-License-Identifier: MIT

//! Routing Engine: decides which work item goes to which session (spec §4.5).

use crate::drift::{DriftConfig, DriftControl};
use crate::error::EngineError;
use aac_config::Snapshot;
use aac_core::{AssignmentAction, AssignmentEvent, AssignmentEventId, CircuitState, IdGen, Session, WorkItem, WorkItemStatus};
use aac_storage::{EventLog, Queue, Registry, Store};
use serde_json::json;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub stability_floor: f64,
    pub drift: DriftConfig,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self { stability_floor: 0.5, drift: DriftConfig::default() }
    }
}

/// One successful routing decision: `item` was claimed and bound to
/// `session_name`.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub item: WorkItem,
    pub session_name: String,
}

pub struct RoutingEngine;

impl RoutingEngine {
    /// Run one routing pass: assign as many eligible (item, session) pairs
    /// as exist, most-eligible first, until no eligible pair remains (spec
    /// §4.5: "routing is work-conserving when any eligible pair exists").
    pub fn run_tick<G: IdGen>(
        store: &Store,
        snapshot: &Snapshot,
        config: &RoutingConfig,
        id_gen: &G,
        now_ms: i64,
    ) -> Result<Vec<Assignment>, EngineError> {
        let queue = Queue::new(store);
        let registry = Registry::new(store);
        let events = EventLog::new(store);
        let mut assignments = Vec::new();

        Self::recover_open_circuits(&registry, &config.drift, now_ms)?;

        loop {
            let candidates = Self::candidate_sessions(&registry, snapshot, config)?;
            if candidates.is_empty() {
                break;
            }
            let pending = queue.list(Some(WorkItemStatus::Pending), None)?;
            let Some((item, session)) = Self::best_pair(&pending, &candidates, snapshot) else {
                break;
            };

            // Claim in the Queue Store only; the Dispatcher owns the
            // Registry binding once delivery actually succeeds (spec §4.6).
            if !queue.mark_assigned(item.id.as_str(), &session.name, now_ms)? {
                // Lost the race to another routing tick; try again with fresh state.
                continue;
            }

            events.append(&AssignmentEvent::new(
                AssignmentEventId::new(id_gen.next()),
                item.id.as_str(),
                Some(session.name.clone()),
                AssignmentAction::Selected,
                now_ms,
                json!({}),
            ))?;

            assignments.push(Assignment { item, session_name: session.name });
        }

        Ok(assignments)
    }

    /// Move any session whose circuit has been open past its cooldown into
    /// `half_open`, admitting a single probe dispatch (spec §4.8: "open →
    /// half_open after cooldown T_open"). Run once per tick, ahead of
    /// candidate selection, so a recovered session is immediately eligible.
    fn recover_open_circuits(registry: &Registry, drift: &DriftConfig, now_ms: i64) -> Result<(), EngineError> {
        for session in registry.list()? {
            if session.circuit_state == CircuitState::Open && DriftControl::cooldown_elapsed(session.circuit_opened_at_ms, now_ms, drift) {
                registry.set_circuit(&session.name, CircuitState::HalfOpen, None)?;
            }
        }
        Ok(())
    }

    fn candidate_sessions(registry: &Registry, snapshot: &Snapshot, config: &RoutingConfig) -> Result<Vec<Session>, EngineError> {
        let sessions = registry.list()?;
        Ok(sessions
            .into_iter()
            .filter(|s| s.is_routable(config.stability_floor))
            .filter(|s| !snapshot.excluded_sessions.iter().any(|excluded| excluded == &s.name))
            .collect())
    }

    /// Eligibility predicate (spec §4.5 step 3) plus the ordering tie-break
    /// (step 4), collapsed into "find the single best pair this pass".
    fn best_pair(pending: &[WorkItem], candidates: &[Session], snapshot: &Snapshot) -> Option<(WorkItem, Session)> {
        let mut best: Option<(WorkItem, Session, RankKey)> = None;

        for item in pending {
            for session in candidates {
                if item.source == session.name {
                    continue; // self-assignment forbidden
                }
                let Some(rank) = Self::eligibility_rank(item, session, snapshot) else {
                    continue;
                };
                let key = RankKey {
                    priority: item.priority,
                    created_at_ms: item.created_at_ms,
                    preference_rank: rank,
                    stability_score: session.stability_score,
                    failure_ratio: failure_ratio(session),
                    session_name: session.name.clone(),
                };
                let is_better = match &best {
                    None => true,
                    Some((_, _, current)) => key.is_better_than(current),
                };
                if is_better {
                    best = Some((item.clone(), session.clone(), key));
                }
            }
        }

        best.map(|(item, session, _)| (item, session))
    }

    /// `None` means ineligible; `Some(rank)` is the preference rank (lower
    /// is better; `usize::MAX` when the rule doesn't define an order).
    fn eligibility_rank(item: &WorkItem, session: &Session, snapshot: &Snapshot) -> Option<usize> {
        if let Some(target) = &item.target_session {
            return if target == &session.name { Some(0) } else { None };
        }
        if let Some(target_provider) = &item.target_provider {
            let provider = aac_core::Provider::from_str(target_provider).ok()?;
            return if provider == session.provider { Some(0) } else { None };
        }
        match snapshot.routing_rule_for(&item.task_type) {
            Some(rule) => {
                if rule.is_excluded(&session.name) {
                    return None;
                }
                match rule.preference_rank(&session.name) {
                    Some(rank) => Some(rank),
                    None if rule.allow_fallback => Some(usize::MAX),
                    None => None,
                }
            }
            // No RoutingRule configured for this task_type: fall back to
            // allowing any non-excluded candidate (spec leaves the
            // "no matching rule" case to the configuration's defaults).
            None => Some(usize::MAX),
        }
    }
}

fn failure_ratio(session: &Session) -> f64 {
    let total = session.total_completed + session.total_failed;
    if total == 0 {
        0.0
    } else {
        session.total_failed as f64 / total as f64
    }
}

/// Ordering key for step 4's tie-break cascade. Encapsulated so the
/// comparison direction for each field reads in one place.
struct RankKey {
    priority: u8,
    created_at_ms: i64,
    preference_rank: usize,
    stability_score: f64,
    failure_ratio: f64,
    session_name: String,
}

impl RankKey {
    fn is_better_than(&self, other: &RankKey) -> bool {
        use std::cmp::Ordering;
        self.priority
            .cmp(&other.priority)
            .reverse() // higher priority wins
            .then(self.created_at_ms.cmp(&other.created_at_ms)) // earlier wins
            .then(self.preference_rank.cmp(&other.preference_rank)) // lower rank wins
            .then(
                self.stability_score
                    .partial_cmp(&other.stability_score)
                    .unwrap_or(Ordering::Equal)
                    .reverse(), // higher stability wins
            )
            .then(
                self.failure_ratio
                    .partial_cmp(&other.failure_ratio)
                    .unwrap_or(Ordering::Equal), // lower failure ratio wins
            )
            .then(self.session_name.cmp(&other.session_name)) // stable lexicographic tiebreak
            == Ordering::Less
    }
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
