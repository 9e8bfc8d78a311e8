// SPDX-License-Identifier: MIT

//! Intake: the public entry point for admitting new work, wrapping the Queue
//! Store's `enqueue` with its required audit event (spec §4.3: "Side effect:
//! one `queued` AssignmentEvent").

use crate::error::EngineError;
use aac_config::Snapshot;
use aac_core::{AssignmentAction, AssignmentEvent, AssignmentEventId, IdGen, WorkItem, WorkItemConfig, WorkItemId};
use aac_storage::{EventLog, Queue, Store};
use serde_json::json;

pub struct Intake;

impl Intake {
    /// Admit a new WorkItem. `task_type` is resolved against the snapshot's
    /// routing rules, falling back to `default` when unrecognized (spec
    /// §4.3: "task_type must be known in the routing rules or falls back to
    /// `default`").
    pub fn enqueue<G: IdGen>(
        store: &Store,
        snapshot: &Snapshot,
        id_gen: &G,
        mut config: WorkItemConfig,
        now_ms: i64,
    ) -> Result<WorkItem, EngineError> {
        if !snapshot.is_known_task_type(&config.task_type) {
            config.task_type = "default".to_string();
        }
        config.priority = config.priority.min(10);
        // timeout_minutes stays `None` unless the caller supplied an
        // explicit override; the Lifecycle Supervisor resolves the SLA
        // default at evaluation time (spec §4.7).

        let queue = Queue::new(store);
        let events = EventLog::new(store);
        let item = queue.enqueue(WorkItemId::new(id_gen.next()), config, now_ms)?;

        events.append(&AssignmentEvent::new(
            AssignmentEventId::new(id_gen.next()),
            item.id.as_str(),
            None,
            AssignmentAction::Queued,
            now_ms,
            json!({ "priority": item.priority, "task_type": item.task_type }),
        ))?;

        Ok(item)
    }
}

#[cfg(test)]
#[path = "intake_tests.rs"]
mod tests;
