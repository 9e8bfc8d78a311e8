// SPDX-License-Identifier: MIT

//! Translates IPC [`Request`]s into store/engine calls and [`Response`]s.

use crate::protocol::{Request, Response, EXIT_CONFLICT, EXIT_INVALID_ARGUMENT, EXIT_INVALID_CONFIG, EXIT_NOT_FOUND, EXIT_STORE_UNAVAILABLE};
use aac_config::ConfigService;
use aac_core::{Clock, IdGen, WorkItemConfig, WorkItemStatus};
use aac_engine::{EngineError, Intake, Telemetry};
use aac_storage::{Queue, Registry, Store, StorageError};
use std::sync::Arc;

pub struct Handler<C: Clock, G: IdGen> {
    store: Arc<Store>,
    config: ConfigService,
    clock: Arc<C>,
    id_gen: G,
}

impl<C: Clock, G: IdGen> Handler<C, G> {
    pub fn new(store: Arc<Store>, config: ConfigService, clock: Arc<C>, id_gen: G) -> Self {
        Self { store, config, clock, id_gen }
    }

    pub fn handle(&self, request: Request) -> Response {
        let now_ms = self.clock.epoch_ms();
        match request {
            Request::Ping => Response::Pong,
            Request::Enqueue { payload, source, priority, task_type, target_session, target_provider, timeout_minutes } => {
                let mut item_config = WorkItemConfig::new(payload, source, task_type).with_priority(priority);
                if let Some(session) = target_session {
                    item_config = item_config.with_target_session(session);
                }
                if let Some(provider) = target_provider {
                    item_config = item_config.with_target_provider(provider);
                }
                if let Some(minutes) = timeout_minutes {
                    item_config = item_config.with_timeout_minutes(minutes);
                }
                let snapshot = self.config.get_snapshot();
                match Intake::enqueue(&self.store, &snapshot, &self.id_gen, item_config, now_ms) {
                    Ok(item) => Response::WorkItem { item },
                    Err(err) => self.engine_error_response(err),
                }
            }
            Request::List { status, limit, offset } => {
                let status = match status.as_deref().map(parse_status) {
                    Some(Some(s)) => Some(s),
                    Some(None) => return invalid_argument("unknown work item status"),
                    None => None,
                };
                let telemetry = Telemetry::new(&self.store);
                match telemetry.list_work_items(status, limit, offset.unwrap_or(0)) {
                    Ok(page) => Response::WorkItems { items: page.items, next_offset: page.next_offset },
                    Err(err) => self.engine_error_response(err),
                }
            }
            Request::Get { id } => {
                let telemetry = Telemetry::new(&self.store);
                match telemetry.item_detail(&id) {
                    Ok((item, events)) => Response::WorkItemDetail { item, events },
                    Err(EngineError::Storage(StorageError::WorkItemNotFound(_))) => not_found(&id),
                    Err(err) => self.engine_error_response(err),
                }
            }
            Request::Cancel { id } => match Queue::new(&self.store).cancel(&id, now_ms) {
                Ok(true) => Response::Ok,
                Ok(false) => Response::Error { message: format!("work item '{id}' cannot be cancelled in its current state"), code: EXIT_CONFLICT },
                Err(StorageError::WorkItemNotFound(_)) => not_found(&id),
                Err(err) => self.engine_error_response(EngineError::Storage(err)),
            },
            Request::Retry { id } => match Queue::new(&self.store).retry(&id, "retried via CLI") {
                Ok(true) => Response::Ok,
                Ok(false) => Response::Error { message: format!("work item '{id}' is not eligible for retry"), code: EXIT_CONFLICT },
                Err(StorageError::WorkItemNotFound(_)) => not_found(&id),
                Err(err) => self.engine_error_response(EngineError::Storage(err)),
            },
            Request::Sessions { status } => {
                let telemetry = Telemetry::new(&self.store);
                match telemetry.list_sessions() {
                    Ok(mut sessions) => {
                        if let Some(status) = status {
                            let Some(wanted) = parse_session_status(&status) else {
                                return invalid_argument("unknown session status");
                            };
                            sessions.retain(|s| s.status == wanted);
                        }
                        Response::Sessions { sessions }
                    }
                    Err(err) => self.engine_error_response(err),
                }
            }
            Request::Stats => {
                let telemetry = Telemetry::new(&self.store);
                match telemetry.queue_stats() {
                    Ok(queue_counts) => {
                        let session_count = Registry::new(&self.store).list().map(|s| s.len()).unwrap_or(0);
                        Response::Stats { queue_counts, session_count }
                    }
                    Err(err) => self.engine_error_response(err),
                }
            }
            Request::ConfigReload => match self.config.reload() {
                Ok(snapshot) => Response::ConfigReloaded {
                    routing_rules: snapshot.routing_rules.len(),
                    sla_targets: snapshot.sla_targets.len(),
                    query_templates: snapshot.query_templates.len(),
                },
                Err(err) => Response::Error { message: err.to_string(), code: EXIT_INVALID_CONFIG },
            },
            Request::Query { name, params, format } => {
                let snapshot = self.config.get_snapshot();
                let telemetry = Telemetry::new(&self.store);
                match telemetry.run_query(&snapshot, &name, &params, now_ms) {
                    Ok(rows) => match format {
                        Some(format) => match Telemetry::export(&rows, format.into()) {
                            Ok(rendered) => Response::QueryResult { rows, rendered: Some(rendered) },
                            Err(err) => self.engine_error_response(err),
                        },
                        None => Response::QueryResult { rows, rendered: None },
                    },
                    Err(err) => self.engine_error_response(err),
                }
            }
        }
    }

    fn engine_error_response(&self, err: EngineError) -> Response {
        let code = match &err {
            EngineError::Storage(StorageError::WorkItemNotFound(_)) => EXIT_NOT_FOUND,
            EngineError::Storage(StorageError::SessionNotFound(_)) => EXIT_NOT_FOUND,
            EngineError::Storage(_) => EXIT_STORE_UNAVAILABLE,
            EngineError::Config(_) => EXIT_INVALID_CONFIG,
            EngineError::UnknownQuery(_) | EngineError::InvalidQueryParams(_) => EXIT_INVALID_ARGUMENT,
            EngineError::Multiplex(_) => EXIT_STORE_UNAVAILABLE,
        };
        Response::Error { message: err.to_string(), code }
    }
}

fn not_found(id: &str) -> Response {
    Response::Error { message: format!("work item '{id}' not found"), code: EXIT_NOT_FOUND }
}

fn invalid_argument(message: &str) -> Response {
    Response::Error { message: message.to_string(), code: EXIT_INVALID_ARGUMENT }
}

fn parse_status(s: &str) -> Option<WorkItemStatus> {
    Some(match s {
        "pending" => WorkItemStatus::Pending,
        "assigned" => WorkItemStatus::Assigned,
        "in_progress" => WorkItemStatus::InProgress,
        "completed" => WorkItemStatus::Completed,
        "failed" => WorkItemStatus::Failed,
        "cancelled" => WorkItemStatus::Cancelled,
        "expired" => WorkItemStatus::Expired,
        _ => return None,
    })
}

fn parse_session_status(s: &str) -> Option<aac_core::SessionStatus> {
    Some(match s {
        "idle" => aac_core::SessionStatus::Idle,
        "busy" => aac_core::SessionStatus::Busy,
        "waiting_input" => aac_core::SessionStatus::WaitingInput,
        "unknown" => aac_core::SessionStatus::Unknown,
        "offline" => aac_core::SessionStatus::Offline,
        _ => return None,
    })
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
