// SPDX-License-Identifier: MIT

//! Background loops the daemon runs concurrently: routing ticks, the
//! delivery worker pool, and the Lifecycle Supervisor's timeout sweep
//! (spec §4.5-§4.7). The Session Probe loop lives in aac-multiplex and is
//! driven directly from `main`.

use aac_config::ConfigService;
use aac_core::{Clock, IdGen};
use aac_engine::{Assignment, Dispatcher, DispatcherConfig, LifecycleSupervisor, RoutingConfig, RoutingEngine};
use aac_multiplex::{MultiplexAdapter, ProbeSink};
use aac_storage::{Registry, Store};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Release any session bindings left over from a previous daemon process
/// that no longer correspond to a live multiplexer window (spec §4.7:
/// sessions that vanish are eventually treated as offline; at startup we
/// don't wait for T_offline to elapse before reconciling).
pub async fn startup_sweep<A: MultiplexAdapter, G: IdGen>(
    store: &Store,
    adapter: &A,
    lifecycle: &LifecycleSupervisor<G>,
    call_timeout: Duration,
    now_ms: i64,
) {
    let Ok(sessions) = Registry::new(store).list() else { return };
    let live = match adapter.list_windows(call_timeout).await {
        Ok(windows) => windows.into_iter().map(|w| w.name).collect::<std::collections::HashSet<_>>(),
        Err(err) => {
            warn!(error = %err, "startup sweep could not enumerate multiplexer windows, skipping reconciliation");
            return;
        }
    };

    for session in sessions {
        if session.current_work_id.is_some() && !live.contains(&session.name) {
            info!(session = %session.name, "startup sweep releasing ghost-bound work item");
            lifecycle.mark_offline(&session.name, now_ms).await;
        }
    }
}

/// Run the Routing Engine on a fixed tick, forwarding each successful
/// `Assignment` to the dispatch worker pool over `dispatch_tx`.
pub async fn run_routing_loop<G: IdGen>(
    store: Arc<Store>,
    config: ConfigService,
    routing_config: RoutingConfig,
    id_gen: G,
    clock: Arc<impl Clock>,
    tick: Duration,
    dispatch_tx: mpsc::Sender<Assignment>,
) {
    loop {
        let snapshot = config.get_snapshot();
        let now_ms = clock.epoch_ms();
        match RoutingEngine::run_tick(&store, &snapshot, &routing_config, &id_gen, now_ms) {
            Ok(assignments) => {
                for assignment in assignments {
                    if dispatch_tx.send(assignment).await.is_err() {
                        warn!("dispatch channel closed, dropping remaining assignments this tick");
                        break;
                    }
                }
            }
            Err(err) => error!(error = %err, "routing tick failed"),
        }
        tokio::time::sleep(tick).await;
    }
}

/// Drain `dispatch_rx`, handing each assignment's payload to the
/// Dispatcher. Runs with `concurrency` assignments in flight at once.
pub async fn run_dispatch_workers<A: MultiplexAdapter, C: Clock, G: IdGen>(
    store: Arc<Store>,
    adapter: Arc<A>,
    clock: Arc<C>,
    id_gen: G,
    config: DispatcherConfig,
    mut dispatch_rx: mpsc::Receiver<Assignment>,
    concurrency: usize,
) {
    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency));
    while let Some(assignment) = dispatch_rx.recv().await {
        let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
        let store = store.clone();
        let adapter = adapter.clone();
        let clock = clock.clone();
        let id_gen = id_gen.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let outcome = Dispatcher::deliver(
                &store,
                adapter.as_ref(),
                clock.as_ref(),
                &id_gen,
                assignment.item.id.as_str(),
                &assignment.session_name,
                &assignment.item.payload,
                &config,
            )
            .await;
            info!(work_item_id = %assignment.item.id, session = %assignment.session_name, outcome = ?outcome, "dispatch attempt finished");
        });
    }
}

/// Periodically sweep `assigned`/`in_progress` items for expired deadlines
/// (spec §4.7's wall-clock-driven timeout trigger).
pub async fn run_timeout_sweep_loop<G: IdGen>(
    lifecycle: Arc<LifecycleSupervisor<G>>,
    config: ConfigService,
    clock: Arc<impl Clock>,
    tick: Duration,
) {
    loop {
        let snapshot = config.get_snapshot();
        let now_ms = clock.epoch_ms();
        match lifecycle.sweep_timeouts(&snapshot, now_ms) {
            Ok(expired) if expired > 0 => info!(expired, "timeout sweep expired work items"),
            Ok(_) => {}
            Err(err) => error!(error = %err, "timeout sweep failed"),
        }
        tokio::time::sleep(tick).await;
    }
}
