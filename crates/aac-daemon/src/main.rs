// SPDX-License-Identifier: MIT

//! Agent Assignment Core Daemon (aacd).
//!
//! Background process that owns the Store, Configuration Service, Session
//! Probe, Routing Engine, Dispatcher, and Lifecycle Supervisor, and serves
//! the `aac` CLI over a Unix domain socket (spec §6).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use aac_config::ConfigService;
use aac_core::{Clock, SystemClock, UuidIdGen};
use aac_daemon::env::DaemonEnv;
use aac_daemon::handler::Handler;
use aac_daemon::server::Server;
use aac_daemon::supervisor;
use aac_engine::{DispatcherConfig, DriftConfig, LifecycleConfig, LifecycleSupervisor, RoutingConfig};
use aac_multiplex::{ProbeConfig, SessionProbe, TmuxAdapter};
use aac_storage::Store;
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("aacd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("usage: aacd [--help | --version]");
                std::process::exit(2);
            }
        }
    }

    let env = DaemonEnv::from_env().map_err(|err| {
        eprintln!("error: {err}");
        err
    })?;

    let _log_guard = setup_logging();
    info!(?env, "starting aacd");

    let store = Arc::new(Store::open(&env.db_path)?);
    let config = ConfigService::load(env.config_dir.clone(), std::env::var("ASSIGNER_ENV").ok())?;
    let clock = Arc::new(SystemClock);
    let id_gen = UuidIdGen;
    let adapter = Arc::new(TmuxAdapter::default());

    let drift_config = DriftConfig {
        alpha: env.drift_ema_alpha,
        failure_threshold: env.circuit_failure_threshold,
        cooldown_ms: env.circuit_open.as_millis() as i64,
    };
    let lifecycle_config = LifecycleConfig { drift: drift_config.clone(), ..LifecycleConfig::default() };
    let lifecycle = Arc::new(LifecycleSupervisor::new(store.clone(), id_gen.clone(), lifecycle_config));

    supervisor::startup_sweep(&store, adapter.as_ref(), &lifecycle, std::time::Duration::from_secs(2), clock.epoch_ms()).await;

    let probe_config = ProbeConfig {
        poll_interval: env.probe_interval,
        ..ProbeConfig::default()
    };
    let mut probe = SessionProbe::new(adapter.clone(), lifecycle.clone(), clock.clone(), probe_config);
    tokio::spawn(async move { probe.run_forever().await });

    let (dispatch_tx, dispatch_rx) = mpsc::channel(256);

    let routing_config = RoutingConfig { stability_floor: env.stability_floor, drift: drift_config.clone() };
    tokio::spawn(supervisor::run_routing_loop(
        store.clone(),
        config.clone(),
        routing_config,
        id_gen.clone(),
        clock.clone(),
        env.route_tick,
        dispatch_tx,
    ));

    let dispatcher_config = DispatcherConfig { max_attempts: env.delivery_max_attempts, drift: drift_config, ..DispatcherConfig::default() };
    tokio::spawn(supervisor::run_dispatch_workers(store.clone(), adapter.clone(), clock.clone(), id_gen.clone(), dispatcher_config, dispatch_rx, 8));

    tokio::spawn(supervisor::run_timeout_sweep_loop(lifecycle.clone(), config.clone(), clock.clone(), env.route_tick));

    let socket_path = env.db_path.with_extension("sock");
    let _ = std::fs::remove_file(&socket_path);
    let listener = UnixListener::bind(&socket_path)?;
    info!(socket = %socket_path.display(), "listening for CLI connections");

    let handler = Arc::new(Handler::new(store, config, clock, id_gen));
    let server = Server::new(listener, handler);
    server.run().await;

    Ok(())
}

fn print_help() {
    println!("aacd {}", env!("CARGO_PKG_VERSION"));
    println!("Agent Assignment Core daemon — not meant to be run directly by operators.");
    println!();
    println!("USAGE:");
    println!("    aacd");
    println!();
    println!("The daemon is started by the `aac` CLI and listens on a Unix socket");
    println!("at $ASSIGNER_DB_PATH with a `.sock` extension.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}

fn setup_logging() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();
    guard
}
