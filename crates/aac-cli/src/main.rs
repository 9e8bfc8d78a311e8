// SPDX-License-Identifier: MIT

//! aac - Agent Assignment Core CLI
//!
//! Thin client over `aacd`'s Unix socket (spec §6).

mod client;
mod output;

use clap::{Parser, Subcommand};
use client::{ClientError, DaemonClient};
use aac_daemon::protocol::{ExportFormat as WireExportFormat, Request, Response, EXIT_STORE_UNAVAILABLE};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aac", version, about = "Agent Assignment Core CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Admit a new work item. Reads the payload from <file>, or stdin if "-".
    Enqueue {
        file: String,
        #[arg(long, default_value_t = 0)]
        priority: u8,
        #[arg(long = "task-type", default_value = "generic")]
        task_type: String,
        #[arg(long = "source", default_value = "cli")]
        source: String,
        #[arg(long = "target-session")]
        target_session: Option<String>,
        #[arg(long = "target-provider")]
        target_provider: Option<String>,
        #[arg(long = "timeout")]
        timeout: Option<u32>,
    },
    /// List work items, optionally filtered by status.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },
    /// Fetch a work item and its event history.
    Get { id: String },
    /// Cancel a work item.
    Cancel { id: String },
    /// Force a retryable work item back to pending immediately.
    Retry { id: String },
    /// List sessions, optionally filtered by status.
    Sessions {
        #[arg(long)]
        status: Option<String>,
    },
    /// Print queue and session counts.
    Stats,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Run a named query template.
    Query {
        name: String,
        /// Bound parameters as key=value pairs.
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
        #[arg(long, value_enum)]
        format: Option<CliExportFormat>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Reload routing rules, SLA targets, and query templates from disk.
    Reload,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliExportFormat {
    Json,
    Csv,
}

impl From<CliExportFormat> for WireExportFormat {
    fn from(value: CliExportFormat) -> Self {
        match value {
            CliExportFormat::Json => WireExportFormat::Json,
            CliExportFormat::Csv => WireExportFormat::Csv,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) => Ok((k.to_string(), v.to_string())),
        None => Err(format!("expected key=value, got '{s}'")),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let request = match build_request(cli.command) {
        Ok(request) => request,
        Err(message) => {
            eprintln!("error: {message}");
            std::process::exit(aac_daemon::protocol::EXIT_INVALID_ARGUMENT as i32);
        }
    };

    let client = DaemonClient::new(client::socket_path());
    match client.call(request).await {
        Ok(Response::Error { message, code }) => {
            eprintln!("error: {message}");
            std::process::exit(code as i32);
        }
        Ok(response) => {
            output::print_response(&response);
        }
        Err(ClientError::DaemonNotRunning(path)) => {
            eprintln!("error: daemon not running (no socket at {})", path.display());
            std::process::exit(EXIT_STORE_UNAVAILABLE as i32);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(EXIT_STORE_UNAVAILABLE as i32);
        }
    }
}

fn build_request(command: Commands) -> Result<Request, String> {
    match command {
        Commands::Enqueue { file, priority, task_type, source, target_session, target_provider, timeout } => {
            let payload = read_payload(&file).map_err(|err| format!("failed to read '{file}': {err}"))?;
            Ok(Request::Enqueue {
                payload,
                source,
                priority,
                task_type,
                target_session,
                target_provider,
                timeout_minutes: timeout,
            })
        }
        Commands::List { status, limit, offset } => Ok(Request::List { status, limit, offset }),
        Commands::Get { id } => Ok(Request::Get { id }),
        Commands::Cancel { id } => Ok(Request::Cancel { id }),
        Commands::Retry { id } => Ok(Request::Retry { id }),
        Commands::Sessions { status } => Ok(Request::Sessions { status }),
        Commands::Stats => Ok(Request::Stats),
        Commands::Config { action } => match action {
            ConfigCommand::Reload => Ok(Request::ConfigReload),
        },
        Commands::Query { name, params, format } => Ok(Request::Query {
            name,
            params: params.into_iter().map(|(k, v)| (k, serde_json::Value::String(v))).collect(),
            format: format.map(Into::into),
        }),
    }
}

fn read_payload(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(PathBuf::from(file))
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
