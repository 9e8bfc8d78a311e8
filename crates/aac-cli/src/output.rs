// SPDX-License-Identifier: MIT

//! Human-readable rendering of daemon responses.

use aac_core::{Session, WorkItem};
use aac_daemon::protocol::Response;

pub fn print_response(response: &Response) {
    match response {
        Response::Ok | Response::Pong => println!("ok"),
        Response::WorkItem { item } => println!("{}", item.id),
        Response::WorkItemDetail { item, events } => {
            print_work_item(item);
            println!();
            println!("{:<24} {:<16} {:<16} details", "timestamp_ms", "action", "session");
            for event in events {
                println!(
                    "{:<24} {:<16} {:<16} {}",
                    event.timestamp_ms,
                    event.action,
                    event.session_name.as_deref().unwrap_or("-"),
                    event.details
                );
            }
        }
        Response::WorkItems { items, next_offset } => {
            println!("{:<36} {:<8} {:<10} {:<12} {}", "id", "priority", "status", "task_type", "assigned_session");
            for item in items {
                print_work_item_row(item);
            }
            if let Some(offset) = next_offset {
                println!("(more results at offset {offset})");
            }
        }
        Response::Sessions { sessions } => {
            println!("{:<24} {:<14} {:<10} {:<10} {}", "name", "status", "circuit", "stability", "current_work_id");
            for session in sessions {
                print_session_row(session);
            }
        }
        Response::Stats { queue_counts, session_count } => {
            for (status, count) in queue_counts {
                println!("{status:<12} {count}");
            }
            println!("sessions     {session_count}");
        }
        Response::ConfigReloaded { routing_rules, sla_targets, query_templates } => {
            println!("configuration reloaded: {routing_rules} routing rules, {sla_targets} sla targets, {query_templates} query templates");
        }
        Response::QueryResult { rows, rendered } => match rendered {
            Some(text) => println!("{text}"),
            None => println!("{}", serde_json::to_string_pretty(rows).unwrap_or_default()),
        },
        Response::Error { message, .. } => eprintln!("error: {message}"),
    }
}

fn print_work_item(item: &WorkItem) {
    println!("id:               {}", item.id);
    println!("status:           {}", item.status);
    println!("task_type:        {}", item.task_type);
    println!("priority:         {}", item.priority);
    println!("assigned_session: {}", item.assigned_session.as_deref().unwrap_or("-"));
    println!("retry_count:      {}/{}", item.retry_count, item.max_retries);
    println!("last_error:       {}", item.last_error.as_deref().unwrap_or("-"));
}

fn print_work_item_row(item: &WorkItem) {
    println!(
        "{:<36} {:<8} {:<10} {:<12} {}",
        item.id,
        item.priority,
        item.status,
        item.task_type,
        item.assigned_session.as_deref().unwrap_or("-")
    );
}

fn print_session_row(session: &Session) {
    println!(
        "{:<24} {:<14} {:<10} {:<10.2} {}",
        session.name,
        session.status,
        format!("{:?}", session.circuit_state),
        session.stability_score,
        session.current_work_id.as_deref().unwrap_or("-")
    );
}
