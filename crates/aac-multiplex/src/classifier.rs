// SPDX-License-Identifier: MIT

//! Pattern-table classification of captured terminal output into a
//! [`SessionStatus`] and [`Provider`] (spec §4.4).
//!
//! Classification is a pure function of the captured lines plus the
//! pattern table: the same capture always yields the same classification.

use aac_core::{Provider, SessionStatus};
use serde::{Deserialize, Serialize};

/// The configured vocabulary the Probe matches captured output against.
/// Loaded from configuration; ships with sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternTable {
    pub idle_tokens: Vec<String>,
    pub busy_tokens: Vec<String>,
    pub waiting_input_tokens: Vec<String>,
    pub provider_tokens: Vec<(String, Provider)>,
    /// How many of the most recent lines count as "recent" for the
    /// busy-dominates-idle tie-break rule.
    pub recent_window: usize,
}

impl Default for PatternTable {
    fn default() -> Self {
        Self {
            idle_tokens: vec!["$ ".into(), "> ".into(), "ready".into(), "Human:".into()],
            busy_tokens: vec!["thinking".into(), "running".into(), "analyzing".into(), "...".into()],
            waiting_input_tokens: vec!["(y/n)".into(), "[1]".into(), "continue?".into(), "Do you want".into()],
            provider_tokens: vec![
                ("claude".into(), Provider::Claude),
                ("codex".into(), Provider::Codex),
                ("ollama".into(), Provider::Ollama),
                ("comet".into(), Provider::Comet),
                ("gemini".into(), Provider::Gemini),
                ("grok".into(), Provider::Grok),
            ],
            recent_window: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: SessionStatus,
    pub provider: Provider,
}

/// Classify a capture of terminal output into a status and provider.
///
/// Tie-break rule (spec §4.4): a busy token within the most recent
/// `recent_window` lines dominates an older idle token; otherwise the
/// freshest matched class wins.
pub fn classify(captured: &str, table: &PatternTable) -> Classification {
    let lines: Vec<&str> = captured.lines().collect();
    let provider = detect_provider(captured, table);

    if lines.is_empty() {
        return Classification { status: SessionStatus::Unknown, provider };
    }

    let recent_start = lines.len().saturating_sub(table.recent_window);
    let recent_lines = &lines[recent_start..];

    if any_line_matches(recent_lines, &table.busy_tokens) {
        return Classification { status: SessionStatus::Busy, provider };
    }

    // Freshest matched class wins: scan from the newest line backward.
    for line in lines.iter().rev() {
        if matches_any(line, &table.waiting_input_tokens) {
            return Classification { status: SessionStatus::WaitingInput, provider };
        }
        if matches_any(line, &table.busy_tokens) {
            return Classification { status: SessionStatus::Busy, provider };
        }
        if matches_any(line, &table.idle_tokens) {
            return Classification { status: SessionStatus::Idle, provider };
        }
    }

    Classification { status: SessionStatus::Unknown, provider }
}

fn any_line_matches(lines: &[&str], tokens: &[String]) -> bool {
    lines.iter().any(|line| matches_any(line, tokens))
}

fn matches_any(line: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|token| line.contains(token.as_str()))
}

fn detect_provider(captured: &str, table: &PatternTable) -> Provider {
    for (token, provider) in &table.provider_tokens {
        if captured.contains(token.as_str()) {
            return *provider;
        }
    }
    Provider::Unknown
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
