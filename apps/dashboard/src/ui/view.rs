//! Text rendering of the dashboard state. Nothing here mutates state.

use std::fmt::Write as _;

use client_core::DerivedMetrics;
use serde_json::Value;
use shared::{
    domain::{CompareSlot, ViewMode},
    protocol::{AnalysisResult, ServiceStatus},
};

use crate::controller::reducer::{CopilotState, DashboardState, RequestState};

const RULE: &str = "----------------------------------------";

pub fn panel(title: &str, body: &str) -> String {
    let body = body.trim_end();
    let body = if body.is_empty() { "(empty)" } else { body };
    format!("{title}\n{RULE}\n{body}\n")
}

pub fn render_metrics(metrics: &DerivedMetrics) -> String {
    format!(
        "Confidence: {:.0}%  |  Risks: {}  |  Clauses: {}  |  Verdict: {}\n",
        metrics.confidence, metrics.risk_count, metrics.clause_count, metrics.verdict
    )
}

pub fn render_extraction(analysis: &AnalysisResult) -> String {
    serde_json::to_string_pretty(&Value::Object(analysis.extraction.clone()))
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn render_analysis(analysis: &AnalysisResult, metrics: &DerivedMetrics) -> String {
    let mut out = render_metrics(metrics);
    for (title, body) in [
        ("Executive Summary", analysis.summary.clone()),
        ("Risk Intelligence", analysis.risks.clone()),
        ("Extracted Structure", render_extraction(analysis)),
        ("Negotiation Strategy", analysis.negotiation.clone()),
    ] {
        out.push('\n');
        out.push_str(&panel(title, &body));
    }
    out
}

pub fn render_copilot(copilot: &CopilotState) -> String {
    let body = match copilot {
        CopilotState::Idle => "Ask about this contract with `ask <question>`.".to_string(),
        CopilotState::Thinking { question, .. } => format!("Q: {question}\nThinking..."),
        CopilotState::Answered { question, answer } => format!("Q: {question}\nA: {answer}"),
    };
    panel("AI Copilot", &body)
}

fn render_single(state: &DashboardState) -> String {
    let file = state
        .single_file()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "none".to_string());
    let mut out = format!("Document: {file}\n");
    match state.single() {
        RequestState::Idle => out.push_str("Open a contract with `open <path>` to analyze it.\n"),
        RequestState::Pending(_) => out.push_str("Analyzing...\n"),
        RequestState::Failed(err) => {
            let _ = writeln!(out, "Error: {err}");
        }
        RequestState::Loaded(analysis) => {
            out.push('\n');
            out.push_str(&render_analysis(analysis, &state.metrics()));
            out.push('\n');
            out.push_str(&render_copilot(state.copilot()));
        }
    }
    out
}

fn render_compare(state: &DashboardState) -> String {
    let mut out = String::new();
    for slot in [CompareSlot::Base, CompareSlot::New] {
        let file = state
            .compare_files()
            .get(slot)
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "not selected".to_string());
        let _ = writeln!(out, "{}: {file}", slot.label());
    }
    match state.compare() {
        RequestState::Idle => {}
        RequestState::Pending(_) => out.push_str("Analyzing...\n"),
        RequestState::Failed(err) => {
            let _ = writeln!(out, "Error: {err}");
        }
        RequestState::Loaded(result) => {
            out.push('\n');
            out.push_str(&panel("Semantic Differences", &result.comparison));
        }
    }
    out
}

pub fn render_health(status: &ServiceStatus) -> String {
    let mut out = format!("Service status: {}\n", status.status);
    if let Some(mode) = &status.mode {
        let _ = writeln!(out, "Mode: {mode}");
    }
    if !status.methods.is_empty() {
        let _ = writeln!(out, "Methods: {}", status.methods.join(", "));
    }
    out
}

pub fn render_status_line(state: &DashboardState) -> String {
    let status = if state.status().is_empty() {
        "Ready"
    } else {
        state.status()
    };
    format!("[{}] {status}", state.mode())
}

pub fn render_dashboard(state: &DashboardState) -> String {
    let body = match state.mode() {
        ViewMode::Single => render_single(state),
        ViewMode::Compare => render_compare(state),
    };
    format!("{body}\n{}\n", render_status_line(state))
}
