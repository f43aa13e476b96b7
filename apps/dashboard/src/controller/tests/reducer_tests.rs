use super::*;
use client_core::{GatewayError, Verdict};
use serde_json::json;
use shared::{error::ErrorKind, protocol::Extraction};

fn sample_analysis() -> AnalysisResult {
    let mut extraction = Extraction::new();
    extraction.insert("Termination".into(), json!("30 days"));
    extraction.insert("Liability".into(), json!("Capped"));
    AnalysisResult {
        confidence: Some(97.0),
        risks: "Late payment penalty\nAuto-renewal clause\n".into(),
        summary: "Two-year supply agreement.".into(),
        extraction,
        negotiation: "1. Cap penalties".into(),
        doc_id: Some("supply_pdf".into()),
        ..Default::default()
    }
}

fn analyze_ticket(command: Option<BackendCommand>) -> RequestTicket {
    match command {
        Some(BackendCommand::Analyze { ticket, .. }) => ticket,
        other => panic!("expected analyze command, got {other:?}"),
    }
}

fn compare_ticket(command: Result<Option<BackendCommand>, UiError>) -> RequestTicket {
    match command {
        Ok(Some(BackendCommand::Compare { ticket, .. })) => ticket,
        other => panic!("expected compare command, got {other:?}"),
    }
}

fn loaded_single_state() -> DashboardState {
    let mut state = DashboardState::new();
    let ticket = analyze_ticket(state.submit_single(Some("supply.pdf".into())));
    assert!(state.apply(UiEvent::AnalysisFinished {
        ticket,
        result: Ok(sample_analysis()),
    }));
    state
}

fn ready_compare_state() -> DashboardState {
    let mut state = DashboardState::new();
    state.select_mode(ViewMode::Compare);
    state.set_compare_file(CompareSlot::Base, Some("v1.pdf".into()));
    state.set_compare_file(CompareSlot::New, Some("v2.pdf".into()));
    state
}

fn service_error(context: UiErrorContext) -> UiError {
    let err = GatewayError::ServiceError {
        operation: "analyze",
        status: 503,
    };
    UiError::from_gateway(context, &err)
}

#[test]
fn starts_idle_in_single_mode() {
    let state = DashboardState::new();
    assert_eq!(state.mode(), ViewMode::Single);
    assert_eq!(*state.single(), RequestState::Idle);
    assert_eq!(*state.compare(), RequestState::Idle);
    assert!(!state.has_pending());
    assert_eq!(state.metrics().verdict, Verdict::Safe);
}

#[test]
fn submit_without_file_is_a_no_op() {
    let mut state = DashboardState::new();
    assert!(state.submit_single(None).is_none());
    assert_eq!(*state.single(), RequestState::Idle);
    assert!(!state.has_pending());
}

#[test]
fn successful_analysis_loads_and_derives_metrics() {
    let state = loaded_single_state();

    assert_eq!(state.analysis(), Some(&sample_analysis()));
    assert_eq!(state.single_file(), Some(Path::new("supply.pdf")));
    let metrics = state.metrics();
    assert_eq!(metrics.risk_count, 2);
    assert_eq!(metrics.clause_count, 2);
    assert_eq!(metrics.verdict, Verdict::Safe);
    assert_eq!(metrics.confidence, 97.0);
}

#[test]
fn failed_analysis_leaves_no_result() {
    let mut state = DashboardState::new();
    let ticket = analyze_ticket(state.submit_single(Some("supply.pdf".into())));
    let err = service_error(UiErrorContext::Analyze);

    assert!(state.apply(UiEvent::AnalysisFinished {
        ticket,
        result: Err(err.clone()),
    }));

    assert_eq!(state.single().failure(), Some(&err));
    assert!(state.analysis().is_none());
    assert_eq!(state.status(), "Analyze failed");
}

#[test]
fn second_submit_while_pending_is_suppressed() {
    let mut state = DashboardState::new();
    let first = analyze_ticket(state.submit_single(Some("first.pdf".into())));

    assert!(state.submit_single(Some("second.pdf".into())).is_none());
    assert_eq!(*state.single(), RequestState::Pending(first));
    assert_eq!(state.single_file(), Some(Path::new("first.pdf")));

    assert!(state.apply(UiEvent::AnalysisFinished {
        ticket: first,
        result: Ok(sample_analysis()),
    }));
    assert!(state.analysis().is_some());
}

#[test]
fn resubmitting_after_load_starts_a_fresh_request() {
    let mut state = loaded_single_state();
    let ticket = analyze_ticket(state.submit_single(Some("amended.pdf".into())));

    assert_eq!(*state.single(), RequestState::Pending(ticket));
    assert!(state.analysis().is_none());
    assert_eq!(*state.copilot(), CopilotState::Idle);
}

#[test]
fn entering_compare_clears_analysis() {
    let mut state = loaded_single_state();

    state.select_mode(ViewMode::Compare);

    assert_eq!(state.mode(), ViewMode::Compare);
    assert!(state.analysis().is_none());
    assert!(state.single_file().is_none());
    assert_eq!(state.metrics().risk_count, 0);
}

#[test]
fn entering_single_clears_comparison() {
    let mut state = ready_compare_state();
    let ticket = compare_ticket(state.submit_compare());
    assert!(state.apply(UiEvent::ComparisonFinished {
        ticket,
        result: Ok(ComparisonResult {
            comparison: "Liability cap removed.".into(),
        }),
    }));
    assert!(state.comparison().is_some());

    state.select_mode(ViewMode::Single);

    assert!(state.comparison().is_none());
    assert_eq!(*state.compare(), RequestState::Idle);
    assert_eq!(state.compare_files().get(CompareSlot::Base), Some(Path::new("v1.pdf")));
}

#[test]
fn compare_with_one_file_only_signals_validation() {
    let mut state = DashboardState::new();
    state.select_mode(ViewMode::Compare);
    state.set_compare_file(CompareSlot::Base, Some("v1.pdf".into()));

    let err = state.submit_compare().expect_err("second file missing");

    assert_eq!(err.category(), ErrorKind::Validation);
    assert_eq!(err.message(), "Upload both files");
    assert_eq!(state.status(), "Upload both files");
    assert_eq!(*state.compare(), RequestState::Idle);
    assert_eq!(state.compare_files().get(CompareSlot::Base), Some(Path::new("v1.pdf")));
    assert!(state.compare_files().get(CompareSlot::New).is_none());
    assert!(!state.has_pending());
}

#[test]
fn compare_is_single_flight() {
    let mut state = ready_compare_state();
    let ticket = compare_ticket(state.submit_compare());

    assert!(matches!(state.submit_compare(), Ok(None)));
    assert_eq!(*state.compare(), RequestState::Pending(ticket));
}

#[test]
fn failed_comparison_is_reported() {
    let mut state = ready_compare_state();
    let ticket = compare_ticket(state.submit_compare());
    let err = UiError::from_gateway(
        UiErrorContext::Compare,
        &GatewayError::ServiceError {
            operation: "compare",
            status: 500,
        },
    );

    assert!(state.apply(UiEvent::ComparisonFinished {
        ticket,
        result: Err(err.clone()),
    }));

    assert_eq!(state.compare().failure(), Some(&err));
    assert_eq!(state.status(), "Comparison failed");
}

#[test]
fn setting_compare_file_never_issues_a_request() {
    let mut state = DashboardState::new();
    state.set_compare_file(CompareSlot::New, Some("v2.pdf".into()));
    assert!(!state.has_pending());
    assert_eq!(state.mode(), ViewMode::Single);
}

#[test]
fn changing_compare_file_drops_in_flight_comparison() {
    let mut state = ready_compare_state();
    let stale = compare_ticket(state.submit_compare());

    state.set_compare_file(CompareSlot::New, Some("v3.pdf".into()));
    assert_eq!(*state.compare(), RequestState::Idle);

    assert!(!state.apply(UiEvent::ComparisonFinished {
        ticket: stale,
        result: Ok(ComparisonResult {
            comparison: "about v2".into(),
        }),
    }));
    assert!(state.comparison().is_none());

    let fresh = compare_ticket(state.submit_compare());
    assert_ne!(fresh, stale);
}

#[test]
fn reselecting_same_compare_file_keeps_request() {
    let mut state = ready_compare_state();
    let ticket = compare_ticket(state.submit_compare());

    state.set_compare_file(CompareSlot::Base, Some("v1.pdf".into()));

    assert_eq!(*state.compare(), RequestState::Pending(ticket));
}

#[test]
fn analysis_arriving_after_mode_switch_is_discarded() {
    let mut state = DashboardState::new();
    let ticket = analyze_ticket(state.submit_single(Some("supply.pdf".into())));

    state.select_mode(ViewMode::Compare);
    assert!(!state.apply(UiEvent::AnalysisFinished {
        ticket,
        result: Ok(sample_analysis()),
    }));

    state.select_mode(ViewMode::Single);
    assert!(state.analysis().is_none());
    assert_eq!(*state.single(), RequestState::Idle);
}

#[test]
fn stale_ticket_from_earlier_round_is_discarded() {
    let mut state = DashboardState::new();
    let old = analyze_ticket(state.submit_single(Some("old.pdf".into())));
    state.select_mode(ViewMode::Compare);
    let current = analyze_ticket(state.submit_single(Some("current.pdf".into())));
    assert_ne!(old, current);

    assert!(!state.apply(UiEvent::AnalysisFinished {
        ticket: old,
        result: Ok(AnalysisResult::default()),
    }));
    assert_eq!(*state.single(), RequestState::Pending(current));
}

#[test]
fn copilot_requires_loaded_analysis_in_single_mode() {
    let mut state = DashboardState::new();
    assert!(state.ask_copilot("Who are the parties?").is_none());

    let mut state_with_analysis = loaded_single_state();
    assert!(state_with_analysis.ask_copilot("   ").is_none());

    state.select_mode(ViewMode::Compare);
    assert!(state.ask_copilot("Who are the parties?").is_none());
}

#[test]
fn copilot_sends_loaded_extraction_and_records_answer() {
    let mut state = loaded_single_state();

    let Some(BackendCommand::Ask {
        ticket,
        question,
        extraction,
        doc_id,
    }) = state.ask_copilot(" Can we terminate early? ")
    else {
        panic!("expected ask command");
    };
    assert_eq!(question, "Can we terminate early?");
    assert_eq!(extraction.len(), 2);
    assert_eq!(doc_id.as_deref(), Some("supply_pdf"));
    assert!(state.copilot().is_thinking());
    assert!(state.ask_copilot("Another question").is_none());

    assert!(state.apply(UiEvent::CopilotAnswered {
        ticket,
        answer: "Yes, with 30 days notice.".into(),
    }));
    assert_eq!(
        *state.copilot(),
        CopilotState::Answered {
            question: "Can we terminate early?".into(),
            answer: "Yes, with 30 days notice.".into(),
        }
    );
    assert!(state.analysis().is_some());
}

#[test]
fn copilot_answer_after_analysis_cleared_is_discarded() {
    let mut state = loaded_single_state();
    let ticket = state
        .ask_copilot("What is the liability cap?")
        .expect("ask command")
        .ticket();

    state.select_mode(ViewMode::Compare);

    assert!(!state.apply(UiEvent::CopilotAnswered {
        ticket,
        answer: "Capped at fees paid.".into(),
    }));
    assert_eq!(*state.copilot(), CopilotState::Idle);
}

#[test]
fn abandoned_copilot_question_gets_fallback_answer() {
    let mut state = loaded_single_state();
    let ticket = state.ask_copilot("Renewal terms?").expect("ask").ticket();

    state.abandon(
        ticket,
        UiError::backend_unavailable(UiErrorContext::Ask, "queue closed"),
    );

    assert_eq!(
        *state.copilot(),
        CopilotState::Answered {
            question: "Renewal terms?".into(),
            answer: COPILOT_FALLBACK_ANSWER.into(),
        }
    );
    assert!(state.analysis().is_some());
}

#[test]
fn abandoned_analysis_fails_instead_of_hanging() {
    let mut state = DashboardState::new();
    let ticket = analyze_ticket(state.submit_single(Some("supply.pdf".into())));

    state.abandon(
        ticket,
        UiError::backend_unavailable(UiErrorContext::Analyze, "UI command queue is full"),
    );

    assert!(!state.has_pending());
    assert_eq!(
        state.single().failure().map(UiError::message),
        Some("UI command queue is full")
    );
}

#[test]
fn health_result_updates_status() {
    let mut state = DashboardState::new();
    let Some(BackendCommand::Health { ticket }) = state.request_health() else {
        panic!("expected health command");
    };
    assert!(state.request_health().is_none());

    assert!(state.apply(UiEvent::HealthChecked {
        ticket,
        result: Ok(ServiceStatus {
            status: "running".into(),
            ..Default::default()
        }),
    }));
    assert_eq!(state.status(), "Service running");
    assert!(!state.has_pending());
}

#[cfg(feature = "auth")]
#[test]
fn signup_requires_every_field() {
    let mut state = DashboardState::new();

    let err = state
        .submit_register("Dana", "dana@example.com", "")
        .expect_err("missing password");

    assert_eq!(err.message(), "Fill all fields");
    assert_eq!(*state.auth(), RequestState::Idle);
}

#[cfg(feature = "auth")]
#[test]
fn login_round_trip_updates_auth_state() {
    let mut state = DashboardState::new();
    let command = state
        .submit_login("legal@example.com", "hunter2")
        .expect("valid input")
        .expect("command");
    let ticket = command.ticket();
    assert!(matches!(state.submit_login("legal@example.com", "hunter2"), Ok(None)));

    assert!(state.apply(UiEvent::AuthFinished {
        ticket,
        action: AuthAction::Login,
        result: Err(UiError::from_gateway(
            UiErrorContext::Login,
            &GatewayError::Auth { operation: "login" },
        )),
    }));

    assert_eq!(state.status(), "Login failed");
    assert!(state.auth().failure().is_some());
}
