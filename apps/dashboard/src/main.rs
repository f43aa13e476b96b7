use std::{io, path::PathBuf, sync::Arc, time::Duration};

mod backend_bridge;
mod config;
mod controller;
mod ui;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::HttpGateway;
use crossbeam_channel::{bounded, unbounded};
use shared::domain::CompareSlot;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiEvent},
    orchestration::DashboardController,
};
use crate::ui::{shell::Shell, view};

/// Upper bound on waiting for a response when no request timeout is set.
const UNBOUNDED_SETTLE: Duration = Duration::from_secs(15 * 60);
const SETTLE_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "clauselens", version, about = "Contract intelligence dashboard")]
struct Cli {
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Overrides the intelligence service base URL.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one contract and print the dashboard panels.
    Analyze { file: PathBuf },
    /// Compare two versions of a contract.
    Compare { base: PathBuf, new: PathBuf },
    /// Analyze a contract, then ask the copilot about it.
    Ask { file: PathBuf, question: String },
    /// Check that the intelligence service is up.
    Health,
    #[cfg(feature = "auth")]
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    #[cfg(feature = "auth")]
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Interactive dashboard over stdin (default).
    Shell,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn failure(err: &UiError) -> anyhow::Error {
    match err.detail() {
        Some(detail) => anyhow!("{} ({detail})", err.message()),
        None => anyhow!("{}", err.message()),
    }
}

fn settle(controller: &mut DashboardController, timeout: Duration) -> Result<()> {
    if controller.wait_until_settled(timeout) {
        return Ok(());
    }
    bail!("{}", controller.state().status())
}

fn analyze(controller: &mut DashboardController, file: PathBuf, timeout: Duration) -> Result<()> {
    controller.open_document(Some(file));
    settle(controller, timeout)?;
    let state = controller.state();
    if let Some(err) = state.single().failure() {
        return Err(failure(err));
    }
    let analysis = state
        .analysis()
        .context("analysis finished without a result")?;
    print!("{}", view::render_analysis(analysis, &state.metrics()));
    Ok(())
}

/// A question that never reaches the worker still resolves to the fallback
/// answer, so the copilot panel is rendered either way.
fn ask(controller: &mut DashboardController, question: &str, timeout: Duration) -> Result<String> {
    if controller.ask_copilot(question) {
        settle(controller, timeout)?;
    }
    Ok(view::render_copilot(controller.state().copilot()))
}

fn run(command: Command, controller: &mut DashboardController, timeout: Duration) -> Result<()> {
    match command {
        Command::Analyze { file } => analyze(controller, file, timeout)?,
        Command::Ask { file, question } => {
            if question.trim().is_empty() {
                bail!("question must not be empty");
            }
            analyze(controller, file, timeout)?;
            println!();
            print!("{}", ask(controller, &question, timeout)?);
        }
        Command::Compare { base, new } => {
            controller.set_compare_file(CompareSlot::Base, Some(base));
            controller.set_compare_file(CompareSlot::New, Some(new));
            controller.run_comparison().map_err(|err| failure(&err))?;
            settle(controller, timeout)?;
            let state = controller.state();
            if let Some(err) = state.compare().failure() {
                return Err(failure(err));
            }
            let comparison = state
                .comparison()
                .context("comparison finished without a result")?;
            print!("{}", view::panel("Semantic Differences", &comparison.comparison));
        }
        Command::Health => {
            controller.check_health();
            settle(controller, timeout)?;
            let state = controller.state();
            if let Some(err) = state.health().failure() {
                return Err(failure(err));
            }
            let status = state
                .health()
                .loaded()
                .context("health check finished without a result")?;
            print!("{}", view::render_health(status));
        }
        #[cfg(feature = "auth")]
        Command::Register {
            name,
            email,
            password,
        } => {
            controller
                .register(&name, &email, &password)
                .map_err(|err| failure(&err))?;
            settle(controller, timeout)?;
            if let Some(err) = controller.state().auth().failure() {
                return Err(failure(err));
            }
            println!("{}", controller.state().status());
        }
        #[cfg(feature = "auth")]
        Command::Login { email, password } => {
            controller
                .login(&email, &password)
                .map_err(|err| failure(&err))?;
            settle(controller, timeout)?;
            if let Some(err) = controller.state().auth().failure() {
                return Err(failure(err));
            }
            println!("{}", controller.state().status());
        }
        Command::Shell => {
            let stdin = io::stdin();
            Shell::new(controller, timeout).run(stdin.lock(), io::stdout())?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = config::load_settings(&cli.config)?;
    if let Some(url) = cli.api_url {
        settings.api_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout_seconds = Some(secs);
    }
    init_tracing(&settings.log_filter);

    let gateway = HttpGateway::new(settings.gateway_config())
        .context("failed to configure the intelligence service client")?;
    tracing::info!(base_url = gateway.base_url(), "using intelligence service");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(settings.command_queue_capacity);
    let (ui_tx, ui_rx) = unbounded::<UiEvent>();
    let worker = backend_bridge::runtime::launch(Arc::new(gateway), cmd_rx, ui_tx);
    let mut controller = DashboardController::new(cmd_tx, ui_rx);

    let timeout = settings
        .request_timeout()
        .map(|limit| limit + SETTLE_GRACE)
        .unwrap_or(UNBOUNDED_SETTLE);
    let outcome = run(
        cli.command.unwrap_or(Command::Shell),
        &mut controller,
        timeout,
    );

    drop(controller);
    if worker.join().is_err() {
        tracing::error!("backend worker panicked");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reducer::CopilotState;
    use shared::protocol::AnalysisResult;

    #[test]
    fn unanswered_analysis_reports_a_timeout() {
        let (cmd_tx, _cmd_rx) = bounded(4);
        let (_ui_tx, ui_rx) = unbounded::<UiEvent>();
        let mut controller = DashboardController::new(cmd_tx, ui_rx);

        let err = analyze(&mut controller, "lease.pdf".into(), Duration::from_millis(30))
            .expect_err("nothing answers");
        assert_eq!(
            err.to_string(),
            "No response from the intelligence service within 30ms"
        );
    }

    #[test]
    fn question_dropped_by_a_full_queue_renders_the_fallback() {
        let (cmd_tx, cmd_rx) = bounded(1);
        let (ui_tx, ui_rx) = unbounded();
        let mut controller = DashboardController::new(cmd_tx, ui_rx);

        assert!(controller.open_document(Some("lease.pdf".into())));
        let ticket = cmd_rx.try_recv().expect("analyze queued").ticket();
        ui_tx
            .send(UiEvent::AnalysisFinished {
                ticket,
                result: Ok(AnalysisResult::default()),
            })
            .expect("send event");
        controller.process_ui_events();
        controller.check_health();
        assert_eq!(cmd_rx.len(), 1);

        let rendered = ask(&mut controller, "Who pays rent?", Duration::from_millis(30))
            .expect("fallback answer");
        assert!(rendered.contains("A: AI unavailable."), "{rendered}");
        assert!(matches!(
            controller.state().copilot(),
            CopilotState::Answered { .. }
        ));
    }
}
