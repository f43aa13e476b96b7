//! Line-oriented front end. Each input line becomes one controller intent;
//! the dashboard is re-rendered once the resulting requests settle.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::Context;
use shared::domain::{CompareSlot, ViewMode};

use crate::controller::orchestration::DashboardController;
use crate::ui::view;

pub const HELP: &str = "\
Commands:
  mode single|compare   switch dashboard mode
  open <path>           analyze a contract
  ask <question>        ask the copilot about the analyzed contract
  base <path>           select the base version for comparison
  new <path>            select the new version for comparison
  compare               run the semantic comparison
  health                check the intelligence service
  show                  redraw the dashboard
  status                print the status line
  help                  print this help
  quit                  leave the shell
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Mode(ViewMode),
    Open(PathBuf),
    Ask(String),
    Select(CompareSlot, PathBuf),
    Compare,
    Health,
    Show,
    Status,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let require = |what: &str| {
        if rest.is_empty() {
            Err(format!("usage: {word} <{what}>"))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "mode" => match rest.to_ascii_lowercase().as_str() {
            "single" => ShellCommand::Mode(ViewMode::Single),
            "compare" => ShellCommand::Mode(ViewMode::Compare),
            _ => return Err("usage: mode single|compare".to_string()),
        },
        "open" => ShellCommand::Open(require("path")?.into()),
        "ask" => ShellCommand::Ask(require("question")?),
        "base" => ShellCommand::Select(CompareSlot::Base, require("path")?.into()),
        "new" => ShellCommand::Select(CompareSlot::New, require("path")?.into()),
        "compare" => ShellCommand::Compare,
        "health" => ShellCommand::Health,
        "show" => ShellCommand::Show,
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(Some(command))
}

pub struct Shell<'a> {
    controller: &'a mut DashboardController,
    settle_timeout: Duration,
}

impl<'a> Shell<'a> {
    pub fn new(controller: &'a mut DashboardController, settle_timeout: Duration) -> Self {
        Self {
            controller,
            settle_timeout,
        }
    }

    /// Reads commands until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
        writeln!(output, "ClauseLens shell. Type `help` for commands.")?;
        writeln!(output, "{}", view::render_status_line(self.controller.state()))?;

        for line in input.lines() {
            let line = line.context("failed to read shell input")?;
            let command = match parse_line(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(usage) => {
                    writeln!(output, "{usage}")?;
                    continue;
                }
            };
            if command == ShellCommand::Quit {
                break;
            }
            let rendered = self.execute(command);
            output.write_all(rendered.as_bytes())?;
            output.flush()?;
        }
        Ok(())
    }

    /// Runs one command and returns what should be printed.
    pub fn execute(&mut self, command: ShellCommand) -> String {
        tracing::debug!(?command, "shell command");
        match command {
            ShellCommand::Help => return HELP.to_string(),
            ShellCommand::Status => {
                self.controller.process_ui_events();
                return format!("{}\n", view::render_status_line(self.controller.state()));
            }
            ShellCommand::Health => {
                self.controller.check_health();
                self.settle();
                let state = self.controller.state();
                return match state.health().loaded() {
                    Some(status) => view::render_health(status),
                    None => format!("{}\n", view::render_status_line(state)),
                };
            }
            ShellCommand::Mode(mode) => self.controller.select_mode(mode),
            ShellCommand::Open(path) => {
                let queued = self.controller.open_document(Some(path));
                if !queued && self.controller.state().single().is_pending() {
                    return "An analysis is already running; wait for it to finish.\n".to_string();
                }
            }
            ShellCommand::Ask(question) => {
                if self.controller.state().analysis().is_none() {
                    return "Analyze a document first.\n".to_string();
                }
                self.controller.ask_copilot(&question);
            }
            ShellCommand::Select(slot, path) => {
                self.controller.set_compare_file(slot, Some(path));
                if self.controller.state().mode() != ViewMode::Compare {
                    self.controller.select_mode(ViewMode::Compare);
                }
            }
            ShellCommand::Compare => {
                if let Err(err) = self.controller.run_comparison() {
                    return format!("{err}\n");
                }
            }
            ShellCommand::Show => {}
            ShellCommand::Quit => return String::new(),
        }
        self.settle();
        view::render_dashboard(self.controller.state())
    }

    fn settle(&mut self) {
        if !self.controller.wait_until_settled(self.settle_timeout) {
            tracing::info!("requests still in flight; use `show` to refresh");
        }
    }
}
