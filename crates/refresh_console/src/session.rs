//! Interactive line-command session.

use std::io::Write;

use anyhow::{Context, Result};
use refresh_core::{AppViewModel, Msg};
use refresh_engine::JobLifecycleController;
use refresh_logging::refresh_info;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{parse_command, ConsoleCommand, HELP};
use crate::render;

pub async fn run(controller: &mut JobLifecycleController) -> Result<()> {
    println!("refresh-console, type 'help' for commands.");
    controller.open_form();
    let mut reporter = Reporter::default();
    reporter.observe(&controller.view());
    println!("{}", render::render_form(&controller.view()));
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading from stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(Some(command)) => {
                        if matches!(command, ConsoleCommand::Submit) {
                            reporter.last_notice = None;
                        }
                        execute(controller, command);
                    }
                    Ok(None) => {}
                    Err(err) => println!("{err}"),
                }
                reporter.report(&controller.view());
                prompt();
            }
            alive = controller.process_next() => {
                if !alive {
                    break;
                }
                if controller.consume_dirty() && reporter.report(&controller.view()) {
                    prompt();
                }
            }
        }
    }

    if controller.state().is_busy() {
        if let Some(job) = controller.state().job() {
            println!("Job {} keeps running on the backend.", job.handle);
        }
    }
    controller.teardown();
    refresh_info!("Interactive session closed");
    Ok(())
}

fn execute(controller: &mut JobLifecycleController, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Kind(kind) => {
            controller.select_kind(kind);
            println!("{}", render::render_form(&controller.view()));
        }
        ConsoleCommand::Set(field) => {
            controller.apply_field(field);
            match controller.view().validation {
                Some(err) => println!("Not ready: {err}"),
                None => println!("ok"),
            }
        }
        ConsoleCommand::SelectAll => {
            controller.dispatch(Msg::SelectAllChannels);
            print_selection(&controller.view());
        }
        ConsoleCommand::SelectNone => {
            controller.dispatch(Msg::DeselectAllChannels);
            print_selection(&controller.view());
        }
        ConsoleCommand::Toggle(ids) => {
            controller.dispatch(Msg::ToggleChannels(ids));
            print_selection(&controller.view());
        }
        ConsoleCommand::Channels => {
            println!("{}", render::render_channels(&controller.view().channels));
        }
        ConsoleCommand::Show => println!("{}", render::render_form(&controller.view())),
        ConsoleCommand::Submit => controller.submit(),
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
}

fn print_selection(view: &AppViewModel) {
    println!("{} channel(s) selected: {}", view.channels.selected_count, view.channels.summary());
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Prints what changed since the last report.
#[derive(Default)]
struct Reporter {
    last_notice: Option<String>,
    last_job_line: Option<String>,
    catalog_loading: bool,
}

impl Reporter {
    fn observe(&mut self, view: &AppViewModel) {
        self.last_notice = view.notice.clone();
        self.last_job_line = view.job.as_ref().map(render::render_job);
        self.catalog_loading = view.channels.loading;
    }

    /// Returns true if anything was printed.
    fn report(&mut self, view: &AppViewModel) -> bool {
        let mut printed = false;
        if self.catalog_loading && !view.channels.loading && view.notice.is_none() {
            println!("\nLoaded {} active channel(s).", view.channels.rows.len());
            printed = true;
        }
        if view.notice.is_some() && view.notice != self.last_notice {
            if let Some(notice) = &view.notice {
                println!("\n{notice}");
                printed = true;
            }
            if let Some(details) = view.job.as_ref().and_then(|job| job.details.as_ref()) {
                if !view.notice_is_error {
                    println!("{details}");
                }
            }
        }
        let job_line = view.job.as_ref().map(render::render_job);
        if job_line.is_some() && job_line != self.last_job_line {
            if let Some(line) = &job_line {
                println!("{}", render::timestamped(line));
                printed = true;
            }
        }
        self.observe(view);
        printed
    }
}
