use anyhow::Result;
use clap::Parser;
use std::io;
use std::process::ExitCode;

use student_roster::commands;
use student_roster::config::{Cli, Command};
use student_roster::{logging, Store};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match logging::init(&cli.log_target()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Command failed");
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the selected command; Ok(false) means it finished but found problems
fn run(cli: &Cli) -> Result<bool> {
    if *cli.mode() == Command::Tui {
        return run_ui_mode(cli);
    }

    let (mut store, report) = Store::open(&cli.file)?;
    let mut out = io::stdout().lock();

    if *cli.mode() == Command::Check {
        return commands::check(&store, &report, &mut out);
    }
    commands::report_load(&mut io::stderr(), &store, &report)?;

    match cli.mode() {
        Command::List { json } => commands::list(&store, *json, &mut out)?,
        Command::Search { surname, group, json } => {
            commands::search(&store, surname, group, *json, &mut out)?;
        }
        Command::Add(args) => commands::add(&mut store, &args.to_form(), &mut out)?,
        Command::Edit { row, changes } => {
            if changes.is_empty() {
                anyhow::bail!("Nothing to change: pass at least one of --surname, --name, --patronymic, --age, --city, --group");
            }
            commands::edit(&mut store, *row, |form| changes.apply(form), &mut out)?;
        }
        Command::Remove { row } => commands::remove(&mut store, *row, &mut out)?,
        Command::Tui | Command::Check => {}
    }

    Ok(true)
}

#[cfg(feature = "tui")]
fn run_ui_mode(cli: &Cli) -> Result<bool> {
    use student_roster::ui;

    let mut store = Store::new(&cli.file);
    let report = store.reload();

    let mut app = ui::App::new(store, report);
    ui::run_ui(&mut app)?;

    Ok(true)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_cli: &Cli) -> Result<bool> {
    anyhow::bail!("TUI mode not available, rebuild with: cargo build --features tui")
}
