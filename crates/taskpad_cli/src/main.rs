use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::warn;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;
use taskpad_cli::cli::{Cli, collect_config_overrides};
use taskpad_cli::session::Session;
use taskpad_core::config::{Config, load_config_with_fallback, merge_overrides};
use taskpad_core::error::AppError;
use taskpad_core::logging::init_logging;
use taskpad_core::model::Task;
use taskpad_core::storage::{FileStorage, KeyValueStorage, storage_dir};
use taskpad_core::store::{StoreOptions, TaskStore};

const PROGRAM_NAME: &str = "taskpad";

enum Parsed {
    Run(Cli),
    Printed,
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn parse_args(args: Vec<String>) -> Result<Parsed, AppError> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(PROGRAM_NAME.to_string());
    argv.extend(args);

    match Cli::try_parse_from(argv) {
        Ok(cli) => Ok(Parsed::Run(cli)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            Ok(Parsed::Printed)
        }
        Err(err) => Err(normalize_parse_error(err)),
    }
}

fn expand_alias(config: &Config, args: Vec<String>) -> Vec<String> {
    let Some(first) = args.first() else {
        return args;
    };
    match config.expand_alias(first) {
        Some(mut expanded) => {
            expanded.extend(args.into_iter().skip(1));
            expanded
        }
        None => args,
    }
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn report_autosave(task: Option<Task>) {
    if let Some(task) = task {
        println!("Auto-saved task: {} ({})", task.title, task.id);
    }
}

fn open_session(config: &Config) -> Result<Session<FileStorage>, AppError> {
    let dir = storage_dir(config.storage_dir.as_deref())?;
    let store = TaskStore::with_options(
        FileStorage::new(dir),
        StoreOptions {
            default_assignee: config.default_assignee().to_string(),
        },
    );
    Ok(Session::new(store, config))
}

fn start_logging(config: &Config) {
    if let Err(err) = init_logging(config.log_level(), config.log_dir.as_deref()) {
        eprintln!("WARN: logging disabled: {err}");
    }
}

/// Reads stdin on its own thread so the session can wake up for a due
/// autosave while no input arrives.
fn spawn_line_reader() -> Receiver<io::Result<String>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

enum Input {
    Line(String),
    SaveDue,
    Closed,
}

/// Waits for the next line, or until the editor's pending save falls due.
fn next_input<S: KeyValueStorage>(
    session: &Session<S>,
    lines: &Receiver<io::Result<String>>,
) -> Result<Input, AppError> {
    let received = match session.editor().save_due_at() {
        Some(due) => match lines.recv_timeout(due.saturating_duration_since(Instant::now())) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => return Ok(Input::SaveDue),
            Err(RecvTimeoutError::Disconnected) => return Ok(Input::Closed),
        },
        None => match lines.recv() {
            Ok(line) => line,
            Err(_) => return Ok(Input::Closed),
        },
    };
    received
        .map(Input::Line)
        .map_err(|err| AppError::io(err.to_string()))
}

fn run_interactive(config: &Config) -> Result<(), AppError> {
    let mut session = open_session(config)?;
    let lines = spawn_line_reader();

    loop {
        let input = match next_input(&session, &lines)? {
            Input::Line(input) => input,
            Input::SaveDue => {
                report_autosave(session.tick(Instant::now()));
                continue;
            }
            Input::Closed => break,
        };

        report_autosave(session.tick(Instant::now()));

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => expand_alias(config, args),
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let cli = match parse_args(args) {
            Ok(Parsed::Run(cli)) => cli,
            Ok(Parsed::Printed) => continue,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if let Err(err) = session.run(cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    if let Some(task) = session.finish() {
        println!("Saved task: {} ({})", task.title, task.id);
    }
    Ok(())
}

fn run_once(loaded: &Config, args: Vec<String>) -> Result<(), AppError> {
    let cli = match parse_args(expand_alias(loaded, args))? {
        Parsed::Run(cli) => cli,
        Parsed::Printed => return Ok(()),
    };

    let overrides =
        collect_config_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    let config = merge_overrides(loaded, &overrides);
    start_logging(&config);

    open_session(&config)?.run(cli)
}

fn main() {
    let load = load_config_with_fallback();
    let loaded = load.config;

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let result = if args.is_empty() {
        start_logging(&loaded);
        if let Some(err) = load.error.as_ref() {
            warn!(
                "event=config_load module=cli status=fallback code={} error={}",
                err.code(),
                err.message()
            );
        }
        run_interactive(&loaded)
    } else {
        if let Some(err) = load.error.as_ref() {
            eprintln!("WARN: using default config: {err}");
        }
        run_once(&loaded, args)
    };

    if let Err(err) = result {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
