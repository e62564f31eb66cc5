mod cli;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use cli::Cli;
use libmemscan::{OpenError, Process};
use owo_colors::OwoColorize;

fn main() -> ExitCode {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(64); // EX_USAGE
        }
    };

    if !cli.print && cli.attach.is_none() {
        let _ = Cli::command().write_help(&mut std::io::stderr());
        eprintln!();
        return ExitCode::from(64);
    }

    if cli.print {
        print_resolved_config(&cli);
        return ExitCode::SUCCESS;
    }

    let target = cli.attach.as_deref().expect("attach required when --print is absent");
    match attach(target) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

/// Reads `LOG_LEVEL` (this crate's documented variable) falling back to the
/// conventional `RUST_LOG`, matching `env_logger`'s own precedent of reading
/// whichever filter variable is set.
fn init_logging() {
    let mut builder = env_logger::Builder::new();
    let filter = std::env::var("LOG_LEVEL").or_else(|_| std::env::var("RUST_LOG"));
    match filter {
        Ok(filter) => builder.parse_filters(&filter),
        Err(_) => builder.filter_level(log::LevelFilter::Info),
    };
    let _ = builder.try_init();
}

fn print_resolved_config(cli: &Cli) {
    println!("{} memscan configuration", "[config]".bright_cyan());
    match &cli.attach {
        Some(target) => println!("  attach: {target}"),
        None => println!("  attach: <none>"),
    }
}

/// Resolves `target` (a bare PID or a case-insensitive name prefix), opens
/// it, and reports success. Exit codes per the CLI contract: 0 success, 1
/// no matching process, 2 access denied, 3 any other startup failure.
fn attach(target: &str) -> Result<(), ExitCode> {
    let pid = if target.chars().all(|c| c.is_ascii_digit()) {
        target.parse::<u32>().map_err(|_| {
            eprintln!("{} invalid pid: {target}", "[error]".bright_red());
            ExitCode::from(3)
        })?
    } else {
        println!("{} resolving process by name: {target}", "[info]".bright_cyan());
        libmemscan::find_pid_by_name(target).ok_or_else(|| {
            eprintln!("{} no process found matching '{target}'", "[error]".bright_red());
            ExitCode::from(1)
        })?
    };

    match Process::open(pid) {
        Ok(process) => {
            println!("{} attached to pid={} ({})", "[ok]".bright_green(), pid, process.pid());
            Ok(())
        }
        Err(OpenError::NotFound) => {
            eprintln!("{} no such process: {pid}", "[error]".bright_red());
            Err(ExitCode::from(1))
        }
        Err(OpenError::AccessDenied) => {
            eprintln!("{} access denied opening pid {pid}", "[error]".bright_red());
            Err(ExitCode::from(2))
        }
        Err(OpenError::Other(reason)) => {
            eprintln!("{} failed to open pid {pid}: {reason}", "[error]".bright_red());
            Err(ExitCode::from(3))
        }
    }
}
