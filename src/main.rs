use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use dirsync::cli::Cli;
use dirsync::errors::RootError;
use dirsync::output::{self, Verbosity};
use dirsync::{SyncContext, logging, sync};
use std::io;
use std::process;

/// Exit status for a run that finished with per-file issues
const EXIT_ISSUES: i32 = 1;

/// Exit status when the roots were not given
const EXIT_USAGE: i32 = 2;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            if let Some(root) = e.downcast_ref::<RootError>() {
                output::error(&format!("{}: {root}", root.error_type()));
            } else {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
            process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        print_completions(shell, &mut Cli::command());
        return Ok(0);
    }

    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    output::set_verbosity(verbosity);
    logging::init(verbosity)?;

    let Some((dir_a, dir_b)) = cli.roots() else {
        eprintln!("{}", Cli::command().render_usage());
        return Ok(EXIT_USAGE);
    };

    let ctx = SyncContext::load(cli.config.as_deref())?.with_overrides(
        cli.dry_run,
        cli.follow_symlinks,
        &cli.ignore,
    )?;

    let report = sync::synchronize(&ctx, dir_a, dir_b)?;

    for issue in &report.issues {
        output::warning(&format!("warning: {issue}"));
    }

    let summary = if ctx.dry_run() {
        format!("Dry run: {}", report.summary())
    } else {
        report.summary()
    };

    if report.has_issues() {
        output::warning(&summary);
        Ok(EXIT_ISSUES)
    } else {
        output::success(&summary);
        Ok(0)
    }
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
