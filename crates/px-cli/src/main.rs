//! PX production CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use px_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, TranslateCommand};
use crate::commands::{
    run_build, run_classify, run_translate_export, run_translate_import, run_validate,
};
use crate::summary::{
    print_build_summary, print_classify_summary, print_validation_json, print_validation_summary,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Build(args) => report(run_build(&args).map(|summary| {
            print_build_summary(&summary);
            0
        })),
        Command::Validate(args) => report(run_validate(&args).and_then(|outcomes| {
            if args.json {
                print_validation_json(&outcomes)?;
            } else {
                print_validation_summary(&outcomes);
            }
            let blocked = outcomes.iter().any(|outcome| outcome.blocks());
            Ok(if blocked && !args.advisory { 1 } else { 0 })
        })),
        Command::Classify(args) => report(run_classify(&args).map(|artifacts| {
            print_classify_summary(&artifacts);
            0
        })),
        Command::Translate(TranslateCommand::Export(args)) => {
            report(run_translate_export(&args).map(|()| 0))
        }
        Command::Translate(TranslateCommand::Import(args)) => {
            report(run_translate_import(&args).map(|summary| {
                print_build_summary(&summary);
                0
            }))
        }
    };
    std::process::exit(exit_code);
}

fn report(result: anyhow::Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
