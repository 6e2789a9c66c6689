// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use escola_testkit::SchoolFaker;
use escola_tui::UiSettings;
use runtime::SchoolRuntime;
use std::env;
use std::path::PathBuf;

const DEMO_SEED: u64 = 20_260_115;
const DEMO_STUDENTS: usize = 240;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `escola --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let settings = UiSettings {
        list: config.list_settings()?,
        start: config.start_tab(),
    };

    let mut runtime = if options.demo {
        SchoolRuntime::demo(SchoolFaker::new(DEMO_SEED).school(DEMO_STUDENTS))
    } else {
        let client = escola_api::Client::new(
            config.api_base_url(),
            config.api_timeout()?,
            config.session(),
        )
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;
        SchoolRuntime::api(&client)
    };

    let log_file = config.log_file()?;
    if options.check_only {
        return Ok(());
    }

    logging::init(&log_file, config.log_json())?;
    tracing::info!(
        demo = options.demo,
        start = settings.start.path(),
        per_page = settings.list.items_per_page,
        "starting escola"
    );
    escola_tui::run_app(&mut runtime, &settings)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("escola: school back-office lists");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Browse seeded in-memory data (no network)");
    println!("  --check                  Validate config and API settings, then exit");
    println!("  --help                   Show this help");
}
