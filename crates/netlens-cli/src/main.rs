// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use netlens_app::{NavigationCoordinator, NavigationSettings, SelectionState, Visibility};
use netlens_testkit::{DEMO_SEED, DemoBackend};
use runtime::{DemoRuntime, HttpRuntime};
use std::env;
use std::path::PathBuf;

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
            "load config {}; run `netlens --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let log_path = config.log_path()?;
    logging::init(&log_path, config.log_level())?;

    let settings = NavigationSettings {
        stale_policy: config.stale_policy(),
        profile_browser: if config.show_profile_browser() {
            Visibility::Visible
        } else {
            Visibility::Hidden
        },
    };
    let mut nav = NavigationCoordinator::new(SelectionState::new(config.default_view()), settings);

    if options.demo {
        tracing::info!(seed = DEMO_SEED, "starting with demo backend");
        if options.check_only {
            return Ok(());
        }
        let mut runtime = DemoRuntime::new(DemoBackend::seeded(DEMO_SEED));
        return netlens_tui::run_app(&mut nav, &mut runtime);
    }

    let client = netlens_remote::Client::new(config.base_url(), config.timeout()?)
        .with_context(|| {
            format!(
                "invalid [backend] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;
    if options.check_only {
        let profiles = client.ping()?;
        println!("{} reachable: {profiles} profiles", client.base_url());
        return Ok(());
    }

    tracing::info!(base_url = client.base_url(), "starting");
    let mut runtime = HttpRuntime::new(client);
    netlens_tui::run_app(&mut nav, &mut runtime)
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
    println!("netlens: terminal dashboard for network traffic analysis");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Browse seeded demo traffic instead of a live backend");
    println!("  --check                  Validate config and backend reachability, then exit");
    println!("  --help                   Show this help");
}
