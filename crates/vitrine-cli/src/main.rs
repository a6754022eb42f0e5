// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use runtime::HttpRuntime;
use std::env;
use std::path::PathBuf;
use vitrine_app::AppState;
use vitrine_client::Client;
use vitrine_tui::AppRuntime;

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
            "load config {}; run `vitrine --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    let log_path = logging::init(&config)?;

    let base_url = config.base_url();
    tracing::info!(
        config = %options.config_path.display(),
        log = %log_path.display(),
        base_url = %base_url,
        "vitrine starting"
    );

    let client = Client::new(
        &base_url,
        config.admin_path(),
        config.csrf_cookie(),
        config.timeout()?,
    )
    .with_context(|| {
        format!(
            "invalid [server] config in {}; fix base_url/admin_path/timeout values or VITRINE_BASE_URL",
            options.config_path.display()
        )
    })?;
    let mut runtime = HttpRuntime::new(client);

    if options.check_only {
        let profiles = runtime.load_profiles()?;
        println!("{base_url}: {} profiles", profiles.len());
        return Ok(());
    }

    let mut state = AppState::default();
    vitrine_tui::run_app(&mut state, &mut runtime, options.profile.as_deref())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    profile: Option<String>,
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
        print_example: false,
        check_only: false,
        profile: None,
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
            "--profile" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--profile requires an identifiant"))?;
                options.profile = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
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
    println!("vitrine - profile and resume admin");
    println!("  --config <path>          Use a specific config path");
    println!("  --profile <identifiant>  Select a profile on start");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config, reach the admin page and exit");
    println!("  --help                   Show this help");
}
