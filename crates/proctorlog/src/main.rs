//! `proctord` - CLI for proctorlog
//!
//! This binary runs the proctoring HTTP service and offers offline views of
//! the configured record store.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use proctorlog::cli::{Cli, Command, ConfigCommand, RiskCommand, ServeCommand};
use proctorlog::{init_logging, storage, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    // validate must report on the file it names, even when the default is broken
    if let Command::Config(ConfigCommand::Validate { file }) = cli.command {
        return handle_validate(file.or(cli.config));
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, &serve_cmd),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Risk(risk_cmd) => handle_risk(&config, &risk_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_serve(mut config: Config, cmd: &ServeCommand) -> anyhow::Result<()> {
    cmd.apply(&mut config);
    config.validate()?;
    let addr = config.bind_addr()?;
    let store = storage::open(&config).context("opening record store")?;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(proctorlog::http::serve(addr, store))
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = storage::open(config).context("opening record store")?;
    let stats = store.stats()?;

    if json {
        let status = serde_json::json!({
            "backend": config.storage.backend.to_string(),
            "location": store.location(),
            "total_students": stats.total_students,
            "total_events": stats.total_events,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("proctord status");
        println!("---------------");
        println!("Backend:       {}", config.storage.backend);
        println!("Location:      {}", store.location());
        println!("Students:      {}", stats.total_students);
        println!("Events:        {}", stats.total_events);
    }
    Ok(())
}

fn handle_risk(config: &Config, cmd: &RiskCommand) -> anyhow::Result<()> {
    let store = storage::open(config).context("opening record store")?;
    let score = store.risk_score(&cmd.email)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&score)?);
    } else {
        println!(
            "{}: {} event(s), risk {}",
            score.email, score.risk_score, score.risk_level
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}:{}", config.server.host, config.server.port);
                println!();
                println!("[Storage]");
                println!("  Backend:            {}", config.storage.backend);
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Students file:      {}", config.students_path().display());
                println!("  Logs file:          {}", config.logs_path().display());
                println!("  Database file:      {}", config.database_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => handle_validate(file)?,
    }
    Ok(())
}

fn handle_validate(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    Config::check_file(&path)
        .with_context(|| format!("configuration {} is invalid", path.display()))?;
    println!("{}: ok", path.display());
    Ok(())
}
