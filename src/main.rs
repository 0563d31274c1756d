mod cli;
mod shell;

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};
use shoebox_catalog::{Database, Repository};
use shoebox_config::{Config, Overrides};
use shoebox_library::{Commands, Context};
use shoebox_metadata::FileExtractor;
use shoebox_storage::fs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

/// Renders an error tree for the terminal.
fn fatal<E>(err: exn::Exn<E>) -> miette::Report
where
    E: std::error::Error + Send + Sync + 'static,
{
    miette::miette!("{err:?}")
}

/// Logs go to stderr so that command output on stdout stays clean. `RUST_LOG`
/// wins over the configured level.
fn init_logging(config: &Config) -> miette::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log.level)
            .into_diagnostic()
            .wrap_err_with(|| format!("Invalid log level '{}'", config.log.level))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    Ok(())
}

/// Creates the archive if needed and opens its catalog.
async fn open(config: &Config) -> miette::Result<(Database, Context)> {
    let archive = config.archive().map_err(fatal)?;
    fs::create_dir_all(archive).await.map_err(fatal)?;
    let archive = fs::canonicalize(archive).await.map_err(fatal)?;
    let catalog_path = archive.join(&config.catalog_file);
    tracing::debug!(archive = %archive.display(), catalog = %catalog_path.display(), "Opening archive");
    let db = Database::connect(&catalog_path).await.map_err(fatal)?;
    let context = Context {
        archive,
        catalog: Repository::from(&db),
        extractor: Arc::new(FileExtractor),
        extensions: config.extension_set(),
        progress_every: config.progress_every,
    };
    Ok((db, context))
}

async fn lookup_stdin(commands: &Commands) -> miette::Result<()> {
    use tokio::io::AsyncBufReadExt;
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.into_diagnostic()? {
        let line = line.trim();
        if !line.is_empty() {
            println!("{}", commands.lookup(line).await);
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let overrides = Overrides {
        config_file: cli.config.clone(),
        archive: cli.archive.clone(),
        log_level: cli.log_level(),
    };
    let config = Config::load(&overrides).map_err(fatal)?;
    init_logging(&config)?;

    let (db, context) = open(&config).await?;
    let mut commands = Commands::new(context);
    match cli.command {
        Command::Collect { overwrite, roots } => println!("{}", commands.collect(overwrite, roots).await),
        Command::Size => println!("{}", commands.size().await),
        Command::Lookup { final_paths } if final_paths.is_empty() => lookup_stdin(&commands).await?,
        Command::Lookup { final_paths } => {
            for final_path in final_paths {
                println!("{}", commands.lookup(&final_path).await);
            }
        },
        Command::Dump => println!("{}", commands.dump().await),
        Command::Shell => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::run(&mut commands, stdin, std::io::stdout()).await.into_diagnostic()?;
        },
    }
    db.close().await;
    Ok(())
}
