//! Termsync - Custom Terminology and Bulk Translation Workflow
//!
//! Command line entry point: loads the configuration, wires storage and the
//! translation service, and runs one command.

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use termsync::cancel::CancelFlag;
use termsync::cli::{parse_languages, Args, Commands, ConfigAction, DictAction};
use termsync::config::Config;
use termsync::dictionary::Upsert;
use termsync::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "termsync.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting Termsync - Custom Terminology and Bulk Translation Workflow");

    // Writing a fresh config must not depend on an existing one
    if let Commands::Config { action: ConfigAction::Init { path } } = &args.command {
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        Config::default().save_to_file(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                warn!("No configuration file found, using defaults");
                Config::default()
            }
        }
    };

    // Ctrl-C stops long loops between items
    let cancel = CancelFlag::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current item");
            watcher.cancel();
        }
    });

    let workflow = Workflow::new(config, cancel.clone())?;

    match args.command {
        Commands::Translate { text, target } => {
            let translated = workflow.translate_text(&text, target.as_deref()).await?;
            println!("{}", translated);
        }
        Commands::Bulk { input, output, target_langs } => {
            let languages = parse_languages(&target_langs);
            info!("Bulk translating {} into {:?}", input, languages);

            let handle = workflow.translate_bulk(&input, &output, &languages).await?;
            println!("{}", handle);
        }
        Commands::JobStatus { job_id } => {
            let status = workflow.job_status(&job_id).await?;

            println!("Job:        {}", status.job_id);
            if let Some(name) = &status.job_name {
                println!("Name:       {}", name);
            }
            println!("Status:     {}", status.status);
            if let Some(translated) = status.translated_documents {
                println!("Translated: {}", translated);
            }
            if let Some(failed) = status.failed_documents {
                println!("Failed:     {}", failed);
            }
            if let Some(message) = &status.message {
                println!("Message:    {}", message);
            }
        }
        Commands::Dict { action } => match action {
            DictAction::List { language } => {
                let dictionary = workflow.load_dictionary().await?;
                let entries: Vec<_> = match &language {
                    Some(language) => dictionary.entries_for(language).collect(),
                    None => dictionary.entries().iter().collect(),
                };

                if entries.is_empty() {
                    println!("No dictionary entries found.");
                } else {
                    println!("{:<30} {:<10} {:<30}", "Source", "Language", "Translation");
                    println!("{}", "-".repeat(72));
                    for entry in entries {
                        let translation = if entry.needs_translation() { "(missing)" } else { entry.translation.as_str() };
                        println!("{:<30} {:<10} {:<30}", entry.source, entry.language, translation);
                    }
                }
            }
            DictAction::Add { source, language, translation } => {
                let mut dictionary = workflow.load_dictionary().await?;
                let outcome = dictionary.add_or_update(&source, &language, &translation)?;
                dictionary.save().await?;

                match outcome {
                    Upsert::Added => println!("Added '{}' ({})", source, language),
                    Upsert::Updated => println!("Updated '{}' ({})", source, language),
                }
            }
            DictAction::Delete { source, language } => {
                let mut dictionary = workflow.load_dictionary().await?;
                if dictionary.delete(&source, &language) {
                    dictionary.save().await?;
                    println!("Deleted '{}' ({})", source, language);
                } else {
                    println!("No entry for '{}' ({})", source, language);
                }
            }
            DictAction::AutoFill => {
                let mut dictionary = workflow.load_dictionary().await?;
                let report = dictionary
                    .auto_translate_missing(&workflow.translator(), &cancel)
                    .await?;
                dictionary.save().await?;

                println!("Translated {} entries", report.translated);
                for failure in &report.failures {
                    println!("  failed: '{}' ({}): {}", failure.source, failure.language, failure.error);
                }
            }
            DictAction::Export { target } => {
                let export = workflow.export_terminology(&target).await?;
                println!("Exported {} terms to {}", export.rows, export.location);
            }
            DictAction::Import { target, csv_key } => {
                let summary = workflow.import_terminology(&target, csv_key.as_deref()).await?;
                println!("Imported terminology '{}'", summary.name);
            }
            DictAction::Sync { target } => {
                let result = workflow.sync_terminology(&target).await?;
                println!(
                    "Exported {} terms to {} and imported terminology '{}'",
                    result.export.rows, result.export.location, result.terminology.name
                );
            }
        },
        Commands::Objects { prefix } => {
            let objects = workflow.list_objects(&prefix).await?;

            if objects.is_empty() {
                println!("No objects found.");
            } else {
                println!("{:<60} {:>12} {:<25}", "Key", "Size", "Last Modified");
                println!("{}", "-".repeat(99));
                for object in objects {
                    println!(
                        "{:<60} {:>12} {:<25}",
                        object.key,
                        object.size,
                        object.last_modified.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Commands::Config { .. } => {} // handled above
    }

    info!("Termsync completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let termsync_dir = std::env::current_dir()?.join(".termsync");
    let log_dir = termsync_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "termsync.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("termsync.log").display());

    Ok(())
}
