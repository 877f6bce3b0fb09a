//! `insight` command-line entry point

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use insight_core::QueryResult;
use insight_data::{CleaningPolicy, StoreSettings};
use insight_views::{export_to_path, ChartKind, ChartSpec, TableConfig, TableView};

use insight_app::{CommandAssistant, Session};

mod args;

use args::{Cli, Command, OutputArgs};

const DEFAULT_DATA_DIR: &str = ".insight";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let mut session = Session::open(settings)?;

    match cli.command {
        Command::Import { files, table, clean, fill } => {
            if table.is_some() && files.len() > 1 {
                bail!("--table can only be used with a single file");
            }
            let policy = clean
                .map(|option| CleaningPolicy::from_option(&option, fill.as_deref()))
                .transpose()?;

            for file in files {
                let descriptor = session
                    .import_file(file, table.clone(), policy.clone())
                    .await?;
                println!(
                    "{}: {} rows, columns [{}] (from {})",
                    descriptor.name,
                    descriptor.row_count,
                    descriptor.columns.join(", "),
                    descriptor.source_file_name
                );
            }
        }
        Command::Query { sql, output } => {
            let result = session.run_sql(&sql)?;
            present(&result, &output)?;
        }
        Command::Ask { question, assistant, output } => {
            let assistant = CommandAssistant::from_command_line(&assistant)?;
            session = session.with_assistant(Arc::new(assistant));
            let result = session.ask(&question).await?;
            println!("SQL: {}", result.source_sql);
            present(&result, &output)?;
        }
        Command::Tables => {
            let tables = session.store().list()?;
            if tables.is_empty() {
                println!("No tables loaded.");
            }
            for table in tables {
                println!(
                    "{}\t{} rows\t{} columns\t{}",
                    table.name,
                    table.row_count,
                    table.columns.len(),
                    table.source_file_name
                );
            }
        }
        Command::Schema => {
            print!("{}", session.store().schema_summary()?);
            println!();
        }
        Command::Drop { table } => {
            if session.store().drop_table(&table)? {
                println!("Dropped {}", table);
            } else {
                println!("No table named {}", table);
            }
        }
        Command::History { clear } => {
            if clear {
                session.clear_history()?;
                println!("History cleared.");
            }
            for entry in session.history().newest_first() {
                match &entry.natural_language_query {
                    Some(question) => println!(
                        "{}  {}\n    {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        question,
                        entry.sql
                    ),
                    None => println!("{}  {}", entry.timestamp.format("%Y-%m-%d %H:%M:%S"), entry.sql),
                }
            }
        }
    }

    Ok(())
}

/// Settings from `--config`, with the data directory flags layered on top
fn resolve_settings(cli: &Cli) -> Result<StoreSettings> {
    let mut settings = match &cli.config {
        Some(path) => StoreSettings::load(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => StoreSettings::in_directory(&PathBuf::from(DEFAULT_DATA_DIR)),
    };

    if let Some(dir) = &cli.data_dir {
        let located = StoreSettings::in_directory(dir);
        settings.database_path = located.database_path;
        settings.history_path = located.history_path;
    }
    if cli.memory {
        settings.database_path = None;
        settings.history_path = None;
    }

    info!(
        "Using database {}",
        settings
            .database_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string())
    );
    Ok(settings)
}

/// Print a result with its chart suggestion and annotations, then export it if asked
fn present(result: &QueryResult, output: &OutputArgs) -> Result<()> {
    let view = TableView::new(TableConfig {
        max_rows_displayed: output.max_rows,
    });
    println!("{}", view.render(result)?);

    let spec = ChartSpec::with_kind(result, output.chart.resolve(result));
    if spec.kind != ChartKind::None {
        println!(
            "Chart: {} (x: {}, y: {})",
            spec.kind,
            spec.x_name(result).unwrap_or("-"),
            spec.y_names(result).join(", ")
        );
    }

    if let Some(explanation) = &result.explanation {
        println!("\n{}", explanation);
    }
    if let Some(insights) = &result.insights {
        println!(
            "\nPrediction ({:.0}% confidence): {}\nReasoning: {}",
            insights.confidence * 100.0,
            insights.prediction,
            insights.reasoning
        );
        if let Some(what_if) = &insights.what_if {
            println!("What if: {}", what_if);
        }
    }

    if let Some(path) = &output.export {
        export_to_path(result, path)
            .with_context(|| format!("failed to export to {}", path.display()))?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}
