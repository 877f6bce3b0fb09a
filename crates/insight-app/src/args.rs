use clap::{Parser, Subcommand};
use std::path::PathBuf;

use insight_views::ChartChoice;

/// Insight - load spreadsheets into SQLite and query them
#[derive(Parser, Debug)]
#[command(name = "insight")]
#[command(author = "Insight SQL Team")]
#[command(version)]
#[command(about = "Import tabular files into SQLite and query them by SQL or natural language", long_about = None)]
pub struct Cli {
    /// Directory holding the database and history (default: ./.insight)
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Keep everything in memory for this run
    #[arg(long = "memory", global = true, conflicts_with = "data_dir")]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import CSV, TSV or spreadsheet files as tables
    Import {
        /// Files to import
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Table name (single file only; default: next free table_N)
        #[arg(short = 't', long = "table")]
        table: Option<String>,

        /// Null handling: none, zero, drop or custom
        #[arg(long = "clean")]
        clean: Option<String>,

        /// Fill value for --clean custom
        #[arg(long = "fill")]
        fill: Option<String>,
    },

    /// Run a SQL statement
    Query {
        sql: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Ask a question in plain language; the assistant writes the SQL
    Ask {
        question: String,

        /// Assistant command line; it reads the prompt on stdin and prints JSON
        #[arg(short = 'a', long = "assistant")]
        assistant: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List loaded tables
    Tables,

    /// Print the schema summary handed to the assistant
    Schema,

    /// Remove a table
    Drop { table: String },

    /// Show recent queries, newest first
    History {
        /// Forget all entries
        #[arg(long = "clear")]
        clear: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct OutputArgs {
    /// Chart kind: auto, bar, line, pie, area, scatter or none
    #[arg(long = "chart", default_value = "auto")]
    pub chart: ChartChoice,

    /// Also write the result to this CSV file
    #[arg(short = 'o', long = "export")]
    pub export: Option<PathBuf>,

    /// Maximum rows printed
    #[arg(long = "max-rows", default_value = "100")]
    pub max_rows: usize,
}
