//! indexlens CLI - Find missing indexes in SQL statements
//!
//! Usage:
//!   indexlens normalize [<file.sql>]
//!   indexlens classify [<file.sql>]
//!   indexlens parse [<file.sql>] [--json]
//!   indexlens advise [<file.sql>] [--metadata <dictionary.json>] [--json]
//!
//! The statement is read from stdin when no file is given.
//!
//! Examples:
//!   indexlens parse query.sql
//!   indexlens advise query.sql --metadata dictionary.json
//!   RUST_LOG=indexlens=debug indexlens advise query.sql

use clap::{Parser, Subcommand};
use indexlens::advisor::{advise, AdviseOptions, IndexAdvice};
use indexlens::config::Settings;
use indexlens::metadata::StaticMetadata;
use indexlens::sql::{self, ColumnId, ParsedSql};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "indexlens")]
#[command(about = "indexlens - Static missing-index analysis for SQL statements")]
#[command(version)]
struct Cli {
    /// Config file (defaults to INDEXLENS_CONFIG, ./indexlens.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized statement
    Normalize {
        /// SQL file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Print the statement kind and whether it can be analyzed
    Classify {
        /// SQL file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Print the tables, columns and joins of a statement
    Parse {
        /// SQL file (stdin if omitted)
        file: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Analyze a statement against index metadata and suggest indexes
    Advise {
        /// SQL file (stdin if omitted)
        file: Option<PathBuf>,

        /// JSON metadata file (overrides metadata.file from the config)
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Normalize { file } => cmd_normalize(file.as_deref()),
        Commands::Classify { file } => cmd_classify(file.as_deref()),
        Commands::Parse { file, json } => cmd_parse(file.as_deref(), json),
        Commands::Advise {
            file,
            metadata,
            json,
        } => cmd_advise(file.as_deref(), metadata, json, &settings),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "indexlens=debug" } else { "indexlens=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_sql(file: Option<&Path>) -> Option<String> {
    let result = match file {
        Some(path) => fs::read_to_string(path).map_err(|e| (path.display().to_string(), e)),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map(|_| buf)
                .map_err(|e| ("<stdin>".to_string(), e))
        }
    };

    match result {
        Ok(sql) => Some(sql),
        Err((source, e)) => {
            eprintln!("Error reading '{}': {}", source, e);
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_normalize(file: Option<&Path>) -> ExitCode {
    let Some(source) = read_sql(file) else {
        return ExitCode::FAILURE;
    };
    println!("{}", sql::normalize(&source));
    ExitCode::SUCCESS
}

fn cmd_classify(file: Option<&Path>) -> ExitCode {
    let Some(source) = read_sql(file) else {
        return ExitCode::FAILURE;
    };
    let kind = sql::classify(&source);
    println!("{} (supported: {})", kind, kind.is_supported());
    ExitCode::SUCCESS
}

fn cmd_parse(file: Option<&Path>, json: bool) -> ExitCode {
    let Some(source) = read_sql(file) else {
        return ExitCode::FAILURE;
    };

    let parsed = match sql::parse(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        return print_json(&parsed);
    }
    println!("Statement: {}", sql::classify(&source));
    println!();
    print_parsed(&parsed);
    ExitCode::SUCCESS
}

fn cmd_advise(
    file: Option<&Path>,
    metadata: Option<PathBuf>,
    json: bool,
    settings: &Settings,
) -> ExitCode {
    let Some(source) = read_sql(file) else {
        return ExitCode::FAILURE;
    };

    let options = match AdviseOptions::from_settings(settings) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let metadata_file = match metadata {
        Some(path) => Some(path),
        None => match settings.metadata.resolved_file() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    let port = match metadata_file {
        Some(path) => match StaticMetadata::from_file(&path) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Metadata error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => StaticMetadata::new(),
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(advise(&source, &port, &options)) {
        Ok(advice) if json => print_json(&advice),
        Ok(advice) => {
            print_advice(&advice);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Analysis error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_parsed(parsed: &ParsedSql) {
    println!("Tables:");
    for table in &parsed.tables {
        let alias = if table.alias != table.name {
            format!(" {}", table.alias)
        } else {
            String::new()
        };
        let outer = if table.is_outer_join_target { " (outer)" } else { "" };
        println!("  {} {}{}{}", table.id, table.qualified_name(), alias, outer);
    }
    println!();

    if !parsed.joins.is_empty() {
        println!("Joins:");
        let column_ref = |id: ColumnId| {
            parsed
                .column(id)
                .map(|c| format!("{}.{}", c.table_name, c.name))
                .unwrap_or_else(|| id.to_string())
        };
        for join in &parsed.joins {
            println!(
                "  {} {} = {} ({})",
                join.id,
                column_ref(join.source_column_id),
                column_ref(join.target_column_id),
                join.join_type
            );
        }
        println!();
    }

    if !parsed.columns.is_empty() {
        println!("Columns:");
        for column in &parsed.columns {
            let bind = if column.condition.is_bind_variable { " bind" } else { "" };
            println!(
                "  {} {}.{} {} {}{}",
                column.id,
                column.table_name,
                column.name,
                column.condition.condition_type,
                column.condition.operator.as_str(),
                bind
            );
        }
    }
}

fn print_advice(advice: &IndexAdvice) {
    println!("Access order: {}", advice.access_order.order.join(" -> "));
    println!();

    println!("Index points:");
    for point in &advice.index_points {
        let existing = point
            .existing_index
            .as_deref()
            .map(|i| format!(" [{}]", i))
            .unwrap_or_default();
        println!(
            "  {:>2}. {:<8} {}.{} {}{}",
            point.point_number,
            point.priority,
            point.table_name,
            point.column_name,
            point.point_type,
            existing
        );
    }
    println!();

    if advice.suggestions.is_empty() {
        println!("No missing indexes.");
        return;
    }

    println!("Suggested indexes:");
    for suggestion in &advice.suggestions {
        println!(
            "  -- {} {} (score {:.0})",
            suggestion.priority, suggestion.point_type, suggestion.score
        );
        println!("  {};", suggestion.ddl);
    }
}
