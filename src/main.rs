use anyhow::{Context, Result};
use ariadne::bolt::BoltSink;
use ariadne::csv::CsvImporter;
use ariadne::sink::DryRunSink;
use ariadne::sqlite::SqliteImporter;
use ariadne::stats::ImportStats;
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ariadne")]
#[command(about = "Bulk-load nodes and typed relationships into a graph store")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import nodes and relationships from delimited text files
    ImportCsv(ImportCsvArgs),
    /// Import nodes and relationships from a SQLite database
    ImportSql(ImportSqlArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// Bolt URI of the target store
    #[arg(long, default_value = ariadne::config::DEFAULT_BOLT_URI)]
    bolt_uri: String,

    /// Bolt user name (empty disables authentication)
    #[arg(long, default_value = "")]
    user: String,

    /// Bolt password
    #[arg(long, default_value = "")]
    password: String,

    /// Count entities without writing to a store
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct ImportCsvArgs {
    /// Node file (.csv or .csv.bz2)
    #[arg(short, long)]
    nodes: PathBuf,

    /// Relationship file (.csv or .csv.bz2)
    #[arg(short, long)]
    rels: PathBuf,

    #[command(flatten)]
    target: TargetArgs,
}

#[derive(Args)]
struct ImportSqlArgs {
    /// SQLite database file
    #[arg(short, long)]
    database: PathBuf,

    /// Table holding node rows
    #[arg(long, default_value = "nodes")]
    nodes_table: String,

    /// Table holding relationship rows
    #[arg(long, default_value = "rels")]
    rels_table: String,

    /// Node identifier column
    #[arg(long, default_value = ariadne::config::NODE_ID_COLUMN)]
    node_id_column: String,

    /// Relationship source column
    #[arg(long, default_value = ariadne::config::REL_SOURCE_COLUMN)]
    rel_source_column: String,

    /// Relationship target column
    #[arg(long, default_value = ariadne::config::REL_TARGET_COLUMN)]
    rel_target_column: String,

    /// Relationship type column
    #[arg(long, default_value = ariadne::config::REL_TYPE_COLUMN)]
    rel_type_column: String,

    /// Only these node columns become properties (comma-separated)
    #[arg(long, value_delimiter = ',')]
    node_properties: Option<Vec<String>>,

    /// Only these relationship columns become properties (comma-separated)
    #[arg(long, value_delimiter = ',')]
    rel_properties: Option<Vec<String>>,

    #[command(flatten)]
    target: TargetArgs,
}

fn run_import_csv(args: ImportCsvArgs) -> Result<()> {
    let importer = CsvImporter::new(&args.nodes, &args.rels);
    let start = Instant::now();

    let stats = if args.target.dry_run {
        info!("Dry run: no store will be written");
        let mut sink = DryRunSink::default();
        importer.import_to(&mut sink)?
    } else {
        let mut sink = BoltSink::connect(
            &args.target.bolt_uri,
            &args.target.user,
            &args.target.password,
        )?;
        importer.import_to(&mut sink)?
    };

    finish_run(&stats, start, &args.target)
}

fn run_import_sql(args: ImportSqlArgs) -> Result<()> {
    let conn = Connection::open(&args.database)
        .with_context(|| format!("Failed to open database: {}", args.database.display()))?;

    let mut importer = SqliteImporter::new(args.nodes_table.as_str(), args.rels_table.as_str())
        .with_node_id_column(args.node_id_column.as_str())
        .with_rel_columns(
            args.rel_source_column.as_str(),
            args.rel_target_column.as_str(),
            args.rel_type_column.as_str(),
        );
    if let Some(columns) = args.node_properties.clone() {
        importer = importer.with_node_properties(columns);
    }
    if let Some(columns) = args.rel_properties.clone() {
        importer = importer.with_rel_properties(columns);
    }

    let start = Instant::now();
    let stats = if args.target.dry_run {
        info!("Dry run: no store will be written");
        let mut sink = DryRunSink::default();
        importer.import_to(&conn, &mut sink)?
    } else {
        let mut sink = BoltSink::connect(
            &args.target.bolt_uri,
            &args.target.user,
            &args.target.password,
        )?;
        importer.import_to(&conn, &mut sink)?
    };

    finish_run(&stats, start, &args.target)
}

fn finish_run(stats: &ImportStats, start: Instant, target: &TargetArgs) -> Result<()> {
    if let Some(path) = &target.report {
        stats.write_report(path)?;
        info!(path = %path.display(), "Wrote import report");
    }

    let elapsed = start.elapsed();
    println!();
    println!("=== Summary ===");
    println!("Total time:         {:.2}s", elapsed.as_secs_f64());
    println!("Nodes created:      {}", stats.nodes_created);
    println!("Relationships:      {}", stats.relationships_created);
    println!("Properties set:     {}", stats.properties_set);
    println!("Index entries:      {}", stats.index_entries);

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::ImportCsv(args) => run_import_csv(args),
        Commands::ImportSql(args) => run_import_sql(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
