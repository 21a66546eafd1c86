use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use csv_adapter::{CsvDecisionLog, CsvFlatTable};
use json_adapter::JsonExportSource;
use review_core::application::{FlattenService, PrepareService, ReviewService};
use review_core::config::{
    ReviewSettings, SourceOrder, WorkspaceLayout, DEFAULT_BASE_NAME, DEFAULT_DATA_DIR,
};
use review_core::review::ReviewReport;
use std::io;
use std::path::PathBuf;
use zip_adapter::ZipExportUnpacker;

/// Review the accounts you follow from an Instagram data export
#[derive(Parser, Debug)]
#[command(name = "follow-review")]
#[command(
    about = "Flattens an Instagram following export and walks you through keep/delete decisions"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding the export copy, the flattened table and the decisions
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Base file name shared by `<base>.json`, `<base>.csv` and `edited_<base>.csv`
    #[arg(long, global = true, default_value = DEFAULT_BASE_NAME)]
    base_name: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract an export ZIP and copy out following.json
    Prepare(PrepareArgs),
    /// Flatten the raw export into the id-assigned table
    Flatten(OrderArgs),
    /// Review the flattened table, resuming where the last run stopped
    Review,
    /// Flatten, then review
    Run(OrderArgs),
}

#[derive(Args, Debug)]
struct PrepareArgs {
    /// Path to the Instagram export ZIP
    zipfile: PathBuf,

    /// Extraction directory (default: <data-dir>/export)
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Destination for the copied following.json (default: <data-dir>/<base>.json)
    #[arg(long)]
    dest: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct OrderArgs {
    /// Order in which the export lists accounts
    #[arg(long, value_enum, default_value_t = OrderArg::NewestFirst)]
    source_order: OrderArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum OrderArg {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl From<OrderArg> for SourceOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::NewestFirst => SourceOrder::NewestFirst,
            OrderArg::OldestFirst => SourceOrder::OldestFirst,
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let layout = WorkspaceLayout::new(cli.data_dir, cli.base_name);

    match cli.command.unwrap_or(Commands::Run(OrderArgs::default())) {
        Commands::Prepare(args) => prepare(&layout, args),
        Commands::Flatten(args) => {
            let table = flatten(&layout, args.source_order.into())?;
            println!("Flattened table: {}", table.display());
            Ok(())
        }
        Commands::Review => {
            let report = review(&layout)?;
            println!("\nDone. Output: {}", report.output.display());
            Ok(())
        }
        Commands::Run(args) => {
            flatten(&layout, args.source_order.into())?;
            let report = review(&layout)?;
            println!("\nDone. Output: {}", report.output.display());
            Ok(())
        }
    }
}

fn prepare(layout: &WorkspaceLayout, args: PrepareArgs) -> Result<()> {
    let outdir = args.outdir.unwrap_or_else(|| layout.export_dir());
    let dest = args.dest.unwrap_or_else(|| layout.raw_path());

    let service = PrepareService::new(Box::new(ZipExportUnpacker::default()));
    let prepared = service
        .execute(&args.zipfile, &outdir, &dest)
        .with_context(|| format!("Failed to prepare export from {}", args.zipfile.display()))?;

    println!("OK: Extracted to: {}", prepared.extracted_to.display());
    println!(
        "OK: Copied: {} -> {}",
        prepared.source.display(),
        prepared.dest.display()
    );
    Ok(())
}

fn flatten(layout: &WorkspaceLayout, order: SourceOrder) -> Result<PathBuf> {
    let service = FlattenService::new(
        Box::new(JsonExportSource::new(layout.raw_path())),
        Box::new(CsvFlatTable::new(layout.table_path())),
        order,
    );
    service
        .execute()
        .with_context(|| format!("Failed to flatten {}", layout.raw_path().display()))
}

fn review(layout: &WorkspaceLayout) -> Result<ReviewReport> {
    let settings = ReviewSettings {
        emphasize: console::Term::stdout().is_term(),
    };
    let service = ReviewService::new(
        Box::new(CsvFlatTable::new(layout.table_path())),
        Box::new(CsvDecisionLog::new(layout.decisions_path())),
        settings,
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    service
        .execute(&mut input, &mut out)
        .context("Review failed")
}
