use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use inquire::{CustomType, Text};
use prettytable::{format, Cell, Row, Table};
use std::{error::Error, path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use timesheet_report::{
    config::{LogoSource, ReportConfig},
    input::read_raw_table_from_path,
    normalize::{normalize, Column},
    partition::{partitions, PartitionKey},
    summary::Summary,
    workbook::generate,
};

// --- CLI Structure ---
#[derive(Parser)]
#[command(name = "Timesheet Report")]
#[command(about = "Split a raw time-tracking export into per-client billing sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the workbook (GERAL + one sheet per client)
    Generate(GenerateArgs),
    /// Print per-client totals without writing a file
    Summary(SummaryArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Raw export (.xlsx/.xls). Asked for interactively when omitted.
    input: Option<PathBuf>,
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Hourly rate used for TOTAL MENSAL
    #[arg(long, allow_negative_numbers = true)]
    rate: Option<f64>,
    #[arg(long, conflicts_with_all = ["logo_file", "no_logo"])]
    logo_url: Option<String>,
    #[arg(long, conflicts_with = "no_logo")]
    logo_file: Option<PathBuf>,
    #[arg(long)]
    no_logo: bool,
    /// Logo width and height in pixels
    #[arg(long)]
    logo_size: Option<u32>,
    /// Keep default column widths
    #[arg(long)]
    no_autofit: bool,
}

#[derive(Args)]
struct SummaryArgs {
    input: PathBuf,
    #[arg(long, allow_negative_numbers = true)]
    rate: Option<f64>,
}

fn main() -> ExitCode {
    dotenv().ok(); // Reads the .env file
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "report generation failed");
            eprintln!("Failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = ReportConfig::from_env()?;
    match cli.command {
        Commands::Generate(args) => handle_generate(config, args)?,
        Commands::Summary(args) => handle_summary(config, args)?,
    }
    Ok(())
}

// --- Function 1: Generate Workbook ---
fn handle_generate(mut config: ReportConfig, args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    let input = match args.input {
        Some(path) => path,
        None => {
            let path = Text::new("Raw export (.xlsx/.xls):").prompt()?;
            if args.rate.is_none() {
                config.rate = CustomType::<f64>::new("Hourly rate:")
                    .with_default(config.rate)
                    .prompt()?;
            }
            PathBuf::from(path.trim())
        }
    };

    if let Some(rate) = args.rate {
        config.rate = rate;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(url) = args.logo_url {
        config.logo = LogoSource::Url(url);
    } else if let Some(path) = args.logo_file {
        config.logo = LogoSource::File(path);
    } else if args.no_logo {
        config.logo = LogoSource::Disabled;
    }
    if let Some(size) = args.logo_size {
        config.layout.logo_size = size;
    }
    if args.no_autofit {
        config.layout.autofit = false;
    }
    config.validate()?;

    let raw = read_raw_table_from_path(&input)?;
    println!("Loaded {} rows from {}.", raw.rows.len(), input.display());

    let table = normalize(&raw)?;
    let report = generate(&table, &config)?;
    report.save(&config.output)?;

    info!(path = %config.output.display(), "report written");
    println!(
        "File successfully generated: {} ({} sheets: {} + clients)",
        config.output.display(),
        report.sheet_count(),
        config.layout.overview_name
    );
    Ok(())
}

// --- Function 2: Console Summary ---
fn handle_summary(mut config: ReportConfig, args: SummaryArgs) -> Result<(), Box<dyn Error>> {
    if let Some(rate) = args.rate {
        config.rate = rate;
    }
    config.validate()?;
    let rate = config.rate;
    let raw = read_raw_table_from_path(&args.input)?;
    let table = normalize(&raw)?;
    let duration_index = table.column_index(Column::Duration);

    let mut out = Table::new();
    out.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    out.set_titles(Row::new(vec![
        Cell::new("Client"), Cell::new("Entries"), Cell::new("Total time"),
        Cell::new("Hours"), Cell::new("Total due"),
    ]));

    for partition in partitions(&table.records) {
        let summary = Summary::for_records(&partition.records, duration_index, rate);
        let (label, style) = match &partition.key {
            PartitionKey::Overview => (config.layout.overview_name.clone(), "b"),
            PartitionKey::Client(id) => (id.clone(), ""),
        };
        out.add_row(Row::new(vec![
            Cell::new(&label).style_spec(style),
            Cell::new(&partition.records.len().to_string()).style_spec("r"),
            Cell::new(&summary.total_time).style_spec("c"),
            Cell::new(&format!("{:.2}", summary.decimal_hours)).style_spec("r"),
            Cell::new(&format!("{:.2}", summary.total_due())).style_spec("r"),
        ]));
    }

    println!("\nHourly rate: {:.2}", rate);
    out.printstd();
    Ok(())
}
