//! paystub CLI - payroll receipt extraction from spreadsheets
//!
//! A command-line tool for listing the sheets of a payroll workbook and
//! extracting its receipts as JSON or a readable summary.

use clap::{ArgAction, Args, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use paystub::render::{self, JsonFormat};
use paystub::xlsx::XlsxReader;
use paystub::{ExtractOptions, Extractor, ParseResult};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Payroll receipt extraction from loosely structured spreadsheets
#[derive(Parser)]
#[command(
    name = "paystub",
    author = "iyulab",
    version,
    about = "Extract payroll receipts from spreadsheets",
    long_about = "paystub - Heuristic payroll extraction tool.\n\n\
                  Locates the header block of a payroll sheet, maps its columns by fuzzy \
                  label matching and emits one receipt per employee row."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook
    Sheets {
        /// Input .xlsx file
        input: PathBuf,
    },

    /// Find the sheet whose name best matches a query
    Find {
        /// Input .xlsx file
        input: PathBuf,

        /// Approximate sheet name
        query: String,
    },

    /// Extract receipts as JSON
    Parse {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Show the detected layout, batch totals and warnings
    Info {
        #[command(flatten)]
        source: SourceArgs,

        /// Also list every extracted record
        #[arg(long)]
        records: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct SourceArgs {
    /// Input .xlsx file
    input: PathBuf,

    /// Sheet name or approximate name (default: first sheet)
    #[arg(short, long)]
    sheet: Option<String>,

    /// TOML file overriding thresholds, metadata cells or the label table
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sheets { input } => {
            let reader = XlsxReader::open(&input)?;
            for (i, name) in reader.sheet_names().iter().enumerate() {
                println!("{:>3}  {}", i + 1, name);
            }
        }

        Commands::Find { input, query } => {
            let reader = XlsxReader::open(&input)?;
            let names = reader.sheet_names();

            match paystub::find_sheet(&query, &names) {
                Some(name) => println!("{} {}", "✓".green().bold(), name),
                None => {
                    println!(
                        "{} No sheet matches \"{}\". Available sheets: {}",
                        "!".yellow().bold(),
                        query,
                        names.join(", ")
                    );
                    std::process::exit(2);
                }
            }
        }

        Commands::Parse {
            source,
            output,
            compact,
        } => {
            let pb = create_spinner("Reading workbook...");
            let result = extract(&source, &pb);
            pb.finish_and_clear();
            let result = result?;

            print_warnings(&result);

            let format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let json = render::to_json(&result, format)?;
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!(
                    "{} Extracted {} receipts to {}",
                    "✓".green().bold(),
                    result.records.len(),
                    path.display()
                );
            }
        }

        Commands::Info { source, records } => {
            let pb = create_spinner("Reading workbook...");
            let result = extract(&source, &pb);
            pb.finish_and_clear();
            let result = result?;

            println!("{}", "Payroll Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                source.input.file_name().unwrap_or_default().to_string_lossy()
            );
            print!("{}", render::to_report(&result));

            if records {
                let name_col = result
                    .columns
                    .get(paystub::FieldKey::EmployeeName)
                    .and_then(|b| b.first_column())
                    .unwrap_or_default();
                println!("\n{}", "Records".cyan().bold());
                println!("{}", "─".repeat(40));
                for line in render::to_record_lines(&result, name_col) {
                    println!("{line}");
                }
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

/// Read the workbook, pick the sheet and run the extractor.
fn extract(source: &SourceArgs, pb: &ProgressBar) -> Result<ParseResult, Box<dyn std::error::Error>> {
    let options = match source.config {
        Some(ref path) => load_options(path)?,
        None => ExtractOptions::default(),
    };

    let workbook = XlsxReader::open(&source.input)?.read_workbook()?;
    let selector = match source.sheet {
        Some(ref sheet) => sheet.clone(),
        None => workbook
            .sheet_names()
            .first()
            .map(|s| s.to_string())
            .ok_or("the workbook has no sheets")?,
    };

    tracing::info!(sheet = %selector, input = %source.input.display(), "extracting receipts");
    pb.set_message(format!("Extracting receipts from \"{selector}\"..."));
    Ok(Extractor::new(options).parse(&workbook, &selector)?)
}

fn load_options(path: &Path) -> Result<ExtractOptions, Box<dyn std::error::Error>> {
    ExtractOptions::from_path(path)
        .map_err(|e| format!("{}: {}", path.display(), e).into())
}

fn print_warnings(result: &ParseResult) {
    for message in result.warning_messages() {
        eprintln!("{}: {}", "Warning".yellow().bold(), message);
    }
}

fn print_version() {
    println!("{} {}", "paystub".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Heuristic payroll receipt extraction from spreadsheets");
    println!();
    println!("Supported formats: XLSX");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
