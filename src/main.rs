//! # sensor-export CLI
//!
//! Usage:
//!   sensor-export render job.json -o report.pdf
//!   echo '{ ... }' | sensor-export render -o report.pdf
//!   sensor-export csv table.json -o table.csv
//!   sensor-export xlsx workbook.json -o workbook.xlsx
//!   sensor-export example > job.json

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use sensor_export::export::{write_csv, write_xlsx, RecordsWorkbook, TableSource};
use sensor_export::job::example_job_json;
use sensor_export::model::SensorTable;
use sensor_export::{render_job_json, ExportError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sensor-export",
    version,
    about = "Paginated PDF, CSV and Excel reports for sensor telemetry"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON report job to PDF
    Render {
        /// Job file; reads stdin when omitted
        input: Option<PathBuf>,
        #[arg(short, long, default_value = "output.pdf")]
        output: PathBuf,
    },
    /// Export a JSON sensor table to CSV
    Csv {
        input: Option<PathBuf>,
        #[arg(short, long, default_value = "output.csv")]
        output: PathBuf,
    },
    /// Export a JSON workbook ({"sheets": [{"name", "rows"}]}) to Excel
    Xlsx {
        input: Option<PathBuf>,
        #[arg(short, long, default_value = "output.xlsx")]
        output: PathBuf,
    },
    /// Print a sample report job
    Example,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), ExportError> {
    match command {
        Commands::Render { input, output } => {
            let rendered = render_job_json(&read_input(input.as_deref())?)?;
            fs::write(&output, &rendered.pdf)?;
            for warning in &rendered.warnings {
                eprintln!("! {}", warning);
            }
            eprintln!(
                "✓ Written {} pages ({} bytes) to {}",
                rendered.pages,
                rendered.pdf.len(),
                output.display()
            );
        }
        Commands::Csv { input, output } => {
            let table: SensorTable = serde_json::from_str(&read_input(input.as_deref())?)?;
            let file = fs::File::create(&output)?;
            let rows = write_csv(&mut TableSource::new(&table), io::BufWriter::new(file))?;
            eprintln!("✓ Written {} rows to {}", rows, output.display());
        }
        Commands::Xlsx { input, output } => {
            let mut workbook: RecordsWorkbook = serde_json::from_str(&read_input(input.as_deref())?)?;
            let file = fs::File::create(&output)?;
            let sheets = write_xlsx(&mut workbook, io::BufWriter::new(file))?;
            eprintln!("✓ Written {} sheets to {}", sheets, output.display());
        }
        Commands::Example => print!("{}", example_job_json()),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String, ExportError> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
