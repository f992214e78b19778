//! vehicle-ads CLI - clean and analyze used-vehicle sales ads
//!
//! ```bash
//! vehicle-ads analyze vehicles_us.csv              # Full report as JSON
//! vehicle-ads clean vehicles_us.csv -f csv -o out  # Cleaned listings
//! vehicle-ads outliers vehicles_us.csv -c price    # IQR bands per column
//! vehicle-ads describe vehicles_us.csv -c odometer # Column statistics
//! vehicle-ads parse vehicles_us.csv                # Raw rows as JSON
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokio::sync::broadcast::Receiver;
use vehicle_ads::logs::{drain, LogEntry, LOG_BROADCASTER};
use vehicle_ads::pipeline::format_delimiter;
use vehicle_ads::{
    analyze_csv, describe, filter_columns, filter_outliers, load_clean, parse_file, AnalysisOptions,
    BandSettings, Column, FilterMode, Listing, QuantileMethod,
};

#[derive(Parser)]
#[command(name = "vehicle-ads")]
#[command(about = "Clean and analyze used-vehicle sales ads", long_about = None)]
struct Cli {
    /// CSV delimiter (auto-detect if not specified)
    #[arg(short, long, global = true)]
    delimiter: Option<char>,

    /// Don't print progress logs
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Also write the run's log entries to this file (JSON lines)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV file and output the raw rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Impute missing values and add derived columns
    Clean {
        /// Input CSV file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute IQR bands and drop outliers
    Outliers {
        /// Input CSV file
        input: PathBuf,

        /// Columns to bound (default: the standard cleaning set)
        #[arg(short, long)]
        column: Vec<Column>,

        /// How bands of several columns combine
        #[arg(short, long, default_value = "independent")]
        mode: FilterMode,

        /// Quartile method
        #[arg(long, default_value = "lower")]
        quantile_method: QuantileMethod,

        /// IQR multiplier
        #[arg(long, default_value = "1.5")]
        multiplier: f64,

        /// Write the kept listings to this file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Descriptive statistics of one column
    Describe {
        /// Input CSV file
        input: PathBuf,

        /// Column to describe
        #[arg(short, long)]
        column: Column,

        /// Describe the column after dropping its own outliers
        #[arg(long)]
        filtered: bool,

        /// Quartile method
        #[arg(long, default_value = "lower")]
        quantile_method: QuantileMethod,
    },

    /// Full analysis report
    Analyze {
        /// Input CSV file
        input: PathBuf,

        /// JSON options file
        #[arg(long)]
        options: Option<PathBuf>,

        /// Override the filter mode
        #[arg(short, long)]
        mode: Option<FilterMode>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy)]
enum OutputFormat {
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown format '{}' (expected json or csv)", other)),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    LOG_BROADCASTER.set_quiet(cli.quiet);
    let mut log_rx = cli.log_file.as_ref().map(|_| LOG_BROADCASTER.subscribe());

    let delimiter = cli.delimiter;
    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Clean { input, format, output } => {
            cmd_clean(&input, delimiter, format, output.as_deref())
        }

        Commands::Outliers {
            input,
            column,
            mode,
            quantile_method,
            multiplier,
            output,
        } => cmd_outliers(
            &input,
            delimiter,
            &column,
            mode,
            quantile_method,
            multiplier,
            output.as_deref(),
        ),

        Commands::Describe {
            input,
            column,
            filtered,
            quantile_method,
        } => cmd_describe(&input, delimiter, column, filtered, quantile_method),

        Commands::Analyze {
            input,
            options,
            mode,
            output,
        } => cmd_analyze(&input, delimiter, options.as_deref(), mode, output.as_deref()),
    };

    if let (Some(path), Some(rx)) = (cli.log_file.as_deref(), log_rx.as_mut()) {
        if let Err(e) = write_log_file(path, rx) {
            eprintln!("⚠️  Could not write log file {}: {}", path.display(), e);
        }
    }

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file(input, delimiter)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(result.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} rows", result.listings.len());

    let json = serde_json::to_string_pretty(&result.listings)?;
    write_output(&json, output)
}

fn cmd_clean(
    input: &Path,
    delimiter: Option<char>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_, listings) = load_clean(input, delimiter)?;

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&listings)?,
        OutputFormat::Csv => listings_to_csv(&listings)?,
    };
    write_output(&content, output)
}

fn cmd_outliers(
    input: &Path,
    delimiter: Option<char>,
    columns: &[Column],
    mode: FilterMode,
    method: QuantileMethod,
    multiplier: f64,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = AnalysisOptions {
        columns: if columns.is_empty() {
            Column::DEFAULT_CLEANING.to_vec()
        } else {
            columns.to_vec()
        },
        quantile_method: method,
        iqr_multiplier: multiplier,
        ..Default::default()
    };
    options.validate()?;

    let (_, listings) = load_clean(input, delimiter)?;
    let outcome = filter_columns(&listings, &options.columns, mode, options.band_settings())?;

    eprintln!("\n✂️  Outlier bands ({:?}):", mode);
    for b in &outcome.bands {
        eprintln!(
            "   {:<20} Q1={:<10} Q3={:<10} band=[{}, {}]  removed {} of {}",
            b.column.name(),
            b.band.q1,
            b.band.q3,
            b.band.lower,
            b.band.upper,
            b.removed,
            b.rows_in
        );
    }
    eprintln!("   Kept {} of {} listings", outcome.rows.len(), listings.len());

    println!("{}", serde_json::to_string_pretty(&outcome.bands)?);

    if let Some(path) = output {
        fs::write(path, serde_json::to_string_pretty(&outcome.rows)?)?;
        eprintln!("💾 Kept listings written to: {}", path.display());
    }
    Ok(())
}

fn cmd_describe(
    input: &Path,
    delimiter: Option<char>,
    column: Column,
    filtered: bool,
    method: QuantileMethod,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_, listings) = load_clean(input, delimiter)?;

    let rows = if filtered {
        let settings = BandSettings {
            method,
            ..Default::default()
        };
        filter_outliers(&listings, column, settings)?.0
    } else {
        listings
    };

    let summary = describe(column.name(), &column.values(&rows), method)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_analyze(
    input: &Path,
    delimiter: Option<char>,
    options_path: Option<&Path>,
    mode: Option<FilterMode>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = match options_path {
        Some(p) => AnalysisOptions::from_json_file(p)?,
        None => AnalysisOptions::default(),
    };
    if delimiter.is_some() {
        options.delimiter = delimiter;
    }
    if let Some(mode) = mode {
        options.filter_mode = mode;
    }

    let report = analyze_csv(input, &options)?;
    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)
}

fn listings_to_csv(listings: &[Listing]) -> Result<String, Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for listing in listings {
        writer.serialize(listing)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn write_log_file(path: &Path, rx: &mut Receiver<LogEntry>) -> Result<(), Box<dyn std::error::Error>> {
    let mut content = String::new();
    for entry in drain(rx) {
        content.push_str(&serde_json::to_string(&entry)?);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
