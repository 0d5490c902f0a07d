use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use pricewatch_core::{AppState, ScrapeOutcome, Signal};
use pricewatch_engine::{
    decode_html, render, write_export, ExportFormat, ExportInput, ExtractionProfile, Extractor,
    ProductExtractor,
};
use pricewatch_logging::pw_info;

use crate::platform::{
    highlighted_table, initialize_logging, load_config, load_saved_state, results_table, run_batch,
    summary,
    AppConfig, BatchSource, LogDestination, DEFAULT_LOG_FILE,
};

#[derive(Parser)]
#[command(name = "pricewatch", version, about = "Batch price checks for product pages")]
pub struct Cli {
    /// RON config file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides `state_dir` from the config file
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
    /// error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,
    /// Also write the log to pricewatch.log in the state directory
    #[arg(long, global = true)]
    log_to_file: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every product in a batch, pacing requests
    Run(RunArgs),
    /// Extract fields from a saved HTML page
    Inspect(InspectArgs),
    /// Show the saved batch
    Status(StatusArgs),
    /// Export the saved batch
    Export(ExportArgs),
}

#[derive(clap::Args)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "csv", "resume"])))]
struct RunArgs {
    /// File with one product URL per line
    #[arg(long)]
    input: Option<PathBuf>,
    /// CSV file with url and saved price columns
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Continue the batch saved in the state directory
    #[arg(long)]
    resume: bool,
    /// Write an export once the batch completes
    #[arg(long, value_enum)]
    export: Option<FormatArg>,
    /// Directory for the export file
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[derive(clap::Args)]
struct InspectArgs {
    /// Saved product page
    file: PathBuf,
    #[arg(long, value_enum, default_value = "fetched")]
    profile: ProfileArg,
    /// Reference date for delivery phrases (YYYY-MM-DD); defaults to today
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(clap::Args)]
struct StatusArgs {
    /// List only successful rows carrying this signal
    #[arg(long, value_enum)]
    signal: Option<SignalArg>,
}

#[derive(clap::Args)]
struct ExportArgs {
    #[arg(long, value_enum)]
    format: FormatArg,
    /// Directory for the export file; TSV without it goes to stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Tsv,
    Csv,
    Html,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Tsv => ExportFormat::Tsv,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Html => ExportFormat::Html,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SignalArg {
    OutOfStock,
    LowStock,
    Late,
    PriceUp,
}

impl From<SignalArg> for Signal {
    fn from(arg: SignalArg) -> Self {
        match arg {
            SignalArg::OutOfStock => Signal::OutOfStock,
            SignalArg::LowStock => Signal::LowStock,
            SignalArg::Late => Signal::LateDelivery,
            SignalArg::PriceUp => Signal::PriceIncreased,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Live,
    Fetched,
}

impl From<ProfileArg> for ExtractionProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Live => ExtractionProfile::LivePage,
            ProfileArg::Fetched => ExtractionProfile::FetchedDocument,
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }

    let destination = if cli.log_to_file {
        LogDestination::Both(config.state_dir.join(DEFAULT_LOG_FILE))
    } else {
        LogDestination::Terminal
    };
    initialize_logging(&destination, cli.log_level);

    let today = Local::now().date_naive();
    match cli.command {
        Command::Run(args) => run_command(&config, args, today),
        Command::Inspect(args) => inspect_command(&config, args, today),
        Command::Status(args) => {
            let state = load_saved_state(&config, today)?;
            let view = state.view();
            print!("{}", summary(&view));
            match args.signal {
                Some(signal) => {
                    print!("{}", highlighted_table(&view, &state.matching(signal.into())))
                }
                None => print!("{}", results_table(&view)),
            }
            Ok(())
        }
        Command::Export(args) => {
            let state = load_saved_state(&config, today)?;
            export_state(&state, args.format.into(), args.out, today)
        }
    }
}

fn run_command(config: &AppConfig, args: RunArgs, today: NaiveDate) -> anyhow::Result<()> {
    let source = if args.resume {
        BatchSource::Resume
    } else if let Some(path) = args.csv {
        BatchSource::Csv(read_text(&path)?)
    } else if let Some(path) = args.input {
        BatchSource::UrlList(read_text(&path)?)
    } else {
        anyhow::bail!("one of --input, --csv or --resume is required");
    };

    let state = run_batch(config, source, today)?;
    let view = state.view();
    print!("{}", summary(&view));

    if let Some(format) = args.export {
        export_state(&state, format.into(), Some(args.out), today)?;
    }
    Ok(())
}

fn inspect_command(config: &AppConfig, args: InspectArgs, today: NaiveDate) -> anyhow::Result<()> {
    let bytes = fs::read(&args.file).with_context(|| format!("failed to read {:?}", args.file))?;
    let decoded = decode_html(&bytes, None);
    pw_info!(
        "Decoded {:?} as {} (replacements: {})",
        args.file,
        decoded.encoding_label,
        decoded.had_replacements
    );

    let extractor = ProductExtractor::new(&config.selectors, args.profile.into())?;
    let report = extractor.extract(&decoded.html, args.today.unwrap_or(today));
    let fields = &report.fields;
    println!("blocked:      {}", report.blocked);
    println!("title:        {}", fields.title.as_deref().unwrap_or("-"));
    println!("price:        {}", fields.price.as_deref().unwrap_or("-"));
    println!("availability: {}", fields.availability.as_deref().unwrap_or("-"));
    println!(
        "delivery:     {}",
        fields
            .delivery_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    let outcome = match report.into_outcome() {
        ScrapeOutcome::Extracted(_) => "extracted".to_string(),
        ScrapeOutcome::Blocked => "blocked".to_string(),
        ScrapeOutcome::StructureChanged => "structure changed".to_string(),
        ScrapeOutcome::TransportFailed(detail) => format!("transport failed: {detail}"),
    };
    println!("outcome:      {outcome}");
    Ok(())
}

fn export_state(
    state: &AppState,
    format: ExportFormat,
    out: Option<PathBuf>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let input = ExportInput {
        records: state.records(),
        stats: state.stats(),
        enhanced: state.enhanced_stats(),
        reference: state.reference_date(),
        generated_on: today,
    };
    match (format, out) {
        (ExportFormat::Tsv, None) => {
            print!("{}", render(format, &input)?);
        }
        (format, out) => {
            let dir = out.unwrap_or_else(|| PathBuf::from("."));
            let path = write_export(&dir, format, &input)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))
}
