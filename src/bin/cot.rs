use std::process::ExitCode;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use cftc_cot::app::{CotClient, DownloadOptions, DownloadSummary};
use cftc_cot::catalog;
use cftc_cot::config::{ConfigLoader, ConfiguredRequest, ResolvedConfig};
use cftc_cot::domain::RetrievalRequest;
use cftc_cot::error::CotError;
use cftc_cot::notes::NotesCollector;
use cftc_cot::output::{JsonOutput, TableFormat, TableOutput};
use cftc_cot::resolver::LocationResolver;
use cftc_cot::store::ArchiveCache;
use cftc_cot::table::ReportTable;
use cftc_cot::transport::HttpTransport;

#[derive(Parser)]
#[command(name = "cot")]
#[command(about = "Download CFTC Commitments of Traders report archives")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON config file (defaults to ./cot.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Archive cache directory
    #[arg(long, global = true)]
    cache_dir: Option<Utf8PathBuf>,

    /// Do not read or write cached archives
    #[arg(long, global = true)]
    no_cache: bool,

    #[arg(long, global = true)]
    base_url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Transport-level retries on 429/5xx and connection errors
    #[arg(long, global = true)]
    retries: Option<usize>,

    #[arg(long, global = true, value_enum, default_value_t = TableFormat::Csv)]
    format: TableFormat,

    /// Write the table here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<Utf8PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List known report types")]
    Types,
    #[command(about = "Download one year of a report")]
    Year(YearArgs),
    #[command(about = "Download the historical multi-year bundle of a report")]
    Bundle(BundleArgs),
    #[command(about = "Download an inclusive range of years")]
    Range(RangeArgs),
    #[command(about = "Scrape the explanatory notes page")]
    Notes,
    #[command(about = "Run every request listed in the config file")]
    Batch(BatchArgs),
    #[command(about = "List cached archives")]
    Cache,
}

#[derive(Args)]
struct YearArgs {
    report_type: String,
    year: i32,

    /// Ignore any cached copy
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct BundleArgs {
    report_type: String,

    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct RangeArgs {
    report_type: String,
    start_year: i32,
    end_year: i32,
}

#[derive(Args)]
struct BatchArgs {
    /// Directory receiving one file per request
    #[arg(long, default_value = "cot-output")]
    out_dir: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(cot) = report.downcast_ref::<CotError>() {
            return ExitCode::from(map_exit_code(cot));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CotError) -> u8 {
    match error {
        CotError::UnknownReportType(_)
        | CotError::BundleUnavailable(_)
        | CotError::InvalidYearRange { .. }
        | CotError::InvalidRequest(_) => 2,
        CotError::RetrievalFailed { .. } | CotError::HttpClient(_) => 3,
        CotError::CorruptArchive { .. } | CotError::NoDataFileFound { .. } => 4,
        CotError::RangeFetchFailed { cause, .. } => map_exit_code(cause),
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.global.verbose {
        "cftc_cot=debug,cot=debug"
    } else {
        "cftc_cot=info,cot=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = merge_config(ConfigLoader::resolve(cli.global.config.as_deref())?, &cli.global);
    let options = DownloadOptions {
        cache_dir: cache_dir(&config, &cli.global)?,
        force_refresh: false,
    };
    let output = cli.global.output.as_deref();
    let format = cli.global.format;

    match cli.command {
        Commands::Types => {
            TableOutput::write(&catalog_table(), format, output)?;
        }
        Commands::Year(args) => {
            let spec = catalog::lookup(&args.report_type)?;
            let client = http_client(&config)?;
            let options = DownloadOptions {
                force_refresh: args.force,
                ..options
            };
            let download =
                client.download(RetrievalRequest::year(spec.report_type, args.year), &options)?;
            report_summary(&DownloadSummary::from(&download));
            TableOutput::write(&download.table, format, output)?;
        }
        Commands::Bundle(args) => {
            let spec = catalog::lookup(&args.report_type)?;
            let client = http_client(&config)?;
            let options = DownloadOptions {
                force_refresh: args.force,
                ..options
            };
            let download = client.download(RetrievalRequest::bundle(spec.report_type), &options)?;
            report_summary(&DownloadSummary::from(&download));
            TableOutput::write(&download.table, format, output)?;
        }
        Commands::Range(args) => {
            let spec = catalog::lookup(&args.report_type)?;
            let client = http_client(&config)?;
            let table = client.download_year_range(
                spec.report_type,
                args.start_year,
                args.end_year,
                &options,
            )?;
            eprintln!(
                "{} {}-{}: {} rows, {} columns",
                spec.report_type,
                args.start_year,
                args.end_year,
                table.len(),
                table.columns().len()
            );
            TableOutput::write(&table, format, output)?;
        }
        Commands::Notes => {
            let transport = HttpTransport::new(config.transport)?;
            let notes = NotesCollector::new(transport).fetch_explanatory_notes();
            for issue in &notes.issues {
                eprintln!("warning: {issue}");
            }
            TableOutput::write(&notes.to_table(), format, output)?;
        }
        Commands::Batch(args) => {
            if config.requests.is_empty() {
                return Err(miette::Report::msg(
                    "no requests configured (add `requests` to cot.json)",
                ));
            }
            let client = http_client(&config)?;
            let mut summaries = Vec::new();
            for request in &config.requests {
                let table = run_configured(&client, request, &options)?;
                let path = args
                    .out_dir
                    .join(format!("{}.{}", request.label(), extension(format)));
                TableOutput::write(&table, format, Some(path.as_path()))?;
                summaries.push(serde_json::json!({
                    "request": request.label(),
                    "rows": table.len(),
                    "columns": table.columns().len(),
                    "path": path.as_str(),
                }));
            }
            JsonOutput::print(&summaries).into_diagnostic()?;
        }
        Commands::Cache => {
            let root = options
                .cache_dir
                .clone()
                .ok_or_else(|| miette::Report::msg("caching is disabled"))?;
            for path in ArchiveCache::new(root).list()? {
                println!("{path}");
            }
        }
    }
    Ok(())
}

fn merge_config(mut config: ResolvedConfig, args: &GlobalArgs) -> ResolvedConfig {
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.transport.timeout = Duration::from_secs(timeout);
    }
    if let Some(retries) = args.retries {
        config.transport.retries = retries;
    }
    if let Some(cache_dir) = &args.cache_dir {
        config.cache_dir = Some(cache_dir.clone());
    }
    config
}

fn cache_dir(config: &ResolvedConfig, args: &GlobalArgs) -> Result<Option<Utf8PathBuf>, CotError> {
    if args.no_cache {
        return Ok(None);
    }
    match &config.cache_dir {
        Some(dir) => Ok(Some(dir.clone())),
        None => ArchiveCache::default_root().map(Some),
    }
}

fn http_client(config: &ResolvedConfig) -> Result<CotClient<HttpTransport>, CotError> {
    let transport = HttpTransport::new(config.transport)?;
    Ok(CotClient::new(
        transport,
        LocationResolver::new(config.base_url.clone()),
    ))
}

fn run_configured(
    client: &CotClient<HttpTransport>,
    request: &ConfiguredRequest,
    options: &DownloadOptions,
) -> Result<ReportTable, CotError> {
    match request {
        ConfiguredRequest::Single(request) => {
            let download = client.download(*request, options)?;
            report_summary(&DownloadSummary::from(&download));
            Ok(download.table)
        }
        ConfiguredRequest::Range {
            report_type,
            start_year,
            end_year,
        } => client.download_year_range(*report_type, *start_year, *end_year, options),
    }
}

fn report_summary(summary: &DownloadSummary) {
    eprintln!(
        "{}:{} ({:?}) {} rows, {} columns <- {}",
        summary.report_type,
        summary.target,
        summary.origin,
        summary.rows,
        summary.columns,
        summary.url
    );
}

fn catalog_table() -> ReportTable {
    let rows = catalog::entries()
        .iter()
        .map(|spec| {
            vec![
                spec.report_type.to_string(),
                spec.year_file_prefix.to_string(),
                spec.bundle_filename.unwrap_or("").to_string(),
                spec.description.to_string(),
            ]
        })
        .collect();
    ReportTable::new(
        vec![
            "report_type".to_string(),
            "year_file_prefix".to_string(),
            "bundle_filename".to_string(),
            "description".to_string(),
        ],
        rows,
    )
}

fn extension(format: TableFormat) -> &'static str {
    match format {
        TableFormat::Csv => "csv",
        TableFormat::Json => "json",
    }
}
