//! CLI entry point for the indicator lookup tool.
//!
//! Provides subcommands for turning the indicator sheet into the dashboard's
//! JSON lookup, serving the dashboard locally and checking the app version.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicator_lookup::{
    fetch::{BasicClient, load},
    layout::ReportLayout,
    output::write_json,
    publish::{DEFAULT_KEY, write_json_to_s3},
    reshape::build_lookup,
    server::serve,
    table::{DEFAULT_SHEET, SourceFormat, SourceTable},
    version::check_version,
};
use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "indicator_lookup")]
#[command(about = "Builds and serves the indicator dashboard lookup", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reshape the indicator sheet into the dashboard JSON lookup
    Build {
        /// Path or URL of the indicator workbook (.csv/.tsv/.txt are read as delimited text)
        #[arg(short, long, default_value = "base_indicadores.xlsx")]
        source: String,

        /// Worksheet holding the indicators
        #[arg(long, default_value = DEFAULT_SHEET)]
        sheet: String,

        /// JSON file to write
        #[arg(short, long, default_value = "dict_indicadores.json")]
        output: String,

        /// Field delimiter of a delimited source file
        #[arg(short, long, default_value_t = ',')]
        delimiter: char,

        /// Decimal separator of delimited numbers (default ',' when the delimiter is ';')
        #[arg(long)]
        decimal: Option<char>,

        /// Optional JSON layout replacing the built-in segments and whitelist
        #[arg(short, long)]
        layout: Option<String>,

        /// Optional: S3 bucket to upload the JSON to (e.g., "my-bucket")
        #[arg(long, env = "S3_BUCKET")]
        s3_bucket: Option<String>,

        /// Object key used for the S3 upload
        #[arg(long, default_value = DEFAULT_KEY)]
        s3_key: String,

        /// Gzip compress the JSON before uploading to S3
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Serve the dashboard and its lookup over HTTP
    Serve {
        /// Directory holding index.html, styles.css, scripts/ and the lookup
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:5000")]
        addr: SocketAddr,

        /// Do not open a browser after startup
        #[arg(long, default_value_t = false)]
        no_browser: bool,
    },
    /// Compare the local version file against the reference copy
    CheckVersion {
        /// Local version file
        #[arg(short, long, default_value = "version.txt")]
        current: String,

        /// Path or URL of the reference version file
        #[arg(short, long, env = "REFERENCE_VERSION")]
        reference: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/indicator_lookup.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("indicator_lookup.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            source,
            sheet,
            output,
            delimiter,
            decimal,
            layout,
            s3_bucket,
            s3_key,
            gzip,
        } => {
            let decimal = decimal.unwrap_or(if delimiter == ';' { ',' } else { '.' });
            let input = Input {
                source: &source,
                sheet: &sheet,
                delimiter,
                decimal,
            };
            build(input, &output, layout.as_deref(), s3_bucket, &s3_key, gzip).await?;
        }
        Commands::Serve {
            dir,
            addr,
            no_browser,
        } => {
            serve(dir, addr, !no_browser).await?;
        }
        Commands::CheckVersion { current, reference } => {
            let client = BasicClient::new();
            let check = check_version(&client, &current, &reference).await?;
            info!(up_to_date = check.is_current(), "Verificação de versão");
        }
    }

    Ok(())
}

/// Where the indicator sheet comes from and how to read it.
#[derive(Debug, Clone, Copy)]
struct Input<'a> {
    source: &'a str,
    sheet: &'a str,
    delimiter: char,
    decimal: char,
}

/// Loads the sheet, reshapes it, writes the lookup and optionally uploads it.
#[tracing::instrument(skip(s3_bucket, gzip))]
async fn build(
    input: Input<'_>,
    output: &str,
    layout: Option<&str>,
    s3_bucket: Option<String>,
    s3_key: &str,
    gzip: bool,
) -> Result<()> {
    let Input {
        source,
        sheet,
        delimiter,
        decimal,
    } = input;
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got '{delimiter}'");
    }
    if !decimal.is_ascii() || decimal == delimiter {
        bail!("decimal separator must be an ASCII character other than the delimiter, got '{decimal}'");
    }

    let layout = match layout {
        Some(path) => ReportLayout::load(path)?,
        None => ReportLayout::default(),
    };

    let client = BasicClient::new();
    let bytes = load(&client, source).await?;
    let format = SourceFormat::from_source(source);
    let table = SourceTable::load(&bytes, format, delimiter as u8, sheet)
        .with_context(|| format!("parsing source table '{source}'"))?
        .with_decimal(decimal);
    info!(rows = table.len(), ?format, "Source table ready");

    let (lookup, summary) = build_lookup(&table, &layout);
    let body = write_json(output, &lookup)?;

    if let Some(bucket) = s3_bucket.filter(|b| !b.is_empty()) {
        let config = aws_config::load_from_env().await;
        let s3 = aws_sdk_s3::Client::new(&config);
        write_json_to_s3(&s3, &bucket, s3_key, &body, gzip).await?;
    } else {
        info!("S3 bucket not specified, skipping upload");
    }

    info!(
        output,
        segments = summary.segments,
        combinations = summary.combinations,
        failed = summary.failed,
        "Build finished"
    );
    Ok(())
}
