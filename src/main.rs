//! awstail entry point: argument parsing, logging setup, runtime wiring and
//! exit-code mapping. Stdout carries log events only; diagnostics go to
//! stderr.

#![warn(clippy::all, rust_2018_idioms)]

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::prelude::*;

use awstail::app::cloudwatch_logs::{
    resolve_streams, run_stream, CloudWatchLogsApi, EventFetcher, FilterRequest, LogsApi,
    QueryWindow,
};
use awstail::app::errors::Error;
use awstail::app::printer::{ExtractPolicy, FieldQuery, LogPrinter, RenderOptions};
use awstail::app::query_template::QueryTemplate;
use awstail::app::time_range;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_BRANCH"),
    "@",
    env!("GIT_COMMIT"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "awstail",
    version = VERSION,
    about = "Tail and filter AWS CloudWatch Logs"
)]
struct Cli {
    /// AWS region (defaults to the profile/environment region)
    #[arg(long, global = true)]
    aws_region: Option<String>,

    /// AWS credentials profile
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List log groups
    Groups {
        /// Only groups whose name starts with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
    },
    /// List log streams in a group
    Streams {
        /// Log group name
        group: String,
        /// Only streams whose name starts with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
    },
    /// Stream and filter log events
    Get(GetArgs),
}

#[derive(Args)]
struct GetArgs {
    /// Log group name (may come from --template instead)
    group: Option<String>,

    /// Only query streams whose name starts with this prefix
    stream_prefix: Option<String>,

    /// Start of the query window ("5m", "2h ago", "2024-01-01 10:00")
    #[arg(short, long, default_value = "5m")]
    start: String,

    /// End of the query window (same forms as --start)
    #[arg(short, long)]
    end: Option<String>,

    /// CloudWatch Logs filter pattern applied server-side
    #[arg(short, long)]
    filter: Option<String>,

    /// Keep polling for new events after draining the available pages
    #[arg(short, long)]
    watch: bool,

    /// Field to extract from JSON-formatted messages (e.g. "log.message")
    #[arg(short, long)]
    query: Option<String>,

    /// Fail the run when field extraction hits an unextractable message
    #[arg(long, requires = "query")]
    strict_query: bool,

    /// Hide the log group column
    #[arg(long)]
    no_group: bool,

    /// Hide the log stream column
    #[arg(long)]
    no_stream: bool,

    /// Show the event timestamp column
    #[arg(long)]
    timestamp: bool,

    /// Show the ingestion time column
    #[arg(long)]
    ingestion_time: bool,

    /// Disable colorized columns
    #[arg(long)]
    no_color: bool,

    /// YAML query template file
    #[arg(long)]
    template: Option<PathBuf>,

    /// key=value binding for template variables (repeatable)
    #[arg(long = "template-arg", requires = "template")]
    template_arg: Vec<String>,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "awstail=warn,aws_config=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,hyper=warn",
        )
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();

    // An interrupt is a normal interactive shutdown, not an error: the token
    // lets the watch loop unwind cleanly and the process exit 0.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    match run(cli, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let api = CloudWatchLogsApi::connect(cli.aws_region, cli.aws_profile).await;

    match cli.command {
        Commands::Groups { prefix } => list_groups(&api, prefix.as_deref()).await,
        Commands::Streams { group, prefix } => list_streams(&api, &group, prefix.as_deref()).await,
        Commands::Get(args) => get_logs(api, args, cancel).await,
    }
}

async fn list_groups(api: &dyn LogsApi, prefix: Option<&str>) -> Result<()> {
    print_names(api.describe_groups(prefix).await?)
}

async fn list_streams(api: &dyn LogsApi, group: &str, prefix: Option<&str>) -> Result<()> {
    let streams = api.describe_streams(group, prefix).await?;
    print_names(streams.into_iter().map(|stream| stream.stream_name))
}

/// Writes one name per line. A closed pipe downstream ends the listing
/// cleanly instead of failing it.
fn print_names(names: impl IntoIterator<Item = String>) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for name in names {
        match writeln!(handle, "{}", name) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

async fn get_logs(api: CloudWatchLogsApi, args: GetArgs, cancel: CancellationToken) -> Result<()> {
    // Template fields fill whatever the command line left unset.
    let (group, stream_prefix, filter_pattern) = match &args.template {
        Some(path) => {
            let template = QueryTemplate::from_file(path, &args.template_arg)?;
            if let Some(format) = &template.output_format {
                debug!(output_format = %format, "template output_format accepted, not interpreted");
            }
            (
                args.group.clone().unwrap_or(template.log_group_name),
                args.stream_prefix
                    .clone()
                    .or(Some(template.log_stream_prefix)),
                args.filter.clone().or(template.filter_pattern),
            )
        }
        None => {
            let group = args.group.clone().ok_or_else(|| {
                Error::InvalidQueryArgument(
                    "a log group is required (argument or --template)".to_string(),
                )
            })?;
            (group, args.stream_prefix.clone(), args.filter.clone())
        }
    };

    let now = Utc::now();
    let window = QueryWindow::new(
        time_range::resolve(Some(&args.start), now)?,
        time_range::resolve(args.end.as_deref(), now)?,
    );

    let streams = resolve_streams(&api, &group, stream_prefix.as_deref(), window).await?;
    let max_stream_length = streams.iter().map(String::len).max().unwrap_or(10);

    let options = RenderOptions {
        show_group: !args.no_group,
        show_stream: !args.no_stream,
        show_timestamp: args.timestamp,
        show_ingestion_time: args.ingestion_time,
        color_enabled: !args.no_color,
        extract_policy: if args.strict_query {
            ExtractPolicy::Strict
        } else {
            ExtractPolicy::Lenient
        },
    };

    let mut printer = LogPrinter::new(group.clone(), max_stream_length, options);
    if let Some(expression) = &args.query {
        printer = printer.with_query(FieldQuery::compile(expression)?);
    }

    let mut request = FilterRequest::new(group)
        .with_streams(streams)
        .with_window(window);
    if let Some(pattern) = filter_pattern {
        request = request.with_filter_pattern(pattern);
    }

    let mut fetcher = EventFetcher::new(Arc::new(api), request);
    run_stream(
        &mut fetcher,
        |event| printer.print_event(event),
        args.watch,
        &cancel,
    )
    .await
}
