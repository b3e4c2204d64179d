//! Fetch Profiles - user profile lookup tool
//!
//! Reads one username per line from the given file and prints the public
//! profile returned by the user API for each of them, one request every
//! five seconds.
//!
//! A run is refused if the previous one rendered a profile less than a
//! minute ago (see the `lastrun` file next to the executable). Everything
//! printed is also appended to `logs/<start time>.log` beside the executable.
//!
//! Exit codes:
//! - 0: Done, usage shown, run throttled, or empty username file
//! - 1: At least one profile could not be fetched
//! - other: OS error code from opening the username file

mod clock;
mod console;
mod fetcher;
mod flatten;
mod throttle;
mod usernames;

use clap::Parser;
use clock::{Clock, SystemClock};
use console::Console;
use fetcher::{FetchSettings, HttpProfileSource, Pacer, ProfileSource, TokioPacer};
use std::io::Write;
use std::path::PathBuf;
use throttle::ThrottleStatus;
use tracing::{debug, info};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

const USAGE: &str = "Usage: fetch_profiles <file>";

#[derive(Parser, Debug)]
#[command(name = "fetch_profiles")]
#[command(about = "Print the public profile of every username listed in a file")]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Path to a file with one username per line
    #[arg(allow_hyphen_values = true)]
    file: PathBuf,
}

/// Compiled-in defaults; only tests construct anything else.
#[derive(Debug, Clone)]
struct RunConfig {
    base_url: String,
    throttle_path: PathBuf,
    min_interval: chrono::Duration,
    delay: std::time::Duration,
    log_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: fetcher::BASE_ADDRESS.to_string(),
            throttle_path: throttle::default_path(),
            min_interval: chrono::Duration::seconds(60),
            delay: fetcher::DEFAULT_DELAY,
            log_dir: Some(console::default_log_dir()),
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let Some(args) = parse_args(std::env::args_os()) else {
        println!("{}", USAGE);
        std::process::exit(0);
    };

    let config = RunConfig::default();
    let clock = SystemClock;

    let mut console = Console::stdout();
    if let Some(log_dir) = &config.log_dir {
        console = console.with_log_dir(log_dir, clock.now());
    }

    let exit_code = run(
        &args,
        &config,
        &HttpProfileSource,
        &clock,
        &TokioPacer,
        &mut console,
    )
    .await;

    std::process::exit(exit_code);
}

fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(|metadata| {
            *metadata.level() <= tracing::Level::INFO
                && metadata.target().starts_with(env!("CARGO_CRATE_NAME"))
        }));

    tracing_subscriber::registry().with(fmt_layer).init();
}

/// Exactly one argument, which must not be a help request.
fn parse_args<I, T>(args: I) -> Option<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Args::try_parse_from(args)
        .ok()
        .filter(|args| args.file.as_os_str() != "--help")
}

async fn run<W: Write>(
    args: &Args,
    config: &RunConfig,
    source: &impl ProfileSource,
    clock: &impl Clock,
    pacer: &impl Pacer,
    console: &mut Console<W>,
) -> i32 {
    if let ThrottleStatus::Wait { remaining_secs } =
        throttle::check(&config.throttle_path, clock, config.min_interval).await
    {
        console.line(&format!(
            "You can run this program again in {} seconds",
            remaining_secs
        ));
        return 0;
    }

    console.write(&format!("Reading usernames from {}", args.file.display()));
    let usernames = match usernames::load_usernames(&args.file).await {
        Ok(usernames) => usernames,
        Err(err) => {
            console.line("");
            console.line(&err.to_string());
            debug!(error = ?err, "username file rejected");
            return err.exit_code();
        }
    };

    if usernames.is_empty() {
        console.line("");
        console.line("No usernames provided on file");
        return 0;
    }
    console.line(" - OK!");

    let settings = FetchSettings {
        base_url: config.base_url.clone(),
        delay: config.delay,
        throttle_path: config.throttle_path.clone(),
    };
    let summary = fetcher::fetch_profiles(&usernames, &settings, source, clock, pacer, console).await;
    info!(fetched = summary.fetched, failed = summary.failed, "run finished");

    if summary.failed == 0 {
        0
    } else {
        1
    }
}
