//! Formprobe CLI entry point
//!
//! Starts chromedriver (or attaches to a running WebDriver endpoint), runs the
//! registration form suite and reports every check through the log.
//!
//! Exit codes: 0 when every check passed, 1 when any check failed, 2 when the
//! run could not be carried out.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use formprobe::driver::{DriverConfig, DriverService};
use formprobe::webdriver::{Capabilities, WebDriverSession};
use formprobe::{FormSuite, RunnerConfig, SuiteRunner, WaitPolicy};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WaitMode {
    /// Retry reads until they succeed or time out
    Poll,
    /// Sleep blindly before each read
    Fixed,
}

#[derive(Parser, Debug)]
#[command(name = "formprobe")]
#[command(author, version, about = "WebDriver validation checks for a registration form")]
struct Args {
    /// Path to the driver executable
    #[arg(long, default_value = "chromedriver")]
    driver: PathBuf,

    /// Port for the spawned driver (0 = auto)
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Attach to a running WebDriver endpoint instead of spawning one
    #[arg(long, env = "FORMPROBE_DRIVER_URL")]
    driver_url: Option<String>,

    /// Override the page under test
    #[arg(long)]
    url: Option<String>,

    /// Load the suite from a YAML file instead of the built-in registration suite
    #[arg(short, long)]
    suite: Option<PathBuf>,

    /// Browser name requested from the driver
    #[arg(long, default_value = "chrome")]
    browser: String,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// How to wait for the page after navigation and submits
    #[arg(long, value_enum, default_value = "poll")]
    wait: WaitMode,

    /// Polling timeout in milliseconds
    #[arg(long, default_value = "5000")]
    wait_timeout_ms: u64,

    /// Polling interval in milliseconds
    #[arg(long, default_value = "100")]
    poll_interval_ms: u64,

    /// Fixed pause after navigation and submits, in milliseconds
    #[arg(long, default_value = "2000")]
    settle_ms: u64,

    /// Fixed pause before reading an alert, in milliseconds
    #[arg(long, default_value = "1000")]
    alert_delay_ms: u64,

    /// Pause after each negative case, in milliseconds
    #[arg(long, default_value = "2000")]
    case_delay_ms: u64,

    /// Write a JSON report to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn runner_config(&self) -> RunnerConfig {
        let case_delay = Duration::from_millis(self.case_delay_ms);
        match self.wait {
            WaitMode::Fixed => RunnerConfig {
                settle: WaitPolicy::fixed(Duration::from_millis(self.settle_ms)),
                alert_wait: WaitPolicy::fixed(Duration::from_millis(self.alert_delay_ms)),
                case_delay,
            },
            WaitMode::Poll => {
                let poll = WaitPolicy::Poll {
                    timeout: Duration::from_millis(self.wait_timeout_ms),
                    interval: Duration::from_millis(self.poll_interval_ms),
                };
                RunnerConfig {
                    settle: poll,
                    alert_wait: poll,
                    case_delay,
                }
            }
        }
    }

    fn suite(&self) -> anyhow::Result<FormSuite> {
        let mut suite = match &self.suite {
            Some(path) => FormSuite::from_file(path)
                .with_context(|| format!("loading suite {}", path.display()))?,
            None => FormSuite::registration(),
        };
        if let Some(url) = &self.url {
            suite.url = url.clone();
        }
        Ok(suite)
    }
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let result = tokio::runtime::Runtime::new()
        .context("creating tokio runtime")
        .and_then(|rt| rt.block_on(async_main(args)));

    if let Err(e) = &result {
        error!("Fatal: {:#}", e);
    }
    std::process::exit(exit_code(&result));
}

/// 0 when every check passed, 1 when any failed, 2 when the run broke down
fn exit_code(result: &anyhow::Result<bool>) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

async fn async_main(args: Args) -> anyhow::Result<bool> {
    let runner = SuiteRunner::new(args.suite()?, args.runner_config())?;

    // Dropping the service stops the driver, on every path out of here
    let mut service = None;
    let endpoint = match &args.driver_url {
        Some(url) => url.clone(),
        None => {
            let spawned = DriverService::spawn(DriverConfig {
                binary_path: args.driver.clone(),
                port: if args.port == 0 { None } else { Some(args.port) },
                ..Default::default()
            })
            .await
            .context("starting WebDriver")?;
            service.insert(spawned).endpoint().to_string()
        }
    };

    let capabilities = Capabilities {
        browser_name: args.browser.clone(),
        headless: args.headless,
        ..Default::default()
    };
    let session = WebDriverSession::connect(&endpoint, &capabilities)
        .await
        .context("connecting to WebDriver")?;

    let report = runner.run_and_quit(&session).await;

    if let Some(mut service) = service.take() {
        service.shutdown().await?;
    }

    let report = report.context("running suite")?;

    if let Some(path) = &args.output {
        report.write_json(path)?;
    }

    if report.all_passed() {
        info!("All {} checks passed", report.total);
    }
    Ok(report.all_passed())
}
