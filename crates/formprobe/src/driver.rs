//! Driver process management - spawning and health checking chromedriver

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{ProbeError, ProbeResult};

/// How long a terminated driver gets before it is killed
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Handle to a running driver process
pub struct DriverService {
    child: Child,
    pub endpoint: String,
    pub port: u16,
}

impl DriverService {
    /// Spawn the driver binary and wait until it accepts sessions
    pub async fn spawn(config: DriverConfig) -> ProbeResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let endpoint = format!("http://127.0.0.1:{}", port);

        info!("Starting {} on port {}", config.binary_path.display(), port);

        let mut cmd = Command::new(&config.binary_path);
        cmd.arg(format!("--port={}", port))
            .args(&config.extra_args)
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            ProbeError::DriverStartup(format!(
                "Failed to spawn {}: {}",
                config.binary_path.display(),
                e
            ))
        })?;

        let mut handle = DriverService {
            child,
            endpoint: endpoint.clone(),
            port,
        };

        if let Err(e) = handle.wait_for_ready(config.startup_timeout).await {
            let _ = handle.shutdown().await;
            return Err(e);
        }

        info!("Driver is ready at {}", endpoint);
        Ok(handle)
    }

    /// Poll `/status` until the driver reports ready, or give up as soon as
    /// the process exits
    async fn wait_for_ready(&mut self, timeout_duration: Duration) -> ProbeResult<()> {
        let status_url = format!("{}/status", self.endpoint);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            if let Some(status) = self.child.try_wait()? {
                return Err(ProbeError::DriverStartup(format!(
                    "driver exited before becoming ready ({})",
                    status
                )));
            }

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                    Ok(body) if is_ready(&body) => return Ok(()),
                    Ok(body) => {
                        let message = body["value"]["message"].as_str().unwrap_or_default();
                        warn!("Driver not ready yet: {}", message);
                    }
                    Err(e) => warn!("Unreadable status response: {}", e),
                },
                Ok(resp) => {
                    warn!("Status check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for driver to start...");
                    }
                    // Connection refused is expected while the driver is starting
                    if !e.is_connect() {
                        warn!("Status check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(ProbeError::DriverHealthCheck(attempts))
    }

    /// Base URL for new sessions
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Stop the driver, taking its browsers down with it
    ///
    /// Sends SIGTERM, gives the driver a grace period to exit on its own,
    /// then kills it.
    pub async fn shutdown(&mut self) -> ProbeResult<()> {
        if self.has_exited() {
            return Ok(());
        }

        info!("Stopping driver (pid: {})", self.child.id());

        if self.terminate() {
            let start = std::time::Instant::now();
            while start.elapsed() < STOP_GRACE {
                if self.has_exited() {
                    return Ok(());
                }
                sleep(Duration::from_millis(50)).await;
            }
        }

        self.force_stop()
    }

    /// Blocking variant of [`shutdown`](Self::shutdown), for `Drop`
    fn stop(&mut self) -> ProbeResult<()> {
        if self.has_exited() {
            return Ok(());
        }

        if self.terminate() {
            std::thread::sleep(STOP_GRACE);
        }

        self.force_stop()
    }

    fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// Ask the driver to exit. Returns whether the signal was delivered.
    fn terminate(&self) -> bool {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            kill(pid, Signal::SIGTERM).is_ok()
        }

        #[cfg(not(unix))]
        {
            false
        }
    }

    fn force_stop(&mut self) -> ProbeResult<()> {
        // Force kill if still running
        let _ = self.child.kill();
        self.child.wait()?;
        Ok(())
    }
}

impl Drop for DriverService {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// `value.ready` of a W3C status response
fn is_ready(body: &Value) -> bool {
    body["value"]["ready"].as_bool().unwrap_or(false)
}

/// Configuration for spawning a driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Path to the driver executable
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Extra command-line arguments
    pub extra_args: Vec<String>,

    /// Timeout for driver startup
    pub startup_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("chromedriver"),
            port: Some(8080),
            extra_args: Vec::new(),
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Find a free port to use
fn find_free_port() -> ProbeResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
