//! Suite runner: the success path, then every negative case in order

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser::Browser;
use crate::error::ProbeResult;
use crate::form::{check_alert, confirm_success, fill_form, populate_fields, submit, AlertCheck};
use crate::suite::{FormSuite, NegativeCase};
use crate::wait::WaitPolicy;

/// How far a case got before it finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStage {
    Start,
    FieldsPopulated,
    Submitted,
    AlertObserved,
}

/// Result of running a single check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    pub field: Option<String>,
    pub input: Option<String>,
    pub passed: bool,
    pub stage: CaseStage,
    pub expected: String,
    pub observed: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Result of running a whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub success: CaseResult,
    pub cases: Vec<CaseResult>,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn write_json(&self, path: &Path) -> ProbeResult<PathBuf> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path.to_path_buf())
    }
}

/// Waits and pacing for a run
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Applied after navigation and after every submit
    pub settle: WaitPolicy,

    /// Governs reading the alert raised by a submit
    pub alert_wait: WaitPolicy,

    /// Pause after each negative case
    pub case_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            settle: WaitPolicy::default(),
            alert_wait: WaitPolicy::default(),
            case_delay: Duration::from_secs(2),
        }
    }
}

impl RunnerConfig {
    /// Blind sleeps with the delays the registration checks were tuned for
    pub fn fixed_delays() -> Self {
        Self {
            settle: WaitPolicy::fixed(Duration::from_secs(2)),
            alert_wait: WaitPolicy::fixed(Duration::from_secs(1)),
            case_delay: Duration::from_secs(2),
        }
    }
}

/// Runs a `FormSuite` against any `Browser`
pub struct SuiteRunner {
    suite: FormSuite,
    config: RunnerConfig,
}

impl SuiteRunner {
    /// Create a runner, rejecting suites whose cases target unknown fields
    pub fn new(suite: FormSuite, config: RunnerConfig) -> ProbeResult<Self> {
        suite.validate()?;
        Ok(Self { suite, config })
    }

    pub fn suite(&self) -> &FormSuite {
        &self.suite
    }

    /// Run the suite, then end the browser session whatever happened
    pub async fn run_and_quit<B: Browser + ?Sized>(&self, browser: &B) -> ProbeResult<SuiteReport> {
        let outcome = self.run(browser).await;
        if let Err(e) = browser.quit().await {
            warn!("Failed to end browser session: {}", e);
        }
        outcome
    }

    /// Run the suite.
    ///
    /// Navigation and the valid-data fill are fatal. Everything after that is
    /// recorded in the report and the run carries on.
    pub async fn run<B: Browser + ?Sized>(&self, browser: &B) -> ProbeResult<SuiteReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        browser.navigate(&self.suite.url).await?;
        self.config.settle.settle().await;

        let success = self.run_success(browser).await?;

        info!("Running {} negative case(s)...", self.suite.cases.len());

        let mut cases = Vec::with_capacity(self.suite.cases.len());
        for case in &self.suite.cases {
            cases.push(self.run_case(browser, case).await);
            sleep(self.config.case_delay).await;
        }

        let total = cases.len() + 1;
        let passed = cases.iter().filter(|c| c.passed).count() + usize::from(success.passed);
        let failed = total - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!("Test Results: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        Ok(SuiteReport {
            url: self.suite.url.clone(),
            started_at,
            total,
            passed,
            failed,
            duration_ms,
            success,
            cases,
        })
    }

    /// Submit the baseline dataset and confirm the success alert
    async fn run_success<B: Browser + ?Sized>(&self, browser: &B) -> ProbeResult<CaseResult> {
        let start = Instant::now();

        fill_form(browser, &self.suite, &self.suite.fields, &self.config.settle).await?;

        let check =
            confirm_success(browser, &self.suite.success_message, &self.config.alert_wait).await;

        let stage = if check.observed.is_some() {
            CaseStage::AlertObserved
        } else {
            CaseStage::Submitted
        };
        Ok(finish("valid-submission".to_string(), None, None, stage, check, start))
    }

    /// Run one negative case. Never fails the run: problems land in the result.
    pub async fn run_case<B: Browser + ?Sized>(&self, browser: &B, case: &NegativeCase) -> CaseResult {
        let start = Instant::now();
        let name = format!("invalid-{}", case.target_field);
        let field = Some(case.target_field.clone());
        let input = Some(case.invalid_value.clone());
        debug!("Running case {}", name);

        let aborted = |stage: CaseStage, reason: String| {
            error!("Test Failed: field '{}' - {}", case.target_field, reason);
            let check = AlertCheck {
                expected: case.expected_message.clone(),
                observed: None,
                passed: false,
                error: Some(reason),
            };
            finish(name.clone(), field.clone(), input.clone(), stage, check, start)
        };

        // every field goes back to baseline before the override
        let data = match self.suite.dataset_for(case) {
            Ok(data) => data,
            Err(e) => return aborted(CaseStage::Start, e.to_string()),
        };

        if let Err(e) = populate_fields(browser, &self.suite, &data).await {
            return aborted(CaseStage::Start, format!("Error filling fields: {}", e));
        }

        if let Err(e) = submit(browser, &self.suite, &self.config.settle).await {
            return aborted(CaseStage::FieldsPopulated, format!("Error submitting form: {}", e));
        }

        let check = check_alert(browser, &case.expected_message, &self.config.alert_wait).await;
        let stage = if check.observed.is_some() {
            CaseStage::AlertObserved
        } else {
            CaseStage::Submitted
        };

        match (&check.observed, check.passed) {
            (None, _) => error!(
                "Test Failed: No alert for field '{}'. Error: {}",
                case.target_field,
                check.error.as_deref().unwrap_or("unknown error")
            ),
            (Some(_), true) => info!("Test Passed: Correct alert for field '{}'.", case.target_field),
            (Some(observed), false) => error!(
                "Test Failed: Incorrect alert for field '{}'. Expected: {}, Got: {}",
                case.target_field, case.expected_message, observed
            ),
        }

        finish(name, field, input, stage, check, start)
    }
}

fn finish(
    name: String,
    field: Option<String>,
    input: Option<String>,
    stage: CaseStage,
    check: AlertCheck,
    start: Instant,
) -> CaseResult {
    CaseResult {
        name,
        field,
        input,
        passed: check.passed,
        stage,
        expected: check.expected,
        observed: check.observed,
        error: check.error,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, passed: bool) -> CaseResult {
        CaseResult {
            name: name.to_string(),
            field: None,
            input: None,
            passed,
            stage: CaseStage::AlertObserved,
            expected: "ok".to_string(),
            observed: Some("ok".to_string()),
            error: None,
            duration_ms: 1,
        }
    }

    #[test]
    fn test_fixed_delays_match_registration_pacing() {
        let config = RunnerConfig::fixed_delays();
        assert_eq!(config.settle, WaitPolicy::fixed(Duration::from_secs(2)));
        assert_eq!(config.alert_wait, WaitPolicy::fixed(Duration::from_secs(1)));
        assert_eq!(config.case_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_runner_rejects_invalid_suite() {
        let mut suite = FormSuite::registration();
        suite.cases.push(NegativeCase::new("email", "x", "Bad email."));
        assert!(SuiteRunner::new(suite, RunnerConfig::default()).is_err());
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let report = SuiteReport {
            url: "http://127.0.0.1/form".to_string(),
            started_at: Utc::now(),
            total: 2,
            passed: 1,
            failed: 1,
            duration_ms: 10,
            success: result("valid-submission", true),
            cases: vec![result("invalid-username", false)],
        };

        report.write_json(&path).unwrap();
        assert!(!report.all_passed());

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["failed"], 1);
        assert_eq!(written["cases"][0]["stage"], "alert_observed");
    }
}
