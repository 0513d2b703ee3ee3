//! Filling the form and reading back what the page says about it

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::browser::{Browser, Locator};
use crate::error::{ProbeError, ProbeResult};
use crate::suite::{FieldDataset, FormSuite};
use crate::wait::WaitPolicy;

/// Clear and type every field of `data`, then click submit.
///
/// Stops at the first element that can't be found, before anything is
/// submitted. `settle` runs after the click so the page has time to answer.
pub async fn fill_form<B: Browser + ?Sized>(
    browser: &B,
    suite: &FormSuite,
    data: &FieldDataset,
    settle: &WaitPolicy,
) -> ProbeResult<()> {
    populate_fields(browser, suite, data).await?;
    submit(browser, suite, settle).await
}

/// Clear and type every field of `data`
pub async fn populate_fields<B: Browser + ?Sized>(
    browser: &B,
    suite: &FormSuite,
    data: &FieldDataset,
) -> ProbeResult<()> {
    for (name, value) in data.iter() {
        let field = browser
            .find_element(&suite.locate_by.locator(name))
            .await
            .map_err(|e| match e {
                ProbeError::ElementNotFound(_) => {
                    ProbeError::ElementNotFound(format!("could not find field {}", name))
                }
                other => other,
            })?;
        browser.clear(&field).await?;
        browser.send_keys(&field, value).await?;
        debug!("Filled {}", name);
    }
    Ok(())
}

/// Click the submit button, then let the page settle
pub async fn submit<B: Browser + ?Sized>(
    browser: &B,
    suite: &FormSuite,
    settle: &WaitPolicy,
) -> ProbeResult<()> {
    let button = browser
        .find_element(&Locator::button_labelled(&suite.submit_label))
        .await
        .map_err(|e| match e {
            ProbeError::ElementNotFound(_) => ProbeError::ElementNotFound(format!(
                "could not find submit button '{}'",
                suite.submit_label
            )),
            other => other,
        })?;
    browser.click(&button).await?;

    settle.settle().await;
    Ok(())
}

/// Wait for an alert, read it and dismiss it
pub async fn read_alert<B: Browser + ?Sized>(browser: &B, wait: &WaitPolicy) -> ProbeResult<String> {
    let text = wait
        .until("alert", |e| matches!(e, ProbeError::NoAlert), || browser.alert_text())
        .await?;

    if let Err(e) = browser.accept_alert().await {
        warn!("Could not dismiss alert: {}", e);
    }
    Ok(text)
}

/// What an alert check saw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCheck {
    pub expected: String,
    pub observed: Option<String>,
    pub passed: bool,
    pub error: Option<String>,
}

/// Read the alert and compare it with `expected`, exactly.
pub async fn check_alert<B: Browser + ?Sized>(
    browser: &B,
    expected: &str,
    wait: &WaitPolicy,
) -> AlertCheck {
    match read_alert(browser, wait).await {
        Ok(observed) => AlertCheck {
            expected: expected.to_string(),
            passed: observed == expected,
            observed: Some(observed),
            error: None,
        },
        Err(e) => AlertCheck {
            expected: expected.to_string(),
            observed: None,
            passed: false,
            error: Some(e.to_string()),
        },
    }
}

/// Confirm the success alert after a valid submission, logging the verdict
pub async fn confirm_success<B: Browser + ?Sized>(
    browser: &B,
    expected: &str,
    wait: &WaitPolicy,
) -> AlertCheck {
    let check = check_alert(browser, expected, wait).await;
    match (&check.observed, check.passed) {
        (None, _) => error!("Test Failed: Success alert not found."),
        (Some(_), true) => info!("Test Passed: {}", check.expected),
        (Some(observed), false) => error!(
            "Test Failed: Unexpected success alert message. Expected: {}, Got: {}",
            check.expected, observed
        ),
    }
    check
}

/// Whether the success alert showed up with the expected text
pub async fn verify_success<B: Browser + ?Sized>(
    browser: &B,
    expected: &str,
    wait: &WaitPolicy,
) -> bool {
    confirm_success(browser, expected, wait).await.passed
}
