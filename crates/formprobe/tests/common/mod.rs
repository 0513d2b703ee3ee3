//! In-memory registration page used as a `Browser` stand-in

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use regex::Regex;

use formprobe::error::{ProbeError, ProbeResult};
use formprobe::{Browser, ElementRef, Locator};

pub const SUCCESS: &str = "Form submitted successfully!";

const SUBMIT_ID: &str = "submit-button";

#[derive(Default)]
struct PageState {
    loaded: bool,
    values: BTreeMap<String, String>,
    alert: Option<String>,
    /// `alert_text` calls still to answer with "no such alert"
    pending_lag: usize,
    missing: HashSet<String>,
    submit_missing: bool,
    navigations: usize,
    submissions: usize,
    quit: bool,
}

/// A registration form that validates like the real page
pub struct SimulatedForm {
    state: Mutex<PageState>,
    fail_navigation: bool,
    /// Text appended to every validation message
    message_suffix: String,
    alert_lag: usize,
}

impl SimulatedForm {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PageState::default()),
            fail_navigation: false,
            message_suffix: String::new(),
            alert_lag: 0,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail_navigation: true,
            ..Self::new()
        }
    }

    /// The alert shows up only after `reads` unanswered `alert_text` calls
    pub fn with_alert_lag(mut self, reads: usize) -> Self {
        self.alert_lag = reads;
        self
    }

    pub fn with_message_suffix(mut self, suffix: &str) -> Self {
        self.message_suffix = suffix.to_string();
        self
    }

    pub fn remove_field(&self, name: &str) {
        self.state.lock().unwrap().missing.insert(name.to_string());
    }

    pub fn restore_field(&self, name: &str) {
        self.state.lock().unwrap().missing.remove(name);
    }

    pub fn remove_submit(&self) {
        self.state.lock().unwrap().submit_missing = true;
    }

    pub fn restore_submit(&self) {
        self.state.lock().unwrap().submit_missing = false;
    }

    /// Leave a value in a field as if an earlier run had been interrupted
    pub fn corrupt(&self, name: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .values
            .insert(name.to_string(), value.to_string());
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().values.get(name).cloned()
    }

    pub fn submissions(&self) -> usize {
        self.state.lock().unwrap().submissions
    }

    pub fn navigations(&self) -> usize {
        self.state.lock().unwrap().navigations
    }

    pub fn alert_open(&self) -> bool {
        self.state.lock().unwrap().alert.is_some()
    }

    pub fn quit_called(&self) -> bool {
        self.state.lock().unwrap().quit
    }

    fn validate(&self, values: &BTreeMap<String, String>) -> Option<String> {
        let get = |k: &str| values.get(k).map(String::as_str).unwrap_or("");

        let username = Regex::new(r"^[A-Za-z0-9]{5,15}$").unwrap();
        if !username.is_match(get("username")) {
            return Some("Username must be alphanumeric and between 5 to 15 characters.".into());
        }

        let password = get("password");
        let strong = password.len() >= 8
            && Regex::new(r"[A-Z]").unwrap().is_match(password)
            && Regex::new(r"[a-z]").unwrap().is_match(password)
            && Regex::new(r"[0-9]").unwrap().is_match(password)
            && Regex::new(r"[^A-Za-z0-9]").unwrap().is_match(password);
        if !strong {
            return Some("Password must be at least 8 characters long and contain at least one uppercase letter, one lowercase letter, one number, and one special character.".into());
        }

        let card = Regex::new(r"^(4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|3[47][0-9]{13})$").unwrap();
        if !card.is_match(get("creditCard")) {
            return Some("Enter a valid credit card number.".into());
        }

        let phone = Regex::new(r"^\([0-9]{3}\) [0-9]{3}-[0-9]{4}$").unwrap();
        if !phone.is_match(get("telephone")) {
            return Some("Telephone number must follow the format (XXX) XXX-XXXX.".into());
        }

        None
    }

    fn blocked_by_alert(state: &PageState) -> ProbeResult<()> {
        match &state.alert {
            Some(text) => Err(ProbeError::WebDriver {
                error: "unexpected alert open".into(),
                message: format!("unexpected alert open: {{Alert text : {}}}", text),
            }),
            None => Ok(()),
        }
    }
}

const FIELDS: [&str; 4] = ["username", "password", "creditCard", "telephone"];

#[async_trait]
impl Browser for SimulatedForm {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        if self.fail_navigation {
            return Err(ProbeError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        let mut state = self.state.lock().unwrap();
        state.loaded = true;
        state.navigations += 1;
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> ProbeResult<ElementRef> {
        let state = self.state.lock().unwrap();
        Self::blocked_by_alert(&state)?;
        if !state.loaded {
            return Err(ProbeError::ElementNotFound(locator.to_string()));
        }

        match locator {
            Locator::Name(name) | Locator::Id(name)
                if FIELDS.contains(&name.as_str()) && !state.missing.contains(name) =>
            {
                Ok(ElementRef(name.clone()))
            }
            Locator::XPath(path)
                if path == "//button[text()='Submit']" && !state.submit_missing =>
            {
                Ok(ElementRef(SUBMIT_ID.to_string()))
            }
            _ => Err(ProbeError::ElementNotFound(locator.to_string())),
        }
    }

    async fn clear(&self, element: &ElementRef) -> ProbeResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::blocked_by_alert(&state)?;
        state.values.insert(element.0.clone(), String::new());
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::blocked_by_alert(&state)?;
        state.values.entry(element.0.clone()).or_default().push_str(text);
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> ProbeResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::blocked_by_alert(&state)?;
        if element.0 != SUBMIT_ID {
            return Ok(());
        }

        state.submissions += 1;
        let message = match self.validate(&state.values) {
            Some(message) => format!("{}{}", message, self.message_suffix),
            None => SUCCESS.to_string(),
        };
        state.alert = Some(message);
        state.pending_lag = self.alert_lag;
        Ok(())
    }

    async fn alert_text(&self) -> ProbeResult<String> {
        let mut state = self.state.lock().unwrap();
        if state.pending_lag > 0 {
            state.pending_lag -= 1;
            return Err(ProbeError::NoAlert);
        }
        state.alert.clone().ok_or(ProbeError::NoAlert)
    }

    async fn accept_alert(&self) -> ProbeResult<()> {
        let mut state = self.state.lock().unwrap();
        state.alert.take().map(|_| ()).ok_or(ProbeError::NoAlert)
    }

    async fn quit(&self) -> ProbeResult<()> {
        self.state.lock().unwrap().quit = true;
        Ok(())
    }
}
