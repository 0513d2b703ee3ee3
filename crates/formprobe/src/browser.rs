//! Browser capability interface
//!
//! The runner only needs a handful of primitives from an automation backend:
//! element lookup, value injection, clicks and native alert handling. Anything
//! that provides them can drive a suite, which is how the tests run against an
//! in-memory page instead of a real browser.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProbeResult;

/// How an element is addressed on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Name(String),
    Id(String),
    XPath(String),
}

impl Locator {
    /// XPath for a button identified by its visible label
    pub fn button_labelled(label: &str) -> Self {
        Locator::XPath(format!("//button[text()='{}']", label))
    }

    /// W3C `using` strategy and value for this locator
    pub fn to_w3c(&self) -> (&'static str, String) {
        match self {
            Locator::Name(name) => ("css selector", format!("[name=\"{}\"]", css_escape(name))),
            Locator::Id(id) => ("css selector", format!("[id=\"{}\"]", css_escape(id))),
            Locator::XPath(path) => ("xpath", path.clone()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Name(name) => write!(f, "name={}", name),
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::XPath(path) => write!(f, "xpath={}", path),
        }
    }
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Which attribute form inputs are looked up by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocateBy {
    #[default]
    Name,
    Id,
}

impl LocateBy {
    pub fn locator(&self, field: &str) -> Locator {
        match self {
            LocateBy::Name => Locator::Name(field.to_string()),
            LocateBy::Id => Locator::Id(field.to_string()),
        }
    }
}

/// Opaque reference to an element found in the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

/// The automation primitives a suite needs
#[async_trait]
pub trait Browser: Send + Sync {
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Fails with `ProbeError::ElementNotFound` when nothing matches.
    async fn find_element(&self, locator: &Locator) -> ProbeResult<ElementRef>;

    async fn clear(&self, element: &ElementRef) -> ProbeResult<()>;

    async fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()>;

    async fn click(&self, element: &ElementRef) -> ProbeResult<()>;

    /// Text of the open alert, `ProbeError::NoAlert` when none is open.
    async fn alert_text(&self) -> ProbeResult<String>;

    async fn accept_alert(&self) -> ProbeResult<()>;

    /// End the session. Backends without a session to close keep the default.
    async fn quit(&self) -> ProbeResult<()> {
        Ok(())
    }
}
