//! Formprobe - WebDriver checks for registration forms
//!
//! This crate drives a browser through a form and checks the native alerts
//! the page raises:
//! - Spawns (or attaches to) a WebDriver endpoint such as `chromedriver`
//! - Submits a known-valid dataset and expects the success alert
//! - Re-submits with one field swapped for an invalid value per case and
//!   expects that case's validation message, compared exactly
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SuiteRunner                          │
//! │    ├── run(browser) -> SuiteReport                          │
//! │    │     ├── navigate(url)                       (fatal)    │
//! │    │     ├── fill_form(baseline) + success alert (fatal)    │
//! │    │     └── run_case(case) for each NegativeCase (reported)│
//! │    └── run_and_quit(browser)                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Browser (trait)                                            │
//! │    ├── WebDriverSession  (W3C JSON over HTTP)               │
//! │    └── test doubles                                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DriverService: chromedriver child process + /status poll   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod driver;
pub mod error;
pub mod form;
pub mod runner;
pub mod suite;
pub mod wait;
pub mod webdriver;

pub use browser::{Browser, ElementRef, LocateBy, Locator};
pub use error::{ProbeError, ProbeResult};
pub use runner::{RunnerConfig, SuiteReport, SuiteRunner};
pub use suite::{FieldDataset, FormSuite, NegativeCase};
pub use wait::WaitPolicy;
