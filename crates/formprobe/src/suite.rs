//! Form suites: the baseline dataset plus the negative cases run against it

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::browser::LocateBy;
use crate::error::{ProbeError, ProbeResult};

pub const REGISTRATION_URL: &str = "https://chulo-solutions.github.io/qa-internship/";
pub const SUCCESS_MESSAGE: &str = "Form submitted successfully!";
pub const SUBMIT_LABEL: &str = "Submit";

/// Field name to value. Iterates in key order.
///
/// Values are typed into the page as text, so YAML numbers and booleans
/// are accepted and kept in their plain decimal form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDataset(#[serde(deserialize_with = "text_values")] BTreeMap<String, String>);

/// A YAML scalar read as the text a user would type
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => s,
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Signed(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(String::from)
}

fn text_values<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let raw = BTreeMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}

impl FieldDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.0.insert(field.to_string(), value.to_string());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of this dataset with a single field replaced
    pub fn with_override(&self, field: &str, value: &str) -> ProbeResult<Self> {
        if !self.contains(field) {
            return Err(ProbeError::InvalidSuite(format!(
                "field '{}' is not part of the dataset",
                field
            )));
        }
        Ok(self.clone().with(field, value))
    }
}

/// One field swapped for an invalid value, and the alert it should raise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeCase {
    #[serde(rename = "field")]
    pub target_field: String,

    #[serde(rename = "input", deserialize_with = "text")]
    pub invalid_value: String,

    #[serde(rename = "expected")]
    pub expected_message: String,
}

impl NegativeCase {
    pub fn new(field: &str, input: &str, expected: &str) -> Self {
        Self {
            target_field: field.to_string(),
            invalid_value: input.to_string(),
            expected_message: expected.to_string(),
        }
    }
}

/// Everything a run needs to know about the form under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSuite {
    /// Page hosting the form
    #[serde(default = "default_url")]
    pub url: String,

    /// Known-valid values for every field
    pub fields: FieldDataset,

    /// Negative cases, run in declaration order
    #[serde(default)]
    pub cases: Vec<NegativeCase>,

    /// Visible text of the submit button
    #[serde(default = "default_submit_label")]
    pub submit_label: String,

    /// Alert raised after a valid submission
    #[serde(default = "default_success_message")]
    pub success_message: String,

    /// How inputs are addressed
    #[serde(default)]
    pub locate_by: LocateBy,
}

fn default_url() -> String {
    REGISTRATION_URL.to_string()
}

fn default_submit_label() -> String {
    SUBMIT_LABEL.to_string()
}

fn default_success_message() -> String {
    SUCCESS_MESSAGE.to_string()
}

impl FormSuite {
    /// The registration form suite
    pub fn registration() -> Self {
        let fields = FieldDataset::new()
            .with("username", "biraj123")
            .with("password", "Password1*")
            .with("creditCard", "4111666622227777")
            .with("telephone", "(123) 456-7890");

        let cases = vec![
            NegativeCase::new(
                "username",
                "user",
                "Username must be alphanumeric and between 5 to 15 characters.",
            ),
            NegativeCase::new(
                "password",
                "Password123",
                "Password must be at least 8 characters long and contain at least one uppercase letter, one lowercase letter, one number, and one special character.",
            ),
            NegativeCase::new(
                "creditCard",
                "1234567890123456",
                "Enter a valid credit card number.",
            ),
            NegativeCase::new(
                "telephone",
                "1234567890",
                "Telephone number must follow the format (XXX) XXX-XXXX.",
            ),
        ];

        Self {
            url: default_url(),
            fields,
            cases,
            submit_label: default_submit_label(),
            success_message: default_success_message(),
            locate_by: LocateBy::default(),
        }
    }

    /// Parse a suite from a YAML string and validate it
    pub fn from_yaml(yaml: &str) -> ProbeResult<Self> {
        let suite: Self = serde_yaml::from_str(yaml)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> ProbeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Every case must target a field of the baseline dataset
    pub fn validate(&self) -> ProbeResult<()> {
        if self.fields.is_empty() {
            return Err(ProbeError::InvalidSuite("suite has no fields".to_string()));
        }
        for (i, case) in self.cases.iter().enumerate() {
            if !self.fields.contains(&case.target_field) {
                return Err(ProbeError::InvalidSuite(format!(
                    "case {} targets unknown field '{}'",
                    i + 1,
                    case.target_field
                )));
            }
        }
        Ok(())
    }

    /// Baseline dataset with the case's invalid value swapped in
    pub fn dataset_for(&self, case: &NegativeCase) -> ProbeResult<FieldDataset> {
        self.fields.with_override(&case.target_field, &case.invalid_value)
    }
}

impl Default for FormSuite {
    fn default() -> Self {
        Self::registration()
    }
}
