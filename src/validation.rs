//! Declarative field rules for every write endpoint.
//!
//! Each entity declares its rules as static [`FieldRules`] tables. A
//! [`Validator`] runs them against the incoming values, normalizes what it
//! accepts (trimming, lowercased emails, parsed dates) and collects every
//! violation instead of stopping at the first invalid field.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Value must be present and non-empty. Fields without it are optional.
    Required(&'static str),
    Length {
        min: usize,
        max: usize,
        message: &'static str,
    },
    MinLength {
        min: usize,
        message: &'static str,
    },
    /// Valid address; the accepted value is lowercased.
    Email(&'static str),
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    Date(&'static str),
    /// At least one uppercase letter, one lowercase letter and one digit.
    StrongPassword(&'static str),
    Url(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    pub trim: bool,
    pub rules: &'static [Rule],
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .or_else(|| OffsetDateTime::parse(raw, &Rfc3339).ok().map(|dt| dt.date()))
}

fn is_strong_password(value: &str) -> bool {
    value.chars().any(|c| c.is_uppercase())
        && value.chars().any(|c| c.is_lowercase())
        && value.chars().any(|c| c.is_ascii_digit())
}

#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `field_rules` to `value` and returns the normalized value when every
    /// rule passes. Absent optional fields yield `None` without a violation.
    pub fn text(&mut self, field_rules: &FieldRules, value: Option<&str>) -> Option<String> {
        let value = value.map(|v| if field_rules.trim { v.trim() } else { v });
        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ => {
                if let Some(Rule::Required(message)) =
                    field_rules.rules.iter().find(|r| matches!(r, Rule::Required(_)))
                {
                    self.push(field_rules.field, *message);
                }
                return None;
            }
        };

        let mut accepted = value.to_string();
        for rule in field_rules.rules {
            let failure = match *rule {
                Rule::Required(_) => None,
                Rule::Length { min, max, message } => {
                    let len = accepted.chars().count();
                    (len < min || len > max).then_some(message)
                }
                Rule::MinLength { min, message } => {
                    (accepted.chars().count() < min).then_some(message)
                }
                Rule::Email(message) => {
                    if is_valid_email(&accepted) {
                        accepted = normalize_email(&accepted);
                        None
                    } else {
                        Some(message)
                    }
                }
                Rule::Date(message) => parse_date(&accepted).is_none().then_some(message),
                Rule::StrongPassword(message) => {
                    (!is_strong_password(&accepted)).then_some(message)
                }
                Rule::Url(message) => (!URL_RE.is_match(&accepted)).then_some(message),
            };
            if let Some(message) = failure {
                self.push(field_rules.field, message);
                return None;
            }
        }
        Some(accepted)
    }

    /// Like [`Validator::text`] but hands back the parsed calendar date.
    pub fn date(&mut self, field_rules: &FieldRules, value: Option<&str>) -> Option<Date> {
        self.text(field_rules, value).as_deref().and_then(parse_date)
    }

    /// True while no violation has been recorded.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.violations.push(FieldViolation::new(field, message));
    }

    /// Builds the validated value, or returns every violation collected.
    ///
    /// `build` sees the values returned by earlier checks; it only runs when
    /// no violation was recorded, so required values are all `Some` there.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, Vec<FieldViolation>> {
        if !self.is_empty() {
            return Err(self.violations);
        }
        build().ok_or(self.violations)
    }

    #[cfg(test)]
    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }
}

pub const FIRSTNAME: FieldRules = FieldRules {
    field: "firstname",
    trim: true,
    rules: &[
        Rule::Required("First name is required"),
        Rule::Length {
            min: 2,
            max: 50,
            message: "First name must be between 2 and 50 characters",
        },
    ],
};

pub const LASTNAME: FieldRules = FieldRules {
    field: "lastname",
    trim: true,
    rules: &[
        Rule::Required("Last name is required"),
        Rule::Length {
            min: 2,
            max: 50,
            message: "Last name must be between 2 and 50 characters",
        },
    ],
};

pub const EMAIL: FieldRules = FieldRules {
    field: "email",
    trim: true,
    rules: &[
        Rule::Required("Email is required"),
        Rule::Email("Please provide a valid email"),
    ],
};

pub const COMPLETION: FieldRules = FieldRules {
    field: "completion",
    trim: true,
    rules: &[
        Rule::Required("Completion date is required"),
        Rule::Date("Please provide a valid completion date"),
    ],
};
