//! Request validation for survey submissions.
//!
//! The survey form posts a flat map with hyphenated keys (`family-size`).
//! [`FIELDS`] is the single place that maps those wire names to the names
//! used in storage and error messages.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::submission::{AgeRange, Gender, NewSubmission, Region, RequestContext};

/// Maximum length of the free-text notes field, in characters.
pub const MAX_NOTES_LEN: usize = 1000;

const FAMILY_SIZE_RANGE: (i64, i64) = (1, 20);
const ATTITUDE_RANGE: (f64, f64) = (0.1, 0.7);
const EDUCATION_RANGE: (f64, f64) = (1.0, 20.0);

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    // ASCII word characters only
    Regex::new(r"(?-u)^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("invalid email regex")
});

/// Naming of one submission field across the wire, document and relational forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key in the submitted form (`family-size`)
    pub wire: &'static str,
    /// Document/JSON key (`familySize`)
    pub camel: &'static str,
    /// Relational column (`family_size`)
    pub snake: &'static str,
    pub required: bool,
}

const fn field(wire: &'static str, camel: &'static str, snake: &'static str, required: bool) -> FieldSpec {
    FieldSpec {
        wire,
        camel,
        snake,
        required,
    }
}

pub const REGION: FieldSpec = field("region", "region", "region", true);
pub const FAMILY_SIZE: FieldSpec = field("family-size", "familySize", "family_size", true);
pub const FIRSTBORN_GENDER: FieldSpec =
    field("firstborn-gender", "firstbornGender", "firstborn_gender", true);
pub const ATTITUDE_SCORE: FieldSpec =
    field("attitude-score", "attitudeScore", "attitude_score", true);
pub const FIRSTBORN_EDUCATION: FieldSpec =
    field("firstborn-education", "firstbornEducation", "firstborn_education", true);
pub const LATERBORN_EDUCATION: FieldSpec =
    field("laterborn-education", "laterbornEducation", "laterborn_education", true);
pub const AGE_RANGE: FieldSpec = field("age-range", "ageRange", "age_range", true);
pub const NOTES: FieldSpec = field("notes", "notes", "notes", false);
pub const CONTACT_EMAIL: FieldSpec = field("contact-email", "contactEmail", "contact_email", false);

/// Every user-supplied field, required ones first, in form order.
pub const FIELDS: [FieldSpec; 9] = [
    REGION,
    FAMILY_SIZE,
    FIRSTBORN_GENDER,
    ATTITUDE_SCORE,
    FIRSTBORN_EDUCATION,
    LATERBORN_EDUCATION,
    AGE_RANGE,
    NOTES,
    CONTACT_EMAIL,
];

/// Wire names of the required fields, in the order they are reported.
pub fn required_fields() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().filter(|f| f.required).map(|f| f.wire)
}

/// Validate a raw submitted map and build a [`NewSubmission`].
///
/// Missing fields are reported together before any value is parsed. Parse and
/// constraint failures are then collected so the caller sees every problem at
/// once.
pub fn validate(
    input: &Map<String, Value>,
    context: RequestContext,
) -> Result<NewSubmission, ValidationError> {
    let missing: Vec<&'static str> = required_fields()
        .filter(|name| input.get(*name).map_or(true, is_falsy))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::Missing { fields: missing });
    }

    let mut violations = Vec::new();

    let region = parse_enum::<Region>(input, REGION, &mut violations);
    let family_size = parse_integer(input, FAMILY_SIZE, FAMILY_SIZE_RANGE, &mut violations);
    let firstborn_gender = parse_enum::<Gender>(input, FIRSTBORN_GENDER, &mut violations);
    let attitude_score = parse_float(input, ATTITUDE_SCORE, ATTITUDE_RANGE, &mut violations);
    let firstborn_education =
        parse_float(input, FIRSTBORN_EDUCATION, EDUCATION_RANGE, &mut violations);
    let laterborn_education =
        parse_float(input, LATERBORN_EDUCATION, EDUCATION_RANGE, &mut violations);
    let age_range = parse_enum::<AgeRange>(input, AGE_RANGE, &mut violations);

    let notes = optional_text(input, NOTES, &mut violations);
    if notes.chars().count() > MAX_NOTES_LEN {
        violations.push(format!(
            "{} exceeds maximum length of {} characters",
            NOTES.camel, MAX_NOTES_LEN
        ));
    }

    let contact_email = optional_text(input, CONTACT_EMAIL, &mut violations);
    if !contact_email.is_empty() && !EMAIL_RE.is_match(&contact_email) {
        violations.push("Please enter a valid email".to_string());
    }

    match (
        region,
        family_size,
        firstborn_gender,
        attitude_score,
        firstborn_education,
        laterborn_education,
        age_range,
    ) {
        (Some(region), Some(family_size), Some(gender), Some(attitude), Some(first), Some(later), Some(age))
            if violations.is_empty() =>
        {
            Ok(NewSubmission {
                region,
                // Range-checked above
                family_size: family_size as u8,
                firstborn_gender: gender,
                attitude_score: attitude,
                firstborn_education: first,
                laterborn_education: later,
                age_range: age,
                notes,
                contact_email,
                ip_address: context.ip_address,
                user_agent: context.user_agent,
            })
        }
        _ => Err(ValidationError::Invalid { violations }),
    }
}

/// Form-style truthiness: absent, null, `false`, `""` and `0` count as missing.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Scalar values as text; arrays and objects have no text form.
fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_enum<T>(input: &Map<String, Value>, spec: FieldSpec, violations: &mut Vec<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = input.get(spec.wire).and_then(as_text);
    match raw.as_deref().map(str::parse::<T>) {
        Some(Ok(value)) => Some(value),
        _ => {
            violations.push(format!(
                "`{}` is not a valid enum value for {}",
                raw.as_deref().unwrap_or_default(),
                spec.camel
            ));
            None
        }
    }
}

/// `3.0` counts as an integer, `3.5` does not.
fn whole(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

fn parse_integer(
    input: &Map<String, Value>,
    spec: FieldSpec,
    (min, max): (i64, i64),
    violations: &mut Vec<String>,
) -> Option<i64> {
    let value = input.get(spec.wire);
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Some(other) => as_text(other).and_then(|s| s.trim().parse::<f64>().ok().and_then(whole)),
        None => None,
    };

    let Some(number) = parsed else {
        violations.push(format!("{} must be an integer", spec.camel));
        return None;
    };

    if number < min || number > max {
        violations.push(format!(
            "{} must be between {} and {} (got {})",
            spec.camel, min, max, number
        ));
        return None;
    }
    Some(number)
}

fn parse_float(
    input: &Map<String, Value>,
    spec: FieldSpec,
    (min, max): (f64, f64),
    violations: &mut Vec<String>,
) -> Option<f64> {
    let parsed = input
        .get(spec.wire)
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            other => as_text(other).and_then(|s| s.trim().parse::<f64>().ok()),
        })
        .filter(|f| f.is_finite());

    let Some(number) = parsed else {
        violations.push(format!("{} must be a number", spec.camel));
        return None;
    };

    if number < min || number > max {
        violations.push(format!(
            "{} must be between {} and {} (got {})",
            spec.camel, min, max, number
        ));
        return None;
    }
    Some(number)
}

fn optional_text(input: &Map<String, Value>, spec: FieldSpec, violations: &mut Vec<String>) -> String {
    match input.get(spec.wire) {
        None | Some(Value::Null) => String::new(),
        Some(value) => match as_text(value) {
            Some(text) => text.into_owned(),
            None => {
                violations.push(format!("{} must be a string", spec.camel));
                String::new()
            }
        },
    }
}
