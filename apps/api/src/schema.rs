//! Resume Schema — validation and normalization of arbitrary structured
//! values into [`ResumeDocument`].
//!
//! This is the single rule set for both directions of the pipeline:
//! data returned by the remote parsing service is normalized through
//! [`validate_resume`] before it enters editor state, and editor state
//! passes through the same function immediately before it is persisted.
//! Every violation is collected and reported together; the validator
//! never stops at the first problem.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::resume::{
    EducationEntry, ExperienceEntry, ResumeDocument, YearRange,
};

/// Floor for year bounds, matching the form's validation rules.
pub const MIN_YEAR: i64 = 1900;

/// One violated field, addressed by its path (`experience[0].company`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub reason: String,
}

/// Structured, multi-violation validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("resume failed validation with {} violation(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// True when `path` appears among the violations.
    pub fn mentions(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

#[derive(Default)]
struct Collector {
    violations: Vec<Violation>,
}

impl Collector {
    fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(Violation {
            path: path.into(),
            reason: reason.into(),
        });
    }
}

/// Validates and normalizes an arbitrary JSON value into a
/// [`ResumeDocument`], or fails with every violated field path.
///
/// Normalization beyond type checking: missing `summary`/`suggestion`
/// default to the empty string, missing `experience`/`education`/`skills`
/// default to empty sequences. Year ranges only enforce the 1900 floor;
/// `end < start` is deliberately permitted.
pub fn validate_resume(value: &Value) -> Result<ResumeDocument, ValidationError> {
    let mut c = Collector::default();

    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            c.push("", format!("expected an object, got {}", type_name(value)));
            return Err(ValidationError {
                violations: c.violations,
            });
        }
    };

    let id = required_string(obj.get("id"), "id", &mut c);
    let title = required_string(obj.get("title"), "title", &mut c);
    let name = required_string(obj.get("name"), "name", &mut c);
    let summary = optional_string(obj.get("summary"), "summary", &mut c);
    let suggestion = optional_string(obj.get("suggestion"), "suggestion", &mut c);

    let experience =
        entry_array(obj.get("experience"), "experience", &mut c, experience_entry);
    let education =
        entry_array(obj.get("education"), "education", &mut c, education_entry);
    let skills = skill_list(obj.get("skills"), &mut c);

    let (created_at, created_parsed) =
        required_timestamp(obj.get("createdAt"), "createdAt", &mut c);
    let (updated_at, updated_parsed) =
        required_timestamp(obj.get("updatedAt"), "updatedAt", &mut c);

    if let (Some(created), Some(updated)) = (created_parsed, updated_parsed) {
        if updated < created {
            c.push("updatedAt", "must not be earlier than createdAt");
        }
    }

    if !c.violations.is_empty() {
        return Err(ValidationError {
            violations: c.violations,
        });
    }

    Ok(ResumeDocument {
        id,
        title,
        name,
        summary,
        experience,
        education,
        skills,
        suggestion,
        created_at,
        updated_at,
    })
}

/// Parses an interchange timestamp. Accepts RFC 3339 and the naive
/// ISO-8601 form (no UTC offset) the original storage backend emits.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Required, non-empty string field.
fn required_string(v: Option<&Value>, path: &str, c: &mut Collector) -> String {
    match v {
        None | Some(Value::Null) => {
            c.push(path, "required field is missing");
            String::new()
        }
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                c.push(path, "must not be empty");
            }
            s.clone()
        }
        Some(other) => {
            c.push(path, format!("expected a string, got {}", type_name(other)));
            String::new()
        }
    }
}

/// Required string field that may legitimately be empty (descriptions).
fn required_text(v: Option<&Value>, path: &str, c: &mut Collector) -> String {
    match v {
        None | Some(Value::Null) => {
            c.push(path, "required field is missing");
            String::new()
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            c.push(path, format!("expected a string, got {}", type_name(other)));
            String::new()
        }
    }
}

/// Optional string field; absent or null normalizes to `""`.
fn optional_string(v: Option<&Value>, path: &str, c: &mut Collector) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            c.push(path, format!("expected a string, got {}", type_name(other)));
            String::new()
        }
    }
}

fn entry_array<T>(
    v: Option<&Value>,
    field: &str,
    c: &mut Collector,
    entry: fn(&Map<String, Value>, &str, &mut Collector) -> T,
) -> Vec<T>
where
    T: Default,
{
    match v {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let path = format!("{field}[{i}]");
                match item.as_object() {
                    Some(obj) => entry(obj, &path, c),
                    None => {
                        c.push(&path, format!("expected an object, got {}", type_name(item)));
                        T::default()
                    }
                }
            })
            .collect(),
        Some(other) => {
            c.push(field, format!("expected an array, got {}", type_name(other)));
            Vec::new()
        }
    }
}

fn experience_entry(
    obj: &Map<String, Value>,
    path: &str,
    c: &mut Collector,
) -> ExperienceEntry {
    ExperienceEntry {
        company: required_string(obj.get("company"), &format!("{path}.company"), c),
        role: required_string(obj.get("role"), &format!("{path}.role"), c),
        description: required_text(obj.get("description"), &format!("{path}.description"), c),
        year: year_range(obj.get("year"), &format!("{path}.year"), c),
    }
}

fn education_entry(
    obj: &Map<String, Value>,
    path: &str,
    c: &mut Collector,
) -> EducationEntry {
    EducationEntry {
        degree: required_string(obj.get("degree"), &format!("{path}.degree"), c),
        field: required_string(obj.get("field"), &format!("{path}.field"), c),
        year: year_range(obj.get("year"), &format!("{path}.year"), c),
    }
}

fn year_range(v: Option<&Value>, path: &str, c: &mut Collector) -> YearRange {
    match v {
        None | Some(Value::Null) => {
            c.push(path, "required field is missing");
            YearRange { start: 0, end: 0 }
        }
        Some(Value::Object(obj)) => YearRange {
            start: year_bound(obj.get("start"), &format!("{path}.start"), c),
            end: year_bound(obj.get("end"), &format!("{path}.end"), c),
        },
        Some(other) => {
            c.push(path, format!("expected an object, got {}", type_name(other)));
            YearRange { start: 0, end: 0 }
        }
    }
}

fn year_bound(v: Option<&Value>, path: &str, c: &mut Collector) -> i32 {
    match v {
        None | Some(Value::Null) => {
            c.push(path, "required field is missing");
            0
        }
        Some(Value::Number(n)) => match n.as_i64() {
            Some(year) if (MIN_YEAR..=i32::MAX as i64).contains(&year) => year as i32,
            Some(year) => {
                c.push(path, format!("must be a year of at least {MIN_YEAR}"));
                year.clamp(0, i32::MAX as i64) as i32
            }
            None => {
                c.push(path, "expected an integer year");
                0
            }
        },
        Some(other) => {
            c.push(path, format!("expected a number, got {}", type_name(other)));
            0
        }
    }
}

fn skill_list(v: Option<&Value>, c: &mut Collector) -> Vec<String> {
    match v {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut skills: Vec<String> = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) => {
                        if skills.iter().any(|seen| seen == s) {
                            c.push(format!("skills[{i}]"), format!("duplicate skill \"{s}\""));
                        } else {
                            skills.push(s.clone());
                        }
                    }
                    other => c.push(
                        format!("skills[{i}]"),
                        format!("expected a string, got {}", type_name(other)),
                    ),
                }
            }
            skills
        }
        Some(other) => {
            c.push("skills", format!("expected an array, got {}", type_name(other)));
            Vec::new()
        }
    }
}

fn required_timestamp(
    v: Option<&Value>,
    path: &str,
    c: &mut Collector,
) -> (String, Option<DateTime<Utc>>) {
    match v {
        None | Some(Value::Null) => {
            c.push(path, "required field is missing");
            (String::new(), None)
        }
        Some(Value::String(s)) => match parse_timestamp(s) {
            Some(parsed) => (s.clone(), Some(parsed)),
            None => {
                c.push(path, format!("\"{s}\" is not a parseable date-time"));
                (s.clone(), None)
            }
        },
        Some(other) => {
            c.push(path, format!("expected a string, got {}", type_name(other)));
            (String::new(), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_value() -> Value {
        json!({
            "id": "r-1",
            "title": "Backend Engineer",
            "name": "Alice Smith",
            "summary": "Builds services.",
            "experience": [{
                "company": "Acme",
                "role": "Dev",
                "description": "Shipped things",
                "year": {"start": 2020, "end": 2022}
            }],
            "education": [{
                "degree": "BSc",
                "field": "CS",
                "year": {"start": 2015, "end": 2019}
            }],
            "skills": ["Rust", "SQL"],
            "suggestion": "",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-06-01T00:00:00.000Z"
        })
    }

    #[test]
    fn test_valid_document_passes() {
        let doc = validate_resume(&valid_value()).unwrap();
        assert_eq!(doc.name, "Alice Smith");
        assert_eq!(doc.experience.len(), 1);
        assert_eq!(doc.skills, vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_round_trip_through_serialization() {
        let doc = validate_resume(&valid_value()).unwrap();
        let serialized = serde_json::to_value(&doc).unwrap();
        let revalidated = validate_resume(&serialized).unwrap();
        assert_eq!(doc, revalidated);
    }

    #[test]
    fn test_empty_title_is_the_only_violation() {
        let mut value = valid_value();
        value["title"] = json!("");
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].path, "title");
    }

    #[test]
    fn test_missing_optionals_normalize_to_defaults() {
        let value = json!({
            "id": "r-2",
            "title": "t",
            "name": "Bob",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });
        let doc = validate_resume(&value).unwrap();
        assert_eq!(doc.summary, "");
        assert_eq!(doc.suggestion, "");
        assert!(doc.experience.is_empty());
        assert!(doc.education.is_empty());
        assert!(doc.skills.is_empty());
    }

    #[test]
    fn test_all_violations_collected_together() {
        let value = json!({
            "id": "r-3",
            "title": "",
            "skills": "Rust",
            "createdAt": "yesterday",
            "updatedAt": "2024-01-01T00:00:00Z"
        });
        let err = validate_resume(&value).unwrap_err();
        assert!(err.mentions("title"));
        assert!(err.mentions("name"));
        assert!(err.mentions("skills"));
        assert!(err.mentions("createdAt"));
        assert_eq!(err.violations.len(), 4);
    }

    #[test]
    fn test_end_before_start_is_permitted() {
        let mut value = valid_value();
        value["experience"][0]["year"] = json!({"start": 2020, "end": 2019});
        let doc = validate_resume(&value).unwrap();
        assert_eq!(doc.experience[0].year.start, 2020);
        assert_eq!(doc.experience[0].year.end, 2019);
    }

    #[test]
    fn test_year_below_floor_rejected_with_path() {
        let mut value = valid_value();
        value["experience"][0]["year"]["start"] = json!(1776);
        let err = validate_resume(&value).unwrap_err();
        assert!(err.mentions("experience[0].year.start"));
        assert_eq!(err.violations.len(), 1);
    }

    #[test]
    fn test_null_end_year_is_a_violation() {
        let mut value = valid_value();
        value["experience"][0]["year"]["end"] = json!(null);
        let err = validate_resume(&value).unwrap_err();
        assert!(err.mentions("experience[0].year.end"));
    }

    #[test]
    fn test_missing_entry_fields_addressed_by_path() {
        let mut value = valid_value();
        value["education"][0] = json!({"degree": "BSc"});
        let err = validate_resume(&value).unwrap_err();
        assert!(err.mentions("education[0].field"));
        assert!(err.mentions("education[0].year"));
    }

    #[test]
    fn test_duplicate_skills_rejected() {
        let mut value = valid_value();
        value["skills"] = json!(["Rust", "SQL", "Rust"]);
        let err = validate_resume(&value).unwrap_err();
        assert!(err.mentions("skills[2]"));
        assert!(err.violations[0].reason.contains("duplicate"));
    }

    #[test]
    fn test_naive_iso_timestamp_accepted() {
        // The original storage backend writes naive ISO-8601 without an offset.
        let mut value = valid_value();
        value["createdAt"] = json!("2024-01-05T12:30:00.123456");
        value["updatedAt"] = json!("2024-01-06T08:00:00.000001");
        assert!(validate_resume(&value).is_ok());
    }

    #[test]
    fn test_unparseable_timestamp_rejected() {
        let mut value = valid_value();
        value["updatedAt"] = json!("last tuesday");
        let err = validate_resume(&value).unwrap_err();
        assert!(err.mentions("updatedAt"));
    }

    #[test]
    fn test_updated_before_created_rejected() {
        let mut value = valid_value();
        value["createdAt"] = json!("2024-06-01T00:00:00Z");
        value["updatedAt"] = json!("2024-01-01T00:00:00Z");
        let err = validate_resume(&value).unwrap_err();
        assert!(err.mentions("updatedAt"));
    }

    #[test]
    fn test_non_object_input_rejected() {
        let err = validate_resume(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(err.violations[0].reason.contains("array"));
    }

    #[test]
    fn test_wrong_type_name_rejected() {
        let mut value = valid_value();
        value["name"] = json!(42);
        let err = validate_resume(&value).unwrap_err();
        assert!(err.mentions("name"));
        assert!(err.violations[0].reason.contains("number"));
    }
}
