use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The canonical resume record. This is the shape the schema validator
/// produces, the editor mutates, and the remote service persists.
///
/// Wire names are camelCase to match the interchange format
/// (`createdAt`/`updatedAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub id: String,
    pub title: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub suggestion: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    pub year: YearRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub field: String,
    pub year: YearRange,
}

/// Start/end years of an experience or education entry.
/// `end >= start` is intentionally NOT required; the schema only
/// enforces the 1900 floor on each bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl ResumeDocument {
    /// A fresh, empty document with a generated id and current timestamps.
    pub fn blank(title: &str) -> Self {
        let now = now_timestamp();
        ResumeDocument {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            name: String::new(),
            summary: String::new(),
            experience: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            suggestion: String::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Adds a skill, preserving insertion order. Rejects an exact
    /// (case-sensitive) duplicate without mutating the collection.
    pub fn add_skill(&mut self, skill: &str) -> Result<(), DuplicateSkill> {
        let skill = skill.trim();
        if self.skills.iter().any(|s| s == skill) {
            return Err(DuplicateSkill(skill.to_string()));
        }
        self.skills.push(skill.to_string());
        Ok(())
    }

    /// Removes the skill at `index`, returning it, or `None` when the
    /// index is out of range.
    pub fn remove_skill(&mut self, index: usize) -> Option<String> {
        if index < self.skills.len() {
            Some(self.skills.remove(index))
        } else {
            None
        }
    }
}

/// Rejected duplicate at the skill mutation boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("skill \"{0}\" already exists")]
pub struct DuplicateSkill(pub String);

/// Dashboard projection of a stored document: just enough to render a
/// list card without shipping the full record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummary {
    pub id: String,
    pub title: String,
    pub name: String,
    pub updated_at: String,
    pub experience_count: usize,
    pub education_count: usize,
    pub skill_count: usize,
}

impl From<&ResumeDocument> for ResumeSummary {
    fn from(doc: &ResumeDocument) -> Self {
        ResumeSummary {
            id: doc.id.clone(),
            title: doc.title.clone(),
            name: doc.name.clone(),
            updated_at: doc.updated_at.clone(),
            experience_count: doc.experience.len(),
            education_count: doc.education.len(),
            skill_count: doc.skills.len(),
        }
    }
}

/// Current time in the interchange timestamp format (RFC 3339,
/// millisecond precision, UTC).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
