/**
 * Shared Types Module
 *
 * Defines the wire types exchanged with the server: the resume document model,
 * saved-resume records, and account payloads.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Personal identity block of a resume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub title: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    pub github: String,
    pub github_url: String,
}

/// One education entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub dates: String,
    pub subtitle: String,
    pub description: String,
}

/// One work-experience entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub dates: String,
    pub highlights: Vec<String>,
}

/// One project entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub year: String,
    pub highlights: Vec<String>,
}

/// Skills block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub languages: String,
    pub tools: String,
}

/// One leadership entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leadership {
    pub role: String,
    pub place: String,
    pub dates: String,
    pub highlights: Vec<String>,
}

/// Per-section visibility toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFlags {
    pub show_education: bool,
    pub show_experiences: bool,
    pub show_projects: bool,
    pub show_skills: bool,
    pub show_leadership: bool,
    pub show_languages: bool,
}

impl Default for SectionFlags {
    fn default() -> Self {
        Self {
            show_education: true,
            show_experiences: true,
            show_projects: true,
            show_skills: true,
            show_leadership: true,
            show_languages: true,
        }
    }
}

/// The full in-progress resume document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeData {
    pub personal: PersonalInfo,
    pub education: Vec<Education>,
    pub experiences: Vec<Experience>,
    pub projects: Vec<Project>,
    pub skills: Skills,
    pub leadership: Vec<Leadership>,
    pub languages_spoken: String,
    pub flags: SectionFlags,
}

impl ResumeData {
    /// A fresh document: every field empty, every section visible
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the document holds anything worth rendering.
    ///
    /// True when any personal identity field is filled in, or when any visible
    /// section has at least one entry. An all-default document returns false,
    /// which suppresses preview renders during initial load.
    pub fn has_content(&self) -> bool {
        let personal = &self.personal;
        if !personal.name.is_empty() || !personal.title.is_empty() || !personal.email.is_empty() {
            return true;
        }
        let flags = &self.flags;
        (flags.show_education && !self.education.is_empty())
            || (flags.show_experiences && !self.experiences.is_empty())
            || (flags.show_projects && !self.projects.is_empty())
            || (flags.show_leadership && !self.leadership.is_empty())
            || (flags.show_skills
                && (!self.skills.languages.is_empty() || !self.skills.tools.is_empty()))
            || (flags.show_languages && !self.languages_spoken.is_empty())
    }
}

/// A server-stored resume record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedResume {
    pub id: i64,
    pub name: String,
    pub json_content: Option<ResumeData>,
    pub created_at: DateTime<Utc>,
}

/// Response shape of `GET /resumes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedResumeList {
    pub resumes: Vec<SavedResume>,
}

/// Account payload returned by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default)]
    pub is_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_has_no_content() {
        assert!(!ResumeData::empty().has_content());
    }

    #[test]
    fn test_empty_document_defaults() {
        let data = ResumeData::empty();
        assert_eq!(data.personal.name, "");
        assert!(data.education.is_empty());
        assert!(data.flags.show_education);
        assert!(data.flags.show_languages);
    }

    #[test]
    fn test_personal_name_counts_as_content() {
        let mut data = ResumeData::empty();
        data.personal.name = "Ada Lovelace".to_string();
        assert!(data.has_content());
    }

    #[test]
    fn test_section_entry_counts_as_content() {
        let mut data = ResumeData::empty();
        data.experiences.push(Experience {
            title: "Engineer".to_string(),
            ..Default::default()
        });
        assert!(data.has_content());
    }

    #[test]
    fn test_hidden_section_does_not_count() {
        let mut data = ResumeData::empty();
        data.flags.show_experiences = false;
        data.experiences.push(Experience::default());
        assert!(!data.has_content());
    }

    #[test]
    fn test_api_user_optional_flags_default_to_false() {
        let user: ApiUser =
            serde_json::from_str(r#"{"id": 7, "email": "a@b.c"}"#).expect("valid user json");
        assert!(!user.is_guest);
        assert!(!user.is_verified);
    }

    #[test]
    fn test_saved_resume_round_trip_preserves_content() {
        let mut data = ResumeData::empty();
        data.personal.name = "Ada".to_string();
        let saved = SavedResume {
            id: 3,
            name: "CV 2026".to_string(),
            json_content: Some(data.clone()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&saved).expect("serializable");
        let back: SavedResume = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back.json_content, Some(data));
        assert_eq!(back.name, "CV 2026");
    }
}
