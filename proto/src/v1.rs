use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::OperationError;

macro_rules! platform_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }
    };
}

/* ===== chat platform identifiers ===== */
// Opaque to us, the chat platform decides the format.

platform_id!(
    /// A community space the bot is a member of.
    GuildId
);
platform_id!(UserId);
platform_id!(ChannelId);
platform_id!(RoleId);
platform_id!(MessageId);

/* ===== usos api types ===== */

/// USOS returns translatable strings as a language keyed dictionary.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct LangDict {
    #[serde(default)]
    pub pl: Option<String>,
    #[serde(default)]
    pub en: Option<String>,
}

impl LangDict {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pl.iter().chain(self.en.iter()).map(String::as_str)
    }
}

impl fmt::Display for LangDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.en, &self.pl) {
            (Some(en), _) => f.write_str(en),
            (None, Some(pl)) => f.write_str(pl),
            (None, None) => f.write_str("<unnamed>"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Programme {
    pub id: String,
    #[serde(default)]
    pub description: LangDict,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StudentProgramme {
    pub id: String,
    pub programme: Programme,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UsosUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub student_programmes: Vec<StudentProgramme>,
}

impl UsosUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CourseEdition {
    pub course_id: String,
    #[serde(default)]
    pub course_name: LangDict,
    pub term_id: String,
}

/// Response of `services/courses/user`, editions grouped by term id.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct UserCourses {
    #[serde(default)]
    pub course_editions: BTreeMap<String, Vec<CourseEdition>>,
}

/// Everything about a verified user that admission filters can look at.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user: UsosUser,
    #[serde(default)]
    pub courses: Vec<CourseEdition>,
}

impl Profile {
    pub fn new(user: UsosUser, courses: UserCourses) -> Self {
        let courses = courses
            .course_editions
            .into_values()
            .flatten()
            .collect();
        Profile { user, courses }
    }

    pub fn programmes(&self) -> impl Iterator<Item = &Programme> {
        self.user.student_programmes.iter().map(|sp| &sp.programme)
    }

    pub fn course_ids(&self) -> impl Iterator<Item = &str> {
        self.courses.iter().map(|c| c.course_id.as_str())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "usos id: {}", self.user.id)?;
        writeln!(f, "name: {}", self.user.display_name())?;
        for p in self.programmes() {
            writeln!(f, "programme: {} ({})", p.description, p.id)?;
        }
        for c in self.courses.iter() {
            writeln!(f, "course: {} ({}) [{}]", c.course_name, c.course_id, c.term_id)?;
        }
        Ok(())
    }
}

/* ===== admission ===== */

/// A single admission rule. The user must hold every listed programme and
/// every listed course to pass it.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct AdmissionFilter {
    #[serde(default)]
    pub programmes: Vec<String>,
    #[serde(default)]
    pub courses: Vec<String>,
}

impl AdmissionFilter {
    pub fn new(programmes: Vec<String>, courses: Vec<String>) -> Result<Self, OperationError> {
        let filter = AdmissionFilter {
            programmes,
            courses,
        };
        if filter.is_empty() {
            Err(OperationError::FilterEmpty)
        } else {
            Ok(filter)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.programmes.is_empty() && self.courses.is_empty()
    }
}

impl fmt::Display for AdmissionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "programmes: [{}] courses: [{}]",
            self.programmes.join(", "),
            self.courses.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserialise_without_programmes() {
        let user: UsosUser =
            serde_json::from_str(r#"{"id": "1234", "first_name": "Jan", "last_name": "Kowalski"}"#)
                .expect("failed to parse user");
        assert!(user.student_programmes.is_empty());
        assert_eq!(user.display_name(), "Jan Kowalski");
    }

    #[test]
    fn test_profile_flattens_terms() {
        let courses: UserCourses = serde_json::from_str(
            r#"{"course_editions": {
                "2023Z": [{"course_id": "A", "course_name": {"pl": "Analiza", "en": "Analysis"}, "term_id": "2023Z"}],
                "2024L": [
                    {"course_id": "B", "course_name": {"pl": "Bazy"}, "term_id": "2024L"},
                    {"course_id": "C", "term_id": "2024L"}
                ]
            }}"#,
        )
        .expect("failed to parse courses");
        let user = UsosUser {
            id: "1".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Nowak".to_string(),
            student_programmes: Vec::new(),
        };

        let profile = Profile::new(user, courses);
        let ids: Vec<_> = profile.course_ids().collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_filter_rejected() {
        assert_eq!(
            AdmissionFilter::new(Vec::new(), Vec::new()),
            Err(OperationError::FilterEmpty)
        );
        assert!(AdmissionFilter::new(vec!["Informatyka".to_string()], Vec::new()).is_ok());
    }

    #[test]
    fn test_ids_are_transparent() {
        let g = GuildId::from("42");
        assert_eq!(serde_json::to_string(&g).expect("serialise"), "\"42\"");
        assert_eq!(g.to_string(), "42");
    }
}
