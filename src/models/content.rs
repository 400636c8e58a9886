//! Input records for the public site content kinds.
//!
//! `New*` types carry every required field for an insert; `*Patch` types
//! are partial updates where an absent field leaves the column unchanged.
//! Nullable columns are `Option<Option<T>>` in a patch, so an explicit
//! `null` clears the column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::validation::{Checks, FieldError, Validate, is_valid_email};

const fn default_true() -> bool {
    true
}

fn default_category() -> String {
    "general".to_string()
}

/// Present-but-null deserializes to `Some(None)`; paired with
/// `#[serde(default)]` an absent field stays `None`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContentBlock {
    pub section: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Validate for NewContentBlock {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .required("section", &self.section)
            .max_len("section", Some(&self.section), 100)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlockPatch {
    pub section: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub subtitle: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub link_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub link_text: Option<Option<String>>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

impl Validate for ContentBlockPatch {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .not_blank("section", self.section.as_deref())
            .max_len("section", self.section.as_deref(), 100)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub category: String,
    pub duration: String,
    pub description: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl Validate for NewCourse {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .required("title", &self.title)
            .required("category", &self.category)
            .required("duration", &self.duration)
            .required("description", &self.description)
            .max_len("title", Some(&self.title), 255)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub is_featured: Option<bool>,
}

impl Validate for CoursePatch {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .not_blank("title", self.title.as_deref())
            .not_blank("category", self.category.as_deref())
            .not_blank("duration", self.duration.as_deref())
            .not_blank("description", self.description.as_deref())
            .max_len("title", self.title.as_deref(), 255)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub faculty_count: i32,
}

impl Validate for NewDepartment {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .required("name", &self.name)
            .required("description", &self.description)
            .check("faculty_count", self.faculty_count >= 0, "must not be negative")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub faculty_count: Option<i32>,
}

impl Validate for DepartmentPatch {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .not_blank("name", self.name.as_deref())
            .not_blank("description", self.description.as_deref())
            .check(
                "faculty_count",
                self.faculty_count.is_none_or(|n| n >= 0),
                "must not be negative",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGalleryItem {
    pub title: String,
    pub artist: Option<String>,
    pub category: String,
    pub image_url: String,
}

impl Validate for NewGalleryItem {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .required("title", &self.title)
            .required("category", &self.category)
            .required("image_url", &self.image_url)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryItemPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub artist: Option<Option<String>>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl Validate for GalleryItemPatch {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .not_blank("title", self.title.as_deref())
            .not_blank("category", self.category.as_deref())
            .not_blank("image_url", self.image_url.as_deref())
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    pub image_url: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub is_featured: bool,
}

impl Validate for NewEvent {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .required("title", &self.title)
            .required("description", &self.description)
            .required("location", &self.location)
            .check(
                "end_date",
                self.end_date.is_none_or(|end| end >= self.date),
                "must not be before date",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub category: Option<String>,
    pub is_featured: Option<bool>,
}

impl Validate for EventPatch {
    fn validate(&self) -> Vec<FieldError> {
        let ordered = match (self.date, self.end_date) {
            (Some(start), Some(Some(end))) => end >= start,
            _ => true,
        };

        Checks::new()
            .not_blank("title", self.title.as_deref())
            .not_blank("description", self.description.as_deref())
            .not_blank("location", self.location.as_deref())
            .not_blank("category", self.category.as_deref())
            .check("end_date", ordered, "must not be before date")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub order: i32,
}

impl Validate for NewFaq {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .required("question", &self.question)
            .required("answer", &self.answer)
            .required("category", &self.category)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaqPatch {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<String>,
    pub order: Option<i32>,
}

impl Validate for FaqPatch {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .not_blank("question", self.question.as_deref())
            .not_blank("answer", self.answer.as_deref())
            .not_blank("category", self.category.as_deref())
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub category: String,
    pub subject: String,
    pub message: String,
}

impl Validate for NewContactMessage {
    fn validate(&self) -> Vec<FieldError> {
        let checks = Checks::new()
            .required("name", &self.name)
            .required("category", &self.category)
            .required("subject", &self.subject)
            .required("message", &self.message)
            .max_len("subject", Some(&self.subject), 255)
            .max_len("message", Some(&self.message), 5000);

        checks
            .check("email", is_valid_email(&self.email), "must be a valid email address")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_event_rejects_end_before_start() {
        let start = Utc::now();
        let event = NewEvent {
            title: "Open Studio".to_string(),
            description: "Annual showcase".to_string(),
            date: start,
            end_date: Some(start - Duration::hours(1)),
            location: "Main Hall".to_string(),
            image_url: None,
            category: default_category(),
            is_featured: false,
        };

        let errors = event.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "end_date");
    }

    #[test]
    fn test_empty_patch_is_valid() {
        assert!(CoursePatch::default().validate().is_empty());
        assert!(EventPatch::default().validate().is_empty());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: CoursePatch =
            serde_json::from_value(serde_json::json!({ "image_url": null })).unwrap();
        assert_eq!(patch.image_url, Some(None));

        let patch: CoursePatch =
            serde_json::from_value(serde_json::json!({ "title": "Film" })).unwrap();
        assert_eq!(patch.image_url, None);

        let patch: EventPatch = serde_json::from_value(serde_json::json!({
            "end_date": "2026-05-01T18:00:00Z"
        }))
        .unwrap();
        assert!(matches!(patch.end_date, Some(Some(_))));
    }

    #[test]
    fn test_course_requires_fields() {
        let course: NewCourse = serde_json::from_value(serde_json::json!({
            "title": "",
            "category": "undergraduate",
            "duration": "4 years",
            "description": " "
        }))
        .unwrap();

        let fields: Vec<_> = course.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, ["title", "description"]);
        assert!(!course.is_featured);
    }

    #[test]
    fn test_defaults_applied() {
        let faq: NewFaq = serde_json::from_value(serde_json::json!({
            "question": "When do admissions open?",
            "answer": "In March."
        }))
        .unwrap();
        assert_eq!(faq.category, "general");
        assert_eq!(faq.order, 0);

        let block: NewContentBlock =
            serde_json::from_value(serde_json::json!({ "section": "home" })).unwrap();
        assert!(block.is_active);
    }
}
