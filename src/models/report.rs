use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    Bug,
    Feedback,
    Content,
    Other,
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportCategory::Bug => write!(f, "bug"),
            ReportCategory::Feedback => write!(f, "feedback"),
            ReportCategory::Content => write!(f, "content"),
            ReportCategory::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ReportCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bug" => Ok(ReportCategory::Bug),
            "feedback" => Ok(ReportCategory::Feedback),
            "content" => Ok(ReportCategory::Content),
            "other" => Ok(ReportCategory::Other),
            _ => Err(format!(
                "Invalid report category '{}'. Valid options: bug, feedback, content, other",
                s
            )),
        }
    }
}

/// User feedback about the app or a piece of community content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: ReportCategory,
    pub message: String,
    pub shared_recipe_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(user_id: Uuid, category: ReportCategory, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            category,
            message: message.into(),
            shared_recipe_id: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_category_roundtrip_text() {
        for category in [
            ReportCategory::Bug,
            ReportCategory::Feedback,
            ReportCategory::Content,
            ReportCategory::Other,
        ] {
            let text = category.to_string();
            assert_eq!(ReportCategory::from_str(&text).unwrap(), category);
        }
        assert!(ReportCategory::from_str("spam").is_err());
    }
}
