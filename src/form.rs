//! Task submission draft and validation.
//!
//! The form stages everything as text and selectors; `validate` turns a
//! draft into a `NewTask` or a per-field error map. Required fields are
//! week, status and a non-empty feature name. Blank optional inputs are
//! stored as absent, and date inputs must be `YYYY-MM-DD` when present.
//! Submission is never attempted while the draft is invalid.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::fields::{Status, WeekLabel};
use crate::task::NewTask;

/// Field identifiers for inline error display, in form order.
pub const FIELD_WEEK: &str = "week_label";
pub const FIELD_WEEK_START: &str = "week_start_date";
pub const FIELD_FSD: &str = "fsd_presented";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_DESIGN_START: &str = "design_start_date";
pub const FIELD_DESIGN_END: &str = "design_end_date";
pub const FIELD_FEATURE: &str = "feature_name";
pub const FIELD_DEMO: &str = "demo_date";

/// Per-field validation messages keyed by field identifier.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Staged form state for a new task.
#[derive(Debug, Default, Clone)]
pub struct TaskDraft {
    pub week_label: Option<WeekLabel>,
    pub week_start_date: String,
    pub fsd_presented: String,
    pub status: Option<Status>,
    pub design_start_date: String,
    pub design_end_date: String,
    pub apl: String,
    pub feature_name: String,
    pub pm: String,
    pub designer: String,
    pub task_description: String,
    pub demo_date: String,
}

impl TaskDraft {
    /// Check the draft and build the submission payload.
    pub fn validate(&self) -> Result<NewTask, FieldErrors> {
        let mut errors = FieldErrors::new();

        let week_label = match &self.week_label {
            Some(week) => Some(week.clone()),
            None => {
                errors.insert(FIELD_WEEK, "Week is required".to_string());
                None
            }
        };
        let status = match self.status {
            Some(status) => Some(status),
            None => {
                errors.insert(FIELD_STATUS, "Status is required".to_string());
                None
            }
        };
        let feature_name = self.feature_name.trim();
        if feature_name.is_empty() {
            errors.insert(FIELD_FEATURE, "Feature / Project Name is required".to_string());
        }

        let week_start_date = parse_date(&self.week_start_date, FIELD_WEEK_START, &mut errors);
        let fsd_presented = parse_date(&self.fsd_presented, FIELD_FSD, &mut errors);
        let design_start_date =
            parse_date(&self.design_start_date, FIELD_DESIGN_START, &mut errors);
        let design_end_date = parse_date(&self.design_end_date, FIELD_DESIGN_END, &mut errors);
        let demo_date = parse_date(&self.demo_date, FIELD_DEMO, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewTask {
            week_label: week_label.unwrap(),
            week_start_date,
            fsd_presented,
            status: status.unwrap(),
            design_start_date,
            design_end_date,
            apl: blank_to_none(&self.apl),
            feature_name: feature_name.to_string(),
            pm: blank_to_none(&self.pm),
            designer: blank_to_none(&self.designer),
            task_description: blank_to_none(&self.task_description),
            demo_date,
        })
    }
}

fn blank_to_none(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_date(raw: &str, field: &'static str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.insert(field, format!("'{trimmed}' is not a valid date (YYYY-MM-DD)"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> TaskDraft {
        TaskDraft {
            week_label: Some(WeekLabel::Week1),
            status: Some(Status::YetToStart),
            feature_name: "Quote panel".to_string(),
            ..TaskDraft::default()
        }
    }

    #[test]
    fn test_required_fields_are_enforced() {
        let errors = TaskDraft::default().validate().unwrap_err();
        assert!(errors.contains_key(FIELD_WEEK));
        assert!(errors.contains_key(FIELD_STATUS));
        assert!(errors.contains_key(FIELD_FEATURE));
    }

    #[test]
    fn test_whitespace_feature_name_is_rejected() {
        let mut draft = valid_draft();
        draft.feature_name = "   ".to_string();
        let errors = draft.validate().unwrap_err();
        assert!(errors.contains_key(FIELD_FEATURE));
    }

    #[test]
    fn test_blank_optionals_become_absent() {
        let mut draft = valid_draft();
        draft.apl = "  ".to_string();
        draft.designer = " Sam ".to_string();

        let task = draft.validate().unwrap();
        assert_eq!(task.apl, None);
        assert_eq!(task.designer.as_deref(), Some("Sam"));
        assert_eq!(task.pm, None);
        assert_eq!(task.demo_date, None);
    }

    #[test]
    fn test_bad_dates_surface_per_field() {
        let mut draft = valid_draft();
        draft.week_start_date = "02/06/2025".to_string();
        draft.demo_date = "2025-07-14".to_string();

        let errors = draft.validate().unwrap_err();
        assert!(errors.contains_key(FIELD_WEEK_START));
        assert!(!errors.contains_key(FIELD_DEMO));
    }

    #[test]
    fn test_valid_draft_builds_payload() {
        let mut draft = valid_draft();
        draft.week_start_date = "2025-06-02".to_string();
        draft.task_description = "first pass".to_string();

        let task = draft.validate().unwrap();
        assert_eq!(task.week_label, WeekLabel::Week1);
        assert_eq!(task.status, Status::YetToStart);
        assert_eq!(task.feature_name, "Quote panel");
        assert_eq!(
            task.week_start_date,
            Some(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
        );
        assert_eq!(task.task_description.as_deref(), Some("first pass"));
    }
}
