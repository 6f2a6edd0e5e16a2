use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{JobRolesPerMonth, PainLevel, ResumesPerRole};

/// Form field names accepted by the signup store. The store keys rows by
/// `email` and overwrites the other four columns on resubmission.
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_RESUMES_PER_ROLE: &str = "resumesPerRole";
pub const FIELD_JOB_ROLES_PER_MONTH: &str = "jobRolesPerMonth";
pub const FIELD_PAIN_LEVEL: &str = "painLevel";
pub const FIELD_FRUSTRATION: &str = "frustration";

/// The flat record exchanged with the signup store. Valid for submission as
/// soon as `email` is non-empty after trimming; every other field may be
/// unanswered and is sent as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRecord {
    pub email: String,
    pub resumes_per_role: Option<ResumesPerRole>,
    pub job_roles_per_month: Option<JobRolesPerMonth>,
    pub pain_level: Option<PainLevel>,
    pub frustration: String,
}

impl SignupRecord {
    /// The first-phase record: email captured, questionnaire untouched.
    pub fn email_only(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            resumes_per_role: None,
            job_roles_per_month: None,
            pain_level: None,
            frustration: String::new(),
        }
    }

    pub fn is_submittable(&self) -> bool {
        !self.email.trim().is_empty()
    }

    /// The `application/x-www-form-urlencoded` body fields, in the order the
    /// store's sheet lays out its columns. Unanswered fields are empty strings.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (FIELD_EMAIL, self.email.clone()),
            (
                FIELD_RESUMES_PER_ROLE,
                self.resumes_per_role
                    .map(|v| v.wire_value().to_string())
                    .unwrap_or_default(),
            ),
            (
                FIELD_JOB_ROLES_PER_MONTH,
                self.job_roles_per_month
                    .map(|v| v.wire_value().to_string())
                    .unwrap_or_default(),
            ),
            (
                FIELD_PAIN_LEVEL,
                self.pain_level
                    .map(|v| v.wire_value().to_string())
                    .unwrap_or_default(),
            ),
            (FIELD_FRUSTRATION, self.frustration.clone()),
        ]
    }
}

/// JSON acknowledgement returned by the signup store. A missing `success`
/// field deserializes to `false` and must be treated as a failed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
}
