//! Field-level checks the store applies before writing a record.
//!
//! Attribute structs are what callers hand to the store. Every field is
//! optional so that a missing value surfaces as a validation failure rather
//! than a decoding error.

use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$")
        .unwrap_or_else(|e| panic!("email regex must be valid: {e}"))
});

/// Unique indexes on `users` as the drivers name them: SQLite reports
/// `table.column`, Postgres the default `<table>_<column>_key` constraint.
const UNIQUE_INDEXES: [(&str, &str); 4] = [
    ("users.email", "email"),
    ("users_email_key", "email"),
    ("users.uuid", "uuid"),
    ("users_uuid_key", "uuid"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    NotNull,
    NotEmpty,
    Format,
    Unique,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub kind: IssueKind,
    pub message: String,
}

/// One or more rejected fields. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn has(&self, field: &str, kind: IssueKind) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.field == field && issue.kind == kind)
    }

    /// Builds the failure reported for a unique index violation. `detail` is the
    /// driver message, e.g. `UNIQUE constraint failed: users.email`.
    pub(crate) fn unique_violation(detail: &str) -> Self {
        let field = UNIQUE_INDEXES
            .iter()
            .find(|(index, _)| detail.contains(index))
            .map(|(_, field)| *field)
            .unwrap_or("record");
        Self {
            issues: vec![ValidationIssue {
                field,
                kind: IssueKind::Unique,
                message: format!("{field} must be unique"),
            }],
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for issue in &self.issues {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(&issue.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Default)]
struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn required(&mut self, field: &'static str, value: Option<String>) -> String {
        match value {
            None => {
                self.push(field, IssueKind::NotNull, format!("{field} cannot be null"));
                String::new()
            }
            Some(value) if value.trim().is_empty() => {
                self.push(field, IssueKind::NotEmpty, format!("{field} cannot be empty"));
                value
            }
            Some(value) => value,
        }
    }

    fn email(&mut self, field: &'static str, value: &str) {
        if !value.trim().is_empty() && !EMAIL_RE.is_match(value) {
            self.push(
                field,
                IssueKind::Format,
                format!("{field} must be a valid email address"),
            );
        }
    }

    fn push(&mut self, field: &'static str, kind: IssueKind, message: String) {
        self.issues.push(ValidationIssue {
            field,
            kind,
            message,
        });
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(ValidationErrors {
                issues: self.issues,
            })
        }
    }
}

/// Writable user fields, as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAttributes {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UserFields {
    pub name: String,
    pub email: String,
    pub role: String,
}

impl UserAttributes {
    pub fn new(name: &str, email: &str, role: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            role: Some(role.to_string()),
        }
    }

    pub(crate) fn validate(self) -> Result<UserFields, ValidationErrors> {
        let mut checker = Checker::default();
        let name = checker.required("name", self.name);
        let email = checker.required("email", self.email);
        checker.email("email", &email);
        let role = checker.required("role", self.role);
        checker.finish(UserFields { name, email, role })
    }
}

/// Writable post fields. The owner is referenced by its external uuid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAttributes {
    pub user_uuid: Option<Uuid>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PostFields {
    pub user_uuid: Uuid,
    pub body: String,
}

impl PostAttributes {
    pub fn new(user_uuid: Uuid, body: &str) -> Self {
        Self {
            user_uuid: Some(user_uuid),
            body: Some(body.to_string()),
        }
    }

    pub(crate) fn validate(self) -> Result<PostFields, ValidationErrors> {
        let mut checker = Checker::default();
        let user_uuid = match self.user_uuid {
            Some(uuid) => uuid,
            None => {
                checker.push(
                    "userUuid",
                    IssueKind::NotNull,
                    String::from("userUuid cannot be null"),
                );
                Uuid::nil()
            }
        };
        let body = checker.required("body", self.body);
        checker.finish(PostFields { user_uuid, body })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{IssueKind, PostAttributes, UserAttributes, ValidationErrors};

    #[test]
    fn accepts_complete_user() {
        let fields = UserAttributes::new("Ann", "ann@x.io", "admin")
            .validate()
            .unwrap_or_else(|e| panic!("valid user rejected: {e}"));
        assert_eq!(fields.name, "Ann");
        assert_eq!(fields.email, "ann@x.io");
        assert_eq!(fields.role, "admin");
    }

    #[test]
    fn reports_every_missing_field() {
        let Err(errors) = UserAttributes::default().validate() else {
            panic!("empty attributes must be rejected");
        };
        assert_eq!(errors.issues().len(), 3);
        assert!(errors.has("name", IssueKind::NotNull));
        assert!(errors.has("email", IssueKind::NotNull));
        assert!(errors.has("role", IssueKind::NotNull));
    }

    #[test]
    fn rejects_blank_and_malformed_values() {
        let Err(errors) = UserAttributes::new("  ", "not-an-email", "admin").validate() else {
            panic!("blank name and bad email must be rejected");
        };
        assert!(errors.has("name", IssueKind::NotEmpty));
        assert!(errors.has("email", IssueKind::Format));
        assert!(!errors.has("role", IssueKind::NotEmpty));
    }

    #[test]
    fn email_shape() {
        for good in ["a@b.co", "first.last+tag@mail.example.org"] {
            assert!(UserAttributes::new("A", good, "r").validate().is_ok(), "{good}");
        }
        for bad in ["a@b", "@b.co", "a b@c.io", "a@b.", "a@@b.io"] {
            assert!(UserAttributes::new("A", bad, "r").validate().is_err(), "{bad}");
        }
    }

    #[test]
    fn post_requires_owner_and_body() {
        let Err(errors) = PostAttributes::default().validate() else {
            panic!("empty post must be rejected");
        };
        assert!(errors.has("userUuid", IssueKind::NotNull));
        assert!(errors.has("body", IssueKind::NotNull));

        let uuid = Uuid::new_v4();
        let fields = PostAttributes::new(uuid, "hello")
            .validate()
            .unwrap_or_else(|e| panic!("valid post rejected: {e}"));
        assert_eq!(fields.user_uuid, uuid);
    }

    #[test]
    fn unique_violation_names_the_column() {
        let sqlite = ValidationErrors::unique_violation("UNIQUE constraint failed: users.email");
        assert!(sqlite.has("email", IssueKind::Unique));

        let postgres = ValidationErrors::unique_violation(
            "duplicate key value violates unique constraint \"users_email_key\"",
        );
        assert!(postgres.has("email", IssueKind::Unique));
        assert_eq!(postgres.to_string(), "email must be unique");

        let uuid = ValidationErrors::unique_violation("UNIQUE constraint failed: users.uuid");
        assert!(uuid.has("uuid", IssueKind::Unique));
    }

    #[test]
    fn unique_violation_ignores_unrelated_index_names() {
        let other = ValidationErrors::unique_violation(
            "duplicate key value violates unique constraint \"posts_email_digest_key\"",
        );
        assert!(other.has("record", IssueKind::Unique));
        assert!(!other.has("email", IssueKind::Unique));

        let other = ValidationErrors::unique_violation("UNIQUE constraint failed: audit.uuid_ref");
        assert!(other.has("record", IssueKind::Unique));
    }
}
