//! HTML form types
//!
//! Forms carry the submitted values back to the template together with
//! per-field error messages, so a rejected submission can be re-rendered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error shown under an empty required field
pub const REQUIRED_FIELD: &str = "Обязательное поле.";

/// Key for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Field name → error messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    /// Messages attached to a field (empty if none)
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Comment create/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentForm {
    pub text: String,
    pub errors: FormErrors,
}

/// Submitted body of the comment form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentFormData {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    /// Unbound form, as shown under a news item
    pub fn empty() -> Self {
        Self::default()
    }

    /// Form holding submitted (or existing) text
    pub fn bound(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            errors: FormErrors::default(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<CommentFormData> for CommentForm {
    fn from(data: CommentFormData) -> Self {
        Self::bound(data.text)
    }
}

/// Login form
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginForm {
    pub username: String,
    /// Where to go after a successful login
    pub next: Option<String>,
    pub errors: FormErrors,
}

/// Submitted body of the login form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Signup form
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupForm {
    pub username: String,
    pub errors: FormErrors,
}

/// Submitted body of the signup form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_form_is_valid() {
        let form = CommentForm::empty();
        assert!(form.is_valid());
        assert!(form.text.is_empty());
    }

    #[test]
    fn test_errors_are_grouped_by_field() {
        let mut errors = FormErrors::default();
        errors.add("text", "first");
        errors.add("text", "second");
        errors.add(NON_FIELD_ERRORS, "other");

        assert_eq!(errors.field("text"), ["first", "second"]);
        assert_eq!(errors.field(NON_FIELD_ERRORS), ["other"]);
        assert!(errors.field("missing").is_empty());
    }

    #[test]
    fn test_errors_serialize_as_map() {
        let mut form = CommentForm::bound("x");
        form.errors.add("text", "bad");
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["errors"]["text"][0], "bad");
        assert_eq!(json["text"], "x");
    }
}
