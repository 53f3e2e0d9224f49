//! Required-field checks shared by the API handlers and the sync client.
//!
//! Each form reports every failing field at once so callers can render the
//! messages inline next to the inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::{auth::RegisterRequest, contact::ContactRequest};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Field name to message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join(", "))
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// Mirrors the storefront's `\S+@\S+` pattern: something on both sides of an
/// `@` and no whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.find('@') {
        Some(at) => at > 0 && at + 1 < email.len(),
        None => false,
    }
}

fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, message);
        return false;
    }
    true
}

fn require_email(errors: &mut FieldErrors, field: &str, value: &str) {
    if require(errors, field, value, "Email is required") && !is_valid_email(value.trim()) {
        errors.add(field, "Invalid email address");
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for RegisterForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "username", &self.username, "Username is required");
        require_email(&mut errors, "email", &self.email);
        if require(&mut errors, "password", &self.password, "Password is required")
            && self.password.chars().count() < MIN_PASSWORD_LEN
        {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        if require(
            &mut errors,
            "confirm_password",
            &self.confirm_password,
            "Please confirm your password",
        ) && self.confirm_password != self.password
        {
            errors.add("confirm_password", "Passwords do not match");
        }
        errors.into_result()
    }
}

impl From<&RegisterForm> for RegisterRequest {
    fn from(form: &RegisterForm) -> Self {
        RegisterRequest {
            name: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_email(&mut errors, "email", &self.email);
        require(&mut errors, "password", &self.password, "Password is required");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckoutForm {
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip: String,
}

impl Validate for CheckoutForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "full_name", &self.full_name, "Full name is required");
        require_email(&mut errors, "email", &self.email);
        require(&mut errors, "address", &self.address, "Address is required");
        require(&mut errors, "city", &self.city, "City is required");
        require(&mut errors, "zip", &self.zip, "ZIP code is required");
        errors.into_result()
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        require_email(&mut errors, "email", &self.email);
        if require(&mut errors, "password", &self.password, "Password is required")
            && self.password.chars().count() < MIN_PASSWORD_LEN
        {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        errors.into_result()
    }
}

impl Validate for ContactRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, "Name is required");
        require(&mut errors, "email", &self.email, "Email is required");
        require(&mut errors, "message", &self.message, "Message is required");
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern_matches_storefront_rule() {
        assert!(is_valid_email("a@b"));
        assert!(is_valid_email("jane.doe@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email("plainaddress"));
    }

    #[test]
    fn register_form_reports_every_failing_field() {
        let form = RegisterForm {
            username: "  ".into(),
            email: "nope".into(),
            password: "abc".into(),
            confirm_password: "abd".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("username"), Some("Username is required"));
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(errors.get("confirm_password"), Some("Passwords do not match"));
    }

    #[test]
    fn valid_register_form_passes() {
        let form = RegisterForm {
            username: "jane".into(),
            email: "jane@example.com".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        };
        assert!(form.validate().is_ok());
        let request = RegisterRequest::from(&form);
        assert_eq!(request.name, "jane");
    }

    #[test]
    fn checkout_form_requires_all_fields() {
        let errors = CheckoutForm::default().validate().unwrap_err();
        for field in ["full_name", "email", "address", "city", "zip"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn contact_request_requires_name_email_message() {
        let request = ContactRequest {
            name: "Jane".into(),
            email: String::new(),
            subject: None,
            message: "hi".into(),
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("email"), Some("Email is required"));
    }
}
