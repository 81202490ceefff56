//! Customer contact details.

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, optional_text, required_text};

/// A phone number normalized to digits with an optional leading `+`.
///
/// Spaces, dashes, dots and parentheses are accepted on input and stripped.
///
/// ```
/// use souk_core::contact::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+7 (701) 555-01-02").unwrap();
/// assert_eq!(phone.as_str(), "+77015550102");
/// assert!(PhoneNumber::parse("12-34").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub const MIN_DIGITS: usize = 7;
    pub const MAX_DIGITS: usize = 15;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` on unexpected characters or a digit count
    /// outside 7..=15.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let (plus, rest) = trimmed
            .strip_prefix('+')
            .map_or((false, trimmed), |r| (true, r));

        let mut digits = String::with_capacity(rest.len() + 1);
        if plus {
            digits.push('+');
        }
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => {
                    return Err(ValidationError::new(
                        "phone",
                        format!("unexpected character '{c}'"),
                    ));
                }
            }
        }

        let count = digits.chars().filter(char::is_ascii_digit).count();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&count) {
            return Err(ValidationError::new(
                "phone",
                format!(
                    "must have between {} and {} digits",
                    Self::MIN_DIGITS,
                    Self::MAX_DIGITS
                ),
            ));
        }

        Ok(Self(digits))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An email address with a minimal structural check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an email, lower-casing the domain.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the address is too long, lacks exactly
    /// one `@`, or has an empty local part or a domain without a dot.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let s = raw.trim();
        if s.len() > Self::MAX_LENGTH {
            return Err(ValidationError::new("email", "is too long"));
        }
        let Some((local, domain)) = s.split_once('@') else {
            return Err(ValidationError::new("email", "must contain an @ symbol"));
        };
        if local.is_empty() || domain.contains('@') {
            return Err(ValidationError::new("email", "is malformed"));
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(ValidationError::new("email", "domain is malformed"));
        }
        Ok(Self(format!("{local}@{}", domain.to_lowercase())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Customer details attached to an order, as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Customer details after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCustomer {
    pub name: String,
    pub phone: PhoneNumber,
    pub email: Option<Email>,
    pub address: String,
    pub city: Option<String>,
    pub note: Option<String>,
}

impl CustomerInfo {
    /// Validate and normalize the customer details.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<ValidCustomer, ValidationError> {
        Ok(ValidCustomer {
            name: required_text("customer.name", &self.name, 120)?,
            phone: PhoneNumber::parse(&self.phone)?,
            email: self
                .email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(Email::parse)
                .transpose()?,
            address: required_text("customer.address", &self.address, 500)?,
            city: optional_text("customer.city", self.city.as_deref(), 120)?,
            note: optional_text("customer.note", self.note.as_deref(), 2000)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: " Aigerim ".to_owned(),
            phone: "8 701 555 0102".to_owned(),
            email: Some(" ".to_owned()),
            address: "12 Abay Ave".to_owned(),
            city: None,
            note: Some("call first".to_owned()),
        }
    }

    #[test]
    fn test_phone_rejects_letters() {
        let err = PhoneNumber::parse("call me").unwrap_err();
        assert_eq!(err.field, "phone");
    }

    #[test]
    fn test_phone_rejects_too_long() {
        assert!(PhoneNumber::parse("+1234567890123456").is_err());
    }

    #[test]
    fn test_email_lowercases_domain() {
        let email = Email::parse("Jane.Doe@Example.COM").unwrap();
        assert_eq!(email.as_str(), "Jane.Doe@example.com");
    }

    #[test]
    fn test_email_rejects_malformed() {
        assert!(Email::parse("no-at-symbol").is_err());
        assert!(Email::parse("@example.com").is_err());
        assert!(Email::parse("a@b@c.com").is_err());
        assert!(Email::parse("user@localhost").is_err());
    }

    #[test]
    fn test_customer_validate_normalizes() {
        let valid = customer().validate().unwrap();
        assert_eq!(valid.name, "Aigerim");
        assert_eq!(valid.phone.as_str(), "87015550102");
        assert_eq!(valid.email, None);
        assert_eq!(valid.note.as_deref(), Some("call first"));
    }

    #[test]
    fn test_customer_requires_address() {
        let mut c = customer();
        c.address = String::new();
        assert_eq!(c.validate().unwrap_err().field, "customer.address");
    }
}
