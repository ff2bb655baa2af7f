//! Format validation for checkout contact fields.
//!
//! Validation runs before any network call; a rejected field produces an
//! inline error and never commits the transaction.

use crate::error::{CheckoutError, Result};
use crate::types::ContactInfo;

/// Validate email address format.
///
/// Basic structural validation:
/// - exactly one `@` with non-empty local and domain parts
/// - domain contains at least one dot, with non-empty segments
/// - length between 3 and 255 characters
///
/// # Examples
///
/// ```
/// use bookline_checkout::utils::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email("user+tag@subdomain.example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("user@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if !domain.contains('.') {
        return false;
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    if !local.chars().all(valid_local) || !domain.chars().all(valid_domain) {
        return false;
    }

    domain.split('.').all(|part| !part.is_empty())
}

/// Validate phone number format.
///
/// Accepts an optional leading `+`, digits, and common separators
/// (spaces, dashes, dots, parentheses), requiring 7 to 15 digits overall.
///
/// # Examples
///
/// ```
/// use bookline_checkout::utils::is_valid_phone;
///
/// assert!(is_valid_phone("+1 (555) 010-9900"));
/// assert!(is_valid_phone("5550109900"));
/// assert!(!is_valid_phone("call me"));
/// assert!(!is_valid_phone("123"));
/// ```
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let mut digits = 0usize;
    for c in rest.chars() {
        if c.is_ascii_digit() {
            digits += 1;
        } else if !matches!(c, ' ' | '-' | '.' | '(' | ')') {
            return false;
        }
    }
    (7..=15).contains(&digits)
}

/// Validate the required checkout contact fields.
///
/// # Errors
///
/// Returns [`CheckoutError::Validation`] naming the first offending
/// field: empty name, malformed email, or malformed phone.
pub fn validate_contact(contact: &ContactInfo) -> Result<()> {
    if contact.name.trim().is_empty() {
        return Err(CheckoutError::validation("name", "must not be empty"));
    }
    if !is_valid_email(&contact.email) {
        return Err(CheckoutError::validation(
            "email",
            "must be a valid email address",
        ));
    }
    if !is_valid_phone(&contact.phone) {
        return Err(CheckoutError::validation(
            "phone",
            "must be a valid phone number",
        ));
    }
    Ok(())
}
