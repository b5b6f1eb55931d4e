use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// Regex for email: something@something.something, no whitespace
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex")
});

pub const MIN_NAME_LENGTH: usize = 3;
pub const PHONE_DIGITS: usize = 10;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_AGE: u8 = 1;
pub const MAX_AGE: u8 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid full name (min 3 characters)")]
    InvalidName,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter a valid phone number (10 digits)")]
    InvalidPhone,
    #[error("Please enter a valid age (1-120)")]
    InvalidAge,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Checks the name is at least 3 characters once trimmed
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::InvalidName);
    }
    Ok(name.to_owned())
}

/// Checks the email against the simple `local@domain.tld` pattern
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if EMAIL_REGEX.is_match(email) {
        Ok(email.to_owned())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// A phone number is valid if it holds exactly 10 digits, separators ignored.
pub fn validate_phone(phone: &str) -> Result<String, ValidationError> {
    let phone = phone.trim();
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digits != PHONE_DIGITS {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(phone.to_owned())
}

/// Reads the leading integer of the input, ignoring whatever follows it
/// (`"25 years"` and `"25.5"` both give 25), then checks the range.
pub fn validate_age(age: &str) -> Result<u8, ValidationError> {
    let age = age.trim_start();
    let (negative, digits) = match age.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, age.strip_prefix('+').unwrap_or(age)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    let value: u32 = digits[..end]
        .parse()
        .map_err(|_| ValidationError::InvalidAge)?;
    match u8::try_from(value) {
        Ok(age) if !negative && (MIN_AGE..=MAX_AGE).contains(&age) => Ok(age),
        _ => Err(ValidationError::InvalidAge),
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Raw registration input, as typed by the user
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
    pub password: String,
    pub confirm_password: String,
}

/// Registration input that passed every check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u8,
    pub password: String,
}

impl RegistrationForm {
    /// Validates every field in form order and stops at the first failure
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        let name = validate_name(&self.name)?;
        let email = validate_email(&self.email)?;
        let phone = validate_phone(&self.phone)?;
        let age = validate_age(&self.age)?;
        validate_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(NewUser {
            name,
            email,
            phone,
            age,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Returns the trimmed email once the format checks pass
    pub fn validate(&self) -> Result<String, ValidationError> {
        let email = validate_email(&self.email)?;
        validate_password(&self.password)?;
        Ok(email)
    }
}
