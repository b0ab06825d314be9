use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use time::{macros::format_description, Date};

/// Format failure for a single input field. The display string is the code
/// returned to clients.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("CHECK_FIRST_NAME")]
    FirstName,
    #[error("CHECK_LAST_NAME")]
    LastName,
    #[error("CHECK_PHONE_NUMBER")]
    PhoneNumber,
    #[error("CHECK_EMAIL")]
    Email,
    #[error("CHECK_PASSWORD")]
    Password,
    #[error("CHECK_BIRTH_DAY")]
    BirthDay,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FirstName => "CHECK_FIRST_NAME",
            Self::LastName => "CHECK_LAST_NAME",
            Self::PhoneNumber => "CHECK_PHONE_NUMBER",
            Self::Email => "CHECK_EMAIL",
            Self::Password => "CHECK_PASSWORD",
            Self::BirthDay => "CHECK_BIRTH_DAY",
        }
    }
}

// Width of the name and email columns.
const MAX_CHARS: usize = 50;

fn fits(value: &str) -> bool {
    value.chars().count() <= MAX_CHARS
}

// Symbols a password must draw at least one character from.
const PASSWORD_SYMBOLS: &str = "$@!%*#?&";

lazy_static! {
    static ref HANGUL_NAME_RE: Regex = Regex::new(r"^[ㄱ-ㅎㅏ-ㅣ가-힣]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^01[016789]-[0-9]{3,4}-[0-9]{4}$").unwrap();
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9.+_-]+@[a-zA-Z0-9]+\.[a-zA-Z]{2,3}$").unwrap();
    static ref PASSWORD_CHARSET_RE: Regex = Regex::new(r"^[A-Za-z0-9$@!%*#?&]{8,}$").unwrap();
}

pub fn check_first_name(value: &str) -> Result<(), ValidationError> {
    (fits(value) && HANGUL_NAME_RE.is_match(value))
        .then_some(())
        .ok_or(ValidationError::FirstName)
}

pub fn check_last_name(value: &str) -> Result<(), ValidationError> {
    (fits(value) && HANGUL_NAME_RE.is_match(value))
        .then_some(())
        .ok_or(ValidationError::LastName)
}

pub fn check_phone_number(value: &str) -> Result<(), ValidationError> {
    PHONE_RE
        .is_match(value)
        .then_some(())
        .ok_or(ValidationError::PhoneNumber)
}

pub fn check_email(value: &str) -> Result<(), ValidationError> {
    (fits(value) && EMAIL_RE.is_match(value))
        .then_some(())
        .ok_or(ValidationError::Email)
}

/// At least 8 characters from letters, digits and [`PASSWORD_SYMBOLS`], with
/// one of each class present.
pub fn check_password(value: &str) -> Result<(), ValidationError> {
    let ok = PASSWORD_CHARSET_RE.is_match(value)
        && value.chars().any(|c| c.is_ascii_alphabetic())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
    ok.then_some(()).ok_or(ValidationError::Password)
}

/// Parses a `YYYY-MM-DD` birth day.
pub fn parse_birth_day(value: &str) -> Result<Date, ValidationError> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::BirthDay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_number_format() {
        assert!(check_phone_number("010-1234-5678").is_ok());
        assert!(check_phone_number("011-123-5678").is_ok());
        assert_eq!(check_phone_number("010-123-45678"), Err(ValidationError::PhoneNumber));
        assert!(check_phone_number("012-1234-5678").is_err());
        assert!(check_phone_number("01012345678").is_err());
        assert!(check_phone_number(" 010-1234-5678").is_err());
    }

    #[test]
    fn names_must_be_hangul() {
        assert!(check_first_name("길동").is_ok());
        assert!(check_last_name("홍").is_ok());
        assert!(check_first_name("ㅎㅎ").is_ok());
        assert_eq!(check_first_name("Gildong"), Err(ValidationError::FirstName));
        assert_eq!(check_last_name("홍1"), Err(ValidationError::LastName));
        assert!(check_first_name("").is_err());
        assert!(check_first_name("홍|길동").is_err());
    }

    #[test]
    fn email_format() {
        assert!(check_email("a@a.com").is_ok());
        assert!(check_email("first.last+tag@example.kr").is_ok());
        assert!(check_email("a@a.info").is_err());
        assert!(check_email("a@sub.example.com").is_err());
        assert!(check_email("no-at-sign.com").is_err());
        assert_eq!(check_email("a@a.c"), Err(ValidationError::Email));
    }

    #[test]
    fn names_and_email_fit_their_columns() {
        assert!(check_first_name(&"가".repeat(50)).is_ok());
        assert_eq!(check_first_name(&"가".repeat(51)), Err(ValidationError::FirstName));
        assert_eq!(check_last_name(&"나".repeat(51)), Err(ValidationError::LastName));

        let local = "a".repeat(44);
        assert!(check_email(&format!("{local}@a.com")).is_ok());
        assert_eq!(check_email(&format!("{local}a@a.com")), Err(ValidationError::Email));
    }

    #[test]
    fn password_strength() {
        assert!(check_password("abcd1234!").is_ok());
        assert!(check_password("P@ssw0rd").is_ok());
        assert_eq!(check_password("abcd123!"), Ok(()));
        assert_eq!(check_password("abc12!"), Err(ValidationError::Password));
        assert!(check_password("abcdefgh!").is_err());
        assert!(check_password("12345678!").is_err());
        assert!(check_password("abcd12345").is_err());
        assert!(check_password("abcd1234!^").is_err());
    }

    #[test]
    fn birth_day_format() {
        assert!(parse_birth_day("1990-02-28").is_ok());
        assert_eq!(parse_birth_day("1990-02-30"), Err(ValidationError::BirthDay));
        assert!(parse_birth_day("19900228").is_err());
    }

    #[test]
    fn codes_match_display() {
        for err in [
            ValidationError::FirstName,
            ValidationError::LastName,
            ValidationError::PhoneNumber,
            ValidationError::Email,
            ValidationError::Password,
            ValidationError::BirthDay,
        ] {
            assert_eq!(err.to_string(), err.code());
        }
    }
}
