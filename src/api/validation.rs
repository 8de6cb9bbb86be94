//! Shape checks on request fields, applied before a service is called

use crate::error::ApiError;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

pub fn name(field: &str, value: &str) -> Result<(), ApiError> {
    bounded(field, value, MAX_NAME_LEN)
}

pub fn description(field: &str, value: &str) -> Result<(), ApiError> {
    bounded(field, value, MAX_DESCRIPTION_LEN)
}

pub fn username(value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::bad_request("username is empty"));
    }
    Ok(())
}

pub fn version(value: i32) -> Result<(), ApiError> {
    if value < 1 {
        return Err(ApiError::bad_request("invalid version, min = 1"));
    }
    Ok(())
}

fn bounded(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{field} is empty")));
    }
    if value.chars().count() > max {
        return Err(ApiError::bad_request(format!(
            "{field} is too long, maxLength={max}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_be_present_and_short() {
        assert!(name("tenderName", "Pipes").is_ok());
        assert!(name("tenderName", "").is_err());
        assert!(name("tenderName", &"x".repeat(100)).is_ok());
        assert!(name("tenderName", &"x".repeat(101)).is_err());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(description("bidDescription", &"ж".repeat(500)).is_ok());
        assert!(description("bidDescription", &"ж".repeat(501)).is_err());
    }

    #[test]
    fn versions_start_at_one() {
        assert!(version(1).is_ok());
        assert!(version(0).is_err());
    }
}
