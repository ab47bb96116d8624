//! Input validation for registration and profile payloads.

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{RegisterRequest, UpdateProfileRequest};

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 30;
const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;
// Column widths in the users table.
const MAX_EMAIL_LEN: usize = 255;
const MAX_NAME_LEN: usize = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_name(value: &str, field: &str) -> Result<(), String> {
    let len = value.chars().count();
    if len < MIN_NAME_LEN {
        return Err(format!(
            "{field} must be at least {MIN_NAME_LEN} characters long"
        ));
    }
    if len > MAX_NAME_LEN {
        return Err(format!(
            "{field} must be at most {MAX_NAME_LEN} characters long"
        ));
    }
    Ok(())
}

/// Trims every string field in place, then checks it.
pub fn validate_register_request(req: &mut RegisterRequest) -> Result<(), String> {
    req.username = req.username.trim().to_string();
    req.email = req.email.trim().to_string();
    req.first_name = req.first_name.trim().to_string();
    req.last_name = req.last_name.trim().to_string();
    req.bio = req.bio.trim().to_string();
    req.profile_picture = req.profile_picture.trim().to_string();

    if req.username.is_empty() {
        return Err("username is required".into());
    }
    let username_len = req.username.chars().count();
    if username_len < MIN_USERNAME_LEN {
        return Err(format!(
            "username must be at least {MIN_USERNAME_LEN} characters long"
        ));
    }
    if username_len > MAX_USERNAME_LEN {
        return Err(format!(
            "username must be at most {MAX_USERNAME_LEN} characters long"
        ));
    }

    if req.email.is_empty() {
        return Err("email is required".into());
    }
    if req.email.chars().count() > MAX_EMAIL_LEN {
        return Err(format!(
            "email must be at most {MAX_EMAIL_LEN} characters long"
        ));
    }
    if !is_valid_email(&req.email) {
        return Err("invalid email address".into());
    }

    if req.password.is_empty() {
        return Err("password is required".into());
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }

    check_name(&req.first_name, "first name")?;
    check_name(&req.last_name, "last name")?;
    Ok(())
}

pub fn validate_profile_update(req: &mut UpdateProfileRequest) -> Result<(), String> {
    if let Some(first_name) = req.first_name.as_mut() {
        *first_name = first_name.trim().to_string();
        check_name(first_name, "first name")?;
    }
    if let Some(last_name) = req.last_name.as_mut() {
        *last_name = last_name.trim().to_string();
        check_name(last_name, "last name")?;
    }
    if let Some(bio) = req.bio.as_mut() {
        *bio = bio.trim().to_string();
    }
    if let Some(picture) = req.profile_picture.as_mut() {
        *picture = picture.trim().to_string();
    }
    Ok(())
}
