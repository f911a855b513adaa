/// User domain type
use super::UserId;
use crate::error::{Result, SpindleError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actor classification; `Admin` bypasses per-record ownership checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SpindleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(SpindleError::invalid_input(format!(
                "Role is either: user or admin (got '{other}')"
            ))),
        }
    }
}

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Login email, stored lowercase
    pub email: String,

    /// Public handle, stored lowercase
    pub username: String,

    pub role: Role,

    /// Deactivated accounts cannot authenticate
    pub active: bool,

    pub location: Option<String>,
    pub fav_genres: Vec<String>,
    pub fav_artists: Vec<String>,
    pub avatar: Option<String>,

    /// Tokens issued before this instant are rejected
    #[serde(skip_serializing)]
    pub password_changed_at: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

/// Public projection of a user attached to hydrated records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub location: Option<String>,
    pub avatar: Option<String>,
}

/// Data for creating a new user; the password is already hashed
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub location: Option<String>,
    pub fav_genres: Vec<String>,
    pub fav_artists: Vec<String>,
}

impl CreateUser {
    /// Lowercase the login fields and check their shape
    pub fn normalized(mut self) -> Result<Self> {
        self.email = normalize_email(&self.email)?;
        self.username = normalize_username(&self.username)?;
        if self.name.trim().is_empty() {
            return Err(SpindleError::invalid_input("Please tell us your name"));
        }
        Ok(self)
    }
}

/// Profile update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub location: Option<String>,
    pub fav_genres: Option<Vec<String>>,
    pub fav_artists: Option<Vec<String>>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl UpdateUser {
    pub fn normalized(mut self) -> Result<Self> {
        if let Some(email) = self.email.as_deref() {
            self.email = Some(normalize_email(email)?);
        }
        if let Some(username) = self.username.as_deref() {
            self.username = Some(normalize_username(username)?);
        }
        Ok(self)
    }
}

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;
/// Upper bound kept from the account schema; bcrypt ignores bytes past 72 anyway
pub const MAX_PASSWORD_LEN: usize = 1024;

/// Check a new password and its confirmation
pub fn validate_new_password(password: &str, confirm: &str) -> Result<()> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(SpindleError::invalid_input(format!(
            "Password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
        )));
    }
    if password != confirm {
        return Err(SpindleError::invalid_input("Passwords do not match"));
    }
    Ok(())
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .map(|(local, domain)| {
            !local.is_empty()
                && !local.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains(char::is_whitespace)
                && !domain.contains('@')
        })
        .unwrap_or(false);

    if valid {
        Ok(email)
    } else {
        Err(SpindleError::invalid_input("Please enter a valid email address"))
    }
}

fn normalize_username(username: &str) -> Result<String> {
    let username = username.trim().to_lowercase();
    if username.is_empty() || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SpindleError::invalid_input("Username is invalid"));
    }
    Ok(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(email: &str, username: &str) -> CreateUser {
        CreateUser {
            name: "Jane".to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            location: None,
            fav_genres: vec![],
            fav_artists: vec![],
        }
    }

    #[test]
    fn login_fields_are_lowercased() {
        let user = create(" Jane@Example.COM ", "JaneDoe").normalized().unwrap();
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.username, "janedoe");
    }

    #[test]
    fn malformed_email_is_rejected() {
        assert!(create("jane.example.com", "jane").normalized().is_err());
        assert!(create("jane@localhost", "jane").normalized().is_err());
    }

    #[test]
    fn username_must_be_alphanumeric() {
        assert!(create("jane@example.com", "jane_doe").normalized().is_err());
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.as_str(), "user");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_new_password("short", "short").is_err());
        assert!(validate_new_password("longenough", "different!").is_err());
        assert!(validate_new_password("longenough", "longenough").is_ok());
    }
}
