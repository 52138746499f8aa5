use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Tourist,
    Guide,
    Agency,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Tourist => "tourist",
            UserRole::Guide => "guide",
            UserRole::Agency => "agency",
            UserRole::Admin => "admin",
        }
    }

    /// Only agencies wait for an admin before they can operate.
    pub fn requires_approval(&self) -> bool {
        matches!(self, UserRole::Agency)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tourist" => Ok(UserRole::Tourist),
            "guide" => Ok(UserRole::Guide),
            "agency" => Ok(UserRole::Agency),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Email,
    Google,
    Facebook,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Email => "email",
            AuthProvider::Google => "google",
            AuthProvider::Facebook => "facebook",
        }
    }
}

/// What a social provider vouches for once its token has been verified.
#[derive(Debug, Clone)]
pub struct SocialIdentity {
    pub provider: AuthProvider,
    pub subject: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String, // Always hashed
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_approved: bool,
    pub is_active: bool,
    pub is_staff: bool,
    pub provider: AuthProvider,
    // Left out of the document when absent so the sparse unique indexes hold.
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
    pub last_signin: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_signins: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        let mut account = Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            password: password_hash,
            first_name: None,
            last_name: None,
            phone_number: None,
            profile_image: None,
            role,
            is_verified: false,
            is_approved: false,
            is_active: true,
            is_staff: false,
            provider: AuthProvider::Email,
            google_id: None,
            facebook_id: None,
            last_signin: None,
            failed_signins: 0,
            created_at: now,
            updated_at: now,
        };
        account.apply_role_defaults();
        account
    }

    /// Role-driven flags applied on creation. Admins are staff. Only tourists
    /// and admins start approved and verified; guides and agencies start
    /// unapproved.
    pub fn apply_role_defaults(&mut self) {
        match self.role {
            UserRole::Admin => {
                self.is_staff = true;
                self.is_approved = true;
                self.is_verified = true;
            }
            UserRole::Tourist => {
                self.is_approved = true;
                self.is_verified = true;
            }
            UserRole::Guide | UserRole::Agency => {
                self.is_approved = false;
                self.is_verified = false;
            }
        }
    }

    pub fn can_book_services(&self) -> bool {
        self.role == UserRole::Tourist && self.is_active && self.is_approved
    }

    pub fn can_manage_services(&self) -> bool {
        matches!(self.role, UserRole::Agency | UserRole::Admin) && self.is_active && self.is_approved
    }

    pub fn full_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Public projection of an account; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: UserRole,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: bool,
    pub is_approved: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            user_type: account.role,
            phone_number: account.phone_number.clone(),
            profile_image: account.profile_image.clone(),
            is_verified: account.is_verified,
            is_approved: account.is_approved,
            is_active: account.is_active,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "must be between 3 and 150 characters"))]
    pub username: String,
    #[validate(email(message = "enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    pub password_confirm: String,
    #[validate(length(min = 1, message = "this field is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "this field is required"))]
    pub last_name: String,
    #[validate(length(min = 5, max = 15, message = "must be between 5 and 15 characters"))]
    pub phone_number: String,
    #[serde(default = "default_user_type")]
    pub user_type: UserRole,
}

fn default_user_type() -> UserRole {
    UserRole::Tourist
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "this field is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub role: Option<UserRole>,
    pub is_approved: Option<bool>,
    pub is_active: Option<bool>,
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        self.role.map_or(true, |role| account.role == role)
            && self.is_approved.map_or(true, |flag| account.is_approved == flag)
            && self.is_active.map_or(true, |flag| account.is_active == flag)
    }
}
