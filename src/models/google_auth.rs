use serde::{Deserialize, Serialize};

pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    /// ID token obtained by the client from Google Sign-In.
    pub token: String,
}

// Claims returned by Google's tokeninfo endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct GoogleTokenInfo {
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub email_verified: bool,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

// tokeninfo reports booleans as "true"/"false" strings.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text.eq_ignore_ascii_case("true"),
    })
}
