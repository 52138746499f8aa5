use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct FacebookLoginRequest {
    pub access_token: String,
}

// Response of the Graph API debug_token call
#[derive(Debug, Deserialize)]
pub struct FacebookDebugToken {
    pub data: FacebookDebugTokenData,
}

#[derive(Debug, Deserialize)]
pub struct FacebookDebugTokenData {
    #[serde(default)]
    pub is_valid: bool,
    pub app_id: Option<String>,
    pub user_id: Option<String>,
}

// User info from Facebook
#[derive(Debug, Serialize, Deserialize)]
pub struct FacebookUserInfo {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub picture: Option<FacebookPicture>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FacebookPicture {
    pub data: FacebookPictureData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FacebookPictureData {
    pub url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl FacebookUserInfo {
    pub fn picture_url(&self) -> Option<&str> {
        self.picture.as_ref().map(|picture| picture.data.url.as_str())
    }
}
