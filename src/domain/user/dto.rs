use serde::{Deserialize, Serialize};

use crate::domain::media::UploadFile;

/// Parsed registration form; every field is optional until validated
#[derive(Debug, Default, Clone)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<UploadFile>,
    pub cover_image: Option<UploadFile>,
}

/// PATCH /update-account body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}
