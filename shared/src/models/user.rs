//! User models

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user; the email doubles as the user id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}
