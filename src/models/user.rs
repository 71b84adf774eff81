use serde::{Deserialize, Serialize};

/// Identity of the logged-in user as kept on the client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserItem {
    pub is_authenticated: bool,
    pub id: String,
    pub email: String,
    pub user_name: String,
    #[serde(default)]
    pub profile_image: String,
}

/// User record as the backend sends it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    pub user_name: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl From<BackendUser> for AuthUserItem {
    fn from(user: BackendUser) -> Self {
        AuthUserItem {
            is_authenticated: true,
            id: user.id,
            email: user.email,
            user_name: user.user_name,
            profile_image: user.profile_image.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub user: BackendUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_reply_maps_to_authenticated_identity() {
        let json = r#"{"status":"success","user":{"_id":"u1","email":"a@b.io","userName":"ana"}}"#;
        let reply: UserResponse = serde_json::from_str(json).unwrap();
        let user = AuthUserItem::from(reply.user);
        assert!(user.is_authenticated);
        assert_eq!(user.id, "u1");
        assert_eq!(user.profile_image, "");
    }
}
