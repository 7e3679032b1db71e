use serde::{Deserialize, Serialize};

/// User info returned by Google's userinfo endpoint.
///
/// Deserialized verbatim; any field Google leaves out becomes an empty cell
/// in the signup ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Display subset of [`AuthenticatedUser`] kept in the session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl From<&AuthenticatedUser> for SessionUser {
    fn from(user: &AuthenticatedUser) -> Self {
        SessionUser {
            email: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_userinfo_deserialize_full() {
        let json = r#"{
            "id": "1234567890",
            "email": "user@example.com",
            "name": "Test User",
            "picture": "https://example.com/photo.jpg",
            "verified_email": true
        }"#;
        let user: AuthenticatedUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "1234567890");
        assert_eq!(user.email.as_deref(), Some("user@example.com"));
        assert_eq!(user.name.as_deref(), Some("Test User"));
        assert_eq!(user.picture.as_deref(), Some("https://example.com/photo.jpg"));
    }

    #[test]
    fn test_userinfo_deserialize_missing_fields() {
        let json = r#"{"id": "1234567890"}"#;
        let user: AuthenticatedUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "1234567890");
        assert!(user.email.is_none());
        assert!(user.name.is_none());
        assert!(user.picture.is_none());
    }

    #[test]
    fn test_session_user_from_authenticated_user() {
        let user = AuthenticatedUser {
            id: "42".to_string(),
            email: Some("user@example.com".to_string()),
            name: None,
            picture: Some("https://example.com/p.jpg".to_string()),
        };
        let session_user = SessionUser::from(&user);
        assert_eq!(session_user.email.as_deref(), Some("user@example.com"));
        assert!(session_user.name.is_none());
        assert_eq!(session_user.picture.as_deref(), Some("https://example.com/p.jpg"));
    }
}
