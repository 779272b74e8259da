use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity handed to `launch` by the caller.
///
/// The token-exchange flow that produces this lives outside the crate;
/// here it is opaque and read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub uuid: String,
    pub access_token: String,
    /// Secondary hash id, when the account system provides one.
    #[serde(default)]
    pub xuid: Option<String>,
}

impl Credential {
    /// Offline identity for launches without an account backend.
    pub fn offline(username: &str) -> Self {
        Self {
            username: username.trim().to_string(),
            uuid: Uuid::new_v4().to_string(),
            access_token: "offline_access_token".into(),
            xuid: None,
        }
    }

    /// Legacy session token of the form `token:<access-token>:<uuid>`.
    pub fn session_token(&self) -> String {
        format!("token:{}:{}", self.access_token, self.uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_format() {
        let credential = Credential {
            username: "Steve".into(),
            uuid: "uuid-1".into(),
            access_token: "tok".into(),
            xuid: None,
        };
        assert_eq!(credential.session_token(), "token:tok:uuid-1");
    }
}
