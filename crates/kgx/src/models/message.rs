use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A role-tagged unit of text sent to an LLM
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system instruction message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let message = Message::system("Be strict.");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "Be strict."}));

        let user = Message::user("Hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(serde_json::to_value(&user).unwrap()["role"], "user");
    }
}
