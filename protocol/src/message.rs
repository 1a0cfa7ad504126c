use serde::{Deserialize, Serialize};

/// Who authored a chat message. Only these two values exist on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// A message as shown in the chat widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(id: String, role: Role, content: impl Into<String>) -> Self {
        Self { id, role, content: content.into() }
    }

    pub fn to_turn(&self) -> ChatTurn {
        ChatTurn { role: self.role, content: self.content.clone() }
    }
}

/// One history entry as sent to the relay (no id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Request body of `POST /api/ai-chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub messages: Vec<ChatTurn>,
}

/// JSON body of every relay error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_lowercase_roles() {
        let req = RelayRequest {
            messages: vec![
                ChatTurn { role: Role::User, content: "Здравей".into() },
                ChatTurn { role: Role::Assistant, content: "Здрасти!".into() },
            ],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["messages"][1]["content"], "Здрасти!");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = serde_json::from_str::<RelayRequest>(
            r#"{"messages":[{"role":"system","content":"x"}]}"#,
        );
        assert!(err.is_err());
        assert!(Role::try_from("model").is_err());
        assert_eq!(Role::try_from("assistant"), Ok(Role::Assistant));
    }

    #[test]
    fn null_content_is_rejected() {
        let err = serde_json::from_str::<RelayRequest>(
            r#"{"messages":[{"role":"user","content":null}]}"#,
        );
        assert!(err.is_err());
    }
}
