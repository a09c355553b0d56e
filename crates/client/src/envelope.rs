//! JSON envelopes exchanged with the warehouse API.

use serde::{Deserialize, Serialize};

/// `{message, body}`, the shape of every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub body: Option<T>,
}

impl<T> Envelope<T> {
    pub fn new(body: T) -> Self {
        Self {
            message: None,
            body: Some(body),
        }
    }

    pub fn into_body(self) -> Option<T> {
        self.body
    }
}

/// Body of a non-2xx response. Anything that is not JSON yields no message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// The message, if the server sent a non-blank one.
    pub fn into_message(self) -> Option<String> {
        self.message.filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_tolerates_missing_fields() {
        let env: Envelope<Vec<i64>> = serde_json::from_str(r#"{"message":"ok","body":[1,2]}"#).unwrap();
        assert_eq!(env.into_body(), Some(vec![1, 2]));

        let env: Envelope<Vec<i64>> = serde_json::from_str(r#"{"message":"deleted"}"#).unwrap();
        assert_eq!(env.message.as_deref(), Some("deleted"));
        assert_eq!(env.into_body(), None);
    }

    #[test]
    fn error_body_message_is_optional() {
        assert_eq!(
            ErrorBody::parse(r#"{"message":"Zone is not empty"}"#).into_message().as_deref(),
            Some("Zone is not empty")
        );
        assert_eq!(ErrorBody::parse("<html>502</html>").into_message(), None);
        assert_eq!(ErrorBody::parse(r#"{"message":"  "}"#).into_message(), None);
    }
}
