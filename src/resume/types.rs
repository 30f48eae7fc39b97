//! Resume document definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::account::AccountId;
use crate::error::ServiceError;

/// Resume identifier - global sequence, not per owner
pub type ResumeId = u64;

/// Caller-supplied fields, stored verbatim
pub type Payload = Map<String, Value>;

/// Keys the store owns; callers cannot set them through a payload
pub const RESERVED_KEYS: [&str; 4] = ["id", "userId", "createdAt", "updatedAt"];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Resume {
    pub id: ResumeId,
    #[serde(rename = "userId")]
    pub owner: AccountId,

    #[serde(flatten)]
    pub payload: Payload,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Turn a request body into a payload: it must be a JSON object, and
/// reserved keys are dropped.
pub fn payload_from_value(value: Value) -> Result<Payload, ServiceError> {
    match value {
        Value::Object(mut fields) => {
            for key in RESERVED_KEYS {
                fields.remove(key);
            }
            Ok(fields)
        }
        _ => Err(ServiceError::Validation(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_strips_reserved_keys() {
        let payload = payload_from_value(json!({
            "id": 99,
            "userId": 2,
            "createdAt": "1970-01-01T00:00:00Z",
            "title": "Engineer",
        }))
        .unwrap();

        assert_eq!(payload.len(), 1);
        assert_eq!(payload["title"], "Engineer");
    }

    #[test]
    fn test_payload_must_be_object() {
        for body in [json!([1, 2]), json!("text"), json!(null), json!(5)] {
            assert!(matches!(
                payload_from_value(body),
                Err(ServiceError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_wire_shape_is_flat() {
        let now = Utc::now();
        let mut payload = Payload::new();
        payload.insert("title".to_string(), json!("Engineer"));
        let resume = Resume {
            id: 5,
            owner: 1,
            payload,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&resume).unwrap();
        assert_eq!(value["id"], 5);
        assert_eq!(value["userId"], 1);
        assert_eq!(value["title"], "Engineer");
        assert!(value["createdAt"].is_string());
        assert!(value.get("payload").is_none());
    }
}
