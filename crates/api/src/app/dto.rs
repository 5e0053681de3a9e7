use serde::Serialize;
use serde_json::Value;

/// Body of a successful delete.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub const PRODUCT_DELETED: MessageResponse = MessageResponse {
    message: "Product deleted successfully",
};

/// Parse a raw request body into an untyped payload.
///
/// Bodies that are empty or not JSON become `Value::Null`, which the
/// validation schema treats as an empty object.
pub fn parse_payload(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "request body is not valid JSON");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_json_objects() {
        assert_eq!(parse_payload(br#"{"name":"Tablet"}"#), json!({ "name": "Tablet" }));
    }

    #[test]
    fn empty_and_malformed_bodies_become_null() {
        assert_eq!(parse_payload(b""), Value::Null);
        assert_eq!(parse_payload(b"  \n"), Value::Null);
        assert_eq!(parse_payload(b"{name:"), Value::Null);
    }

    #[test]
    fn delete_message_shape() {
        assert_eq!(
            serde_json::to_value(&PRODUCT_DELETED).unwrap(),
            json!({ "message": "Product deleted successfully" })
        );
    }
}
