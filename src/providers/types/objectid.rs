use uuid::Uuid;

/// Prefixed random identifier, e.g. `msg_4f1c...`
pub fn create_object_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Identifier in the shape the chat-completion endpoint uses for tool calls
pub fn create_call_id() -> String {
    create_object_id("call")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_object_id_format() {
        let id = create_object_id("msg");
        assert!(id.starts_with("msg_"), "ID should start with 'msg_'");
        assert_eq!(id.len(), "msg_".len() + 32);
        assert!(id["msg_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_call_ids_are_unique() {
        let first = create_call_id();
        let second = create_call_id();
        assert!(first.starts_with("call_"));
        assert_ne!(first, second, "Generated IDs should be unique");
    }
}
