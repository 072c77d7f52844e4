//! Property-based tests for the Gemini translation layer
//!
//! - Every non-empty history turn becomes exactly one content entry
//! - Roles are mapped user -> "user", assistant -> "model"
//! - Visible text parts survive normalization in order

use super::gemini::{normalize_response, translate_request, GeminiResponse};
use super::types::{LlmMessage, LlmRequest, MessageRole};
use proptest::prelude::*;
use serde_json::json;

fn arb_role() -> impl Strategy<Value = MessageRole> {
    prop_oneof![Just(MessageRole::User), Just(MessageRole::Assistant)]
}

fn arb_message() -> impl Strategy<Value = LlmMessage> {
    (arb_role(), "[a-zA-Z0-9 _.!?,]{0,40}").prop_map(|(role, text)| LlmMessage { role, text })
}

fn arb_request() -> impl Strategy<Value = LlmRequest> {
    (
        prop::option::of("[a-zA-Z ]{1,40}"),
        prop::collection::vec(arb_message(), 0..12),
    )
        .prop_map(|(system, messages)| LlmRequest {
            system,
            messages,
        })
}

proptest! {
    #[test]
    fn translate_keeps_non_empty_turns_in_order(request in arb_request()) {
        let translated = translate_request(&request);
        let expected: Vec<&LlmMessage> =
            request.messages.iter().filter(|m| !m.text.is_empty()).collect();

        prop_assert_eq!(translated.contents.len(), expected.len());
        for (content, msg) in translated.contents.iter().zip(expected) {
            let role = match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            prop_assert_eq!(content.role.as_deref(), Some(role));
            prop_assert_eq!(content.parts.len(), 1);
            prop_assert_eq!(content.parts[0].text.as_deref(), Some(msg.text.as_str()));
        }
        prop_assert_eq!(
            translated.system_instruction.is_some(),
            request.system.is_some()
        );
    }

    #[test]
    fn normalize_concatenates_visible_parts(
        parts in prop::collection::vec(("[a-zA-Z0-9 ]{0,20}", any::<bool>()), 0..8)
    ) {
        let json_parts: Vec<_> = parts
            .iter()
            .map(|(text, thought)| json!({ "text": text, "thought": thought }))
            .collect();
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": json_parts } }]
        }))
        .unwrap();

        let expected: String = parts
            .iter()
            .filter(|(_, thought)| !thought)
            .map(|(text, _)| text.as_str())
            .collect();

        let normalized = normalize_response(resp);
        if expected.is_empty() {
            prop_assert!(normalized.text.is_none());
        } else {
            prop_assert_eq!(normalized.text, Some(expected));
        }
    }
}
