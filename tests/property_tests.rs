//! Property-based tests for toolwire
//!
//! These tests verify invariants that must hold for all inputs:
//! - Decoding never panics
//! - Request ids are echoed exactly
//! - Noise on the wire never desynchronises a session
//! - Prompt rendering substitutes each placeholder exactly once
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use toolwire::mcp::{
    decode_line, DispatchOutcome, Dispatcher, Envelope, McpServer, PromptArgument,
    PromptDefinition, ServerContext,
};
use toolwire::tools::EchoTool;

fn dispatcher() -> Dispatcher {
    Dispatcher::new(ServerContext::builder("prop", "0").tool(EchoTool).build())
}

fn id_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9_-]{0,24}".prop_map(Value::from),
    ]
}

fn run_session(input: String) -> Vec<Value> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async move {
        let (_tx, rx) = tokio::sync::watch::channel(false);
        let mut output = Vec::new();
        McpServer::new(dispatcher())
            .run(input.as_bytes(), &mut output, rx)
            .await
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    })
}

// ============================================================================
// CODEC TESTS
// ============================================================================

proptest! {
    /// Invariant: decode_line never panics on any string input
    #[test]
    fn decode_never_panics(s in "\\PC*") {
        let _ = decode_line(&s);
    }

    /// Invariant: an envelope's id survives encode/decode untouched, and an
    /// absent id stays absent
    #[test]
    fn id_presence_preserved(id in proptest::option::of(id_strategy()), method in "[a-z/]{1,20}") {
        let envelope = match id.clone() {
            Some(id) => Envelope::request(id, method, None),
            None => Envelope::notification(method, None),
        };
        let line = serde_json::to_string(&envelope).unwrap();
        match decode_line(&line).unwrap() {
            toolwire::mcp::Decoded::Envelope(decoded) => prop_assert_eq!(decoded.id, id),
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }
}

// ============================================================================
// DISPATCH TESTS
// ============================================================================

proptest! {
    /// Invariant: every request gets exactly one response echoing its id,
    /// with exactly one of result/error
    #[test]
    fn requests_always_answered(id in id_strategy(), method in "[a-z/]{1,20}") {
        let outcome = dispatcher().dispatch(&Envelope::request(id.clone(), method, Some(json!({}))));
        match outcome {
            DispatchOutcome::Responded(response) => {
                prop_assert_eq!(response.id, id);
                prop_assert!(response.result.is_some() != response.error.is_some());
            }
            DispatchOutcome::Suppressed => prop_assert!(false, "request suppressed"),
        }
    }

    /// Invariant: notifications are never answered
    #[test]
    fn notifications_never_answered(method in "[a-z/]{1,20}") {
        let outcome = dispatcher().dispatch(&Envelope::notification(method, None));
        prop_assert_eq!(outcome, DispatchOutcome::Suppressed);
    }

    /// Invariant: echo returns whatever message it was given
    #[test]
    fn echo_round_trips_text(message in "\\PC{0,64}") {
        let envelope = Envelope::request(
            json!(1),
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"message": message.clone()}})),
        );
        match dispatcher().dispatch(&envelope) {
            DispatchOutcome::Responded(response) => {
                let result = response.result.expect("echo succeeds");
                prop_assert_eq!(&result["structuredContent"]["message"], &json!(message));
            }
            DispatchOutcome::Suppressed => prop_assert!(false, "request suppressed"),
        }
    }
}

// ============================================================================
// SESSION TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Invariant: noise lines between requests never cost a response
    #[test]
    fn noise_does_not_desynchronise(
        noise in proptest::collection::vec("[^\\n\\r{}\\[\\]\"]{0,40}", 0..6),
        ids in proptest::collection::vec(any::<u32>(), 1..6),
    ) {
        let mut lines = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            if let Some(junk) = noise.get(i) {
                lines.push(format!("{{{}", junk));
            }
            lines.push(json!({"jsonrpc": "2.0", "id": id, "method": "ping"}).to_string());
        }

        let responses = run_session(lines.join("\n"));
        let echoed: Vec<Value> = responses.iter().map(|r| r["id"].clone()).collect();
        let expected: Vec<Value> = ids.iter().map(|id| json!(id)).collect();
        prop_assert_eq!(echoed, expected);
    }
}

// ============================================================================
// PROMPT TESTS
// ============================================================================

proptest! {
    /// Invariant: each placeholder is replaced exactly once, left to right,
    /// and supplied values are never expanded again
    #[test]
    fn render_substitutes_each_placeholder_once(
        subject in "[a-z{} ]{1,20}",
        style in proptest::option::of("[a-z{} ]{0,20}"),
    ) {
        let prompt = PromptDefinition::new("p", "P", "p", "{{subject}} / {{style}} / {{subject}}")
            .with_argument(PromptArgument::required("subject", "s"))
            .with_argument(PromptArgument::optional("style", "s"));

        let mut args = Map::new();
        args.insert("subject".to_string(), json!(subject));
        if let Some(style) = &style {
            args.insert("style".to_string(), json!(style));
        }

        let text = prompt.render(&args).unwrap();
        let expected = format!("{} / {} / {}", subject, style.unwrap_or_default(), subject);
        prop_assert_eq!(text, expected);
    }
}
