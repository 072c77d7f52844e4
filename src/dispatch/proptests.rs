//! Property-based tests for the dispatch controller
//!
//! - Every admitted turn adds exactly two entries: the user message and
//!   then either the reply or an error entry
//! - Blank submissions change nothing and never reach the gateway
//! - The in-flight flag is always clear once a turn has completed

use super::*;
use crate::conversation::Sender;
use crate::llm::LlmError;
use crate::session::testing::MockAssistant;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Reply { text: String, reply: String },
    Fail { text: String, reason: String },
    Blank { text: String },
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        ("[a-zA-Z0-9?!]{1,20}", "[a-zA-Z0-9 .]{1,30}")
            .prop_map(|(text, reply)| Step::Reply { text, reply }),
        ("[a-zA-Z0-9?!]{1,20}", "[a-z ]{1,20}")
            .prop_map(|(text, reason)| Step::Fail { text, reason }),
        "[ \t\n]{0,5}".prop_map(|text| Step::Blank { text }),
    ]
}

fn run<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(fut)
}

proptest! {
    #[test]
    fn transcript_grows_by_two_per_admitted_turn(steps in prop::collection::vec(arb_step(), 0..16)) {
        let (state, sent) = run(async {
            let mock = MockAssistant::new();
            let controller = ChatController::new(SessionGateway::new(mock.clone(), "m", "p"));
            controller.initialize().await;

            for step in &steps {
                let before = controller.snapshot();
                match step {
                    Step::Reply { text, reply } => {
                        mock.queue_reply(reply.clone());
                        controller.submit(text).await.unwrap();
                    }
                    Step::Fail { text, reason } => {
                        mock.queue_error(LlmError::network(reason.clone()));
                        controller.submit(text).await.unwrap();
                    }
                    Step::Blank { text } => {
                        assert_eq!(controller.submit(text).await.err(), Some(RejectReason::EmptyText));
                        assert_eq!(controller.snapshot(), before);
                        continue;
                    }
                }
                let after = controller.snapshot();
                assert_eq!(after.messages.len(), before.messages.len() + 2);
                assert!(!after.is_awaiting_reply);
            }
            (controller.snapshot(), mock.sent())
        });

        let admitted: Vec<&Step> = steps
            .iter()
            .filter(|s| !matches!(s, Step::Blank { .. }))
            .collect();
        prop_assert_eq!(state.messages.len(), 1 + 2 * admitted.len());
        prop_assert_eq!(sent.len(), admitted.len());

        for (i, step) in admitted.iter().enumerate() {
            let user = &state.messages[1 + 2 * i];
            let answer = &state.messages[2 + 2 * i];
            prop_assert_eq!(user.sender(), Sender::User);
            prop_assert_eq!(answer.sender(), Sender::Assistant);
            match step {
                Step::Reply { text, reply } => {
                    prop_assert_eq!(user.text(), text.as_str());
                    prop_assert_eq!(answer.text(), reply.as_str());
                }
                Step::Fail { text, reason } => {
                    prop_assert_eq!(user.text(), text.as_str());
                    prop_assert!(answer.text().contains(reason.as_str()));
                }
                Step::Blank { .. } => unreachable!(),
            }
        }

        let last_failed = matches!(admitted.last(), Some(Step::Fail { .. }));
        prop_assert_eq!(state.last_error.is_some(), last_failed);
    }

    #[test]
    fn message_ids_are_unique(count in 1usize..10) {
        let state = run(async {
            let mock = MockAssistant::new();
            let controller = ChatController::new(SessionGateway::new(mock.clone(), "m", "p"));
            controller.initialize().await;
            for i in 0..count {
                mock.queue_reply(format!("reply {i}"));
                controller.submit("same text").await.unwrap();
            }
            controller.snapshot()
        });

        let ids: std::collections::HashSet<_> = state.messages.iter().map(Message::id).collect();
        prop_assert_eq!(ids.len(), state.messages.len());
    }
}
