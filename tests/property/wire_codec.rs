//! Property tests for the Sticky Wall wire codec.
//!
//! Checks that:
//! 1. Snapshots carrying arbitrary documents survive encode → decode.
//! 2. Arbitrary client requests survive encode → decode.
//! 3. Random bytes never panic the decoders.
//! 4. Any wire code string parses into an `AuthErrorCode` whose code matches.

use proptest::prelude::*;
use stickywall_proto::auth::AuthErrorCode;
use stickywall_proto::task::{NewTask, PALETTE, Task, TaskColor, TaskId, TaskPatch};
use stickywall_proto::wire::{self, ClientMessage, ServerMessage};

/// Strategy for palette colors.
fn arb_color() -> impl Strategy<Value = TaskColor> {
    (0..PALETTE.len()).prop_map(TaskColor::from_index)
}

/// Strategy for create-request field sets.
fn arb_new_task() -> impl Strategy<Value = NewTask> {
    (
        "[^\x00]{1,64}",
        ".{0,128}",
        prop_oneof![Just(String::new()), "20[0-9]{2}-[01][0-9]-[0-3][0-9]"],
        any::<bool>(),
        any::<u64>(),
        arb_color(),
    )
        .prop_map(
            |(title, description, due_date, completed, created_at, color)| NewTask {
                title,
                description,
                due_date,
                completed,
                created_at,
                color,
            },
        )
}

/// Strategy for stored documents.
fn arb_task() -> impl Strategy<Value = Task> {
    ("[a-f0-9-]{8,36}", arb_new_task()).prop_map(|(id, new)| Task::from_new(TaskId::new(id), new))
}

/// Strategy for partial updates.
fn arb_patch() -> impl Strategy<Value = TaskPatch> {
    (proptest::option::of(".{0,64}"), proptest::option::of(any::<bool>()))
        .prop_map(|(description, completed)| TaskPatch {
            description,
            completed,
        })
}

/// Strategy for client requests.
fn arb_client_message() -> impl Strategy<Value = ClientMessage> {
    prop_oneof![
        (any::<u64>(), arb_new_task()).prop_map(|(request_id, task)| ClientMessage::Create {
            request_id,
            collection: "tasks".to_string(),
            task,
        }),
        (any::<u64>(), "[a-f0-9]{8}", arb_patch()).prop_map(|(request_id, id, patch)| {
            ClientMessage::Update {
                request_id,
                collection: "tasks".to_string(),
                id: TaskId::new(id),
                patch,
            }
        }),
        (any::<u64>(), "[a-f0-9]{8}").prop_map(|(request_id, id)| ClientMessage::Delete {
            request_id,
            collection: "tasks".to_string(),
            id: TaskId::new(id),
        }),
        (any::<u64>(), ".{0,32}", ".{0,32}").prop_map(|(request_id, email, password)| {
            ClientMessage::SignIn {
                request_id,
                email,
                password,
            }
        }),
        any::<u64>().prop_map(|subscription_id| ClientMessage::Unsubscribe { subscription_id }),
    ]
}

proptest! {
    /// A snapshot of any documents survives an encode → decode round-trip.
    #[test]
    fn snapshot_round_trip(
        subscription_id in any::<u64>(),
        tasks in prop::collection::vec(arb_task(), 0..16),
    ) {
        let msg = ServerMessage::Snapshot { subscription_id, tasks };
        let bytes = wire::encode_server(&msg).expect("encode should succeed");
        let decoded = wire::decode_server(&bytes).expect("decode should succeed");
        prop_assert_eq!(msg, decoded);
    }

    /// Any client request survives an encode → decode round-trip.
    #[test]
    fn client_message_round_trip(msg in arb_client_message()) {
        let bytes = wire::encode_client(&msg).expect("encode should succeed");
        let decoded = wire::decode_client(&bytes).expect("decode should succeed");
        prop_assert_eq!(msg, decoded);
    }

    /// Random bytes never cause a panic when decoded.
    #[test]
    fn random_bytes_decode_no_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = wire::decode_server(&bytes);
        let _ = wire::decode_client(&bytes);
    }

    /// Every code string maps to a variant that reports the same code.
    #[test]
    fn auth_code_parse_is_lossless(code in "[a-z/-]{0,40}") {
        let parsed = AuthErrorCode::from_code(&code);
        prop_assert_eq!(parsed.as_code(), code.as_str());
    }
}
