//! Property-based tests for the saga state machine.
//!
//! Uses proptest to generate random message sequences and verify the
//! machine's universal invariants hold across interleavings that unit
//! tests might miss: monotonicity, purity, replay determinism, and
//! rejection stickiness.

use proptest::prelude::*;

use sagalog_core::{apply_message, replay, SagaId, SagaMessage, SagaState, TaskId};

fn saga_id() -> SagaId {
    SagaId::from("prop-saga")
}

/// Strategy for optional opaque payloads.
fn arbitrary_payload() -> impl Strategy<Value = Option<Vec<u8>>> {
    prop::option::of(prop::collection::vec(any::<u8>(), 0..16))
}

/// Strategy for task ids drawn from a small pool, so sequences revisit the
/// same task often enough to exercise the flag lattice.
fn arbitrary_task_id() -> impl Strategy<Value = TaskId> {
    prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(TaskId::from)
}

/// Strategy for any message addressed to the saga, legal or not. Roughly
/// half of a random sequence gets rejected, which is the point: properties
/// must hold on exactly the accepted prefix.
fn arbitrary_message() -> impl Strategy<Value = SagaMessage> {
    (0..7u8, arbitrary_task_id(), arbitrary_payload()).prop_map(|(kind, task_id, data)| {
        let id = saga_id();
        match kind {
            0 => SagaMessage::start_saga(id, data),
            1 => SagaMessage::end_saga(id),
            2 => SagaMessage::abort_saga(id),
            3 => SagaMessage::start_task(id, task_id, data),
            4 => SagaMessage::end_task(id, task_id, data),
            5 => SagaMessage::start_comp_task(id, task_id, data),
            _ => SagaMessage::end_comp_task(id, task_id, data),
        }
    })
}

fn message_sequences() -> impl Strategy<Value = Vec<SagaMessage>> {
    prop::collection::vec(arbitrary_message(), 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: every bit set in a state stays set in any accepted
    /// successor, and the saga booleans only go false → true.
    #[test]
    fn accepted_transitions_are_monotonic(msgs in message_sequences()) {
        let mut state = SagaState::new(saga_id(), None).unwrap();

        for msg in &msgs {
            if let Ok(next) = apply_message(&state, msg) {
                for task_id in state.task_ids() {
                    prop_assert!(
                        next.task_flags(&task_id).contains(state.task_flags(&task_id)),
                        "flags lost on task {} applying {:?}",
                        task_id,
                        msg.msg_type
                    );
                }
                prop_assert!(!state.is_saga_aborted() || next.is_saga_aborted());
                prop_assert!(!state.is_saga_completed() || next.is_saga_completed());
                state = next;
            }
        }
    }

    /// Property: the transition function never mutates its input and is
    /// deterministic for a fixed (state, message) pair.
    #[test]
    fn apply_message_is_pure(msgs in message_sequences()) {
        let mut state = SagaState::new(saga_id(), None).unwrap();

        for msg in &msgs {
            let before = state.clone();
            let first = apply_message(&state, msg);
            prop_assert_eq!(&state, &before, "input state mutated by {:?}", msg.msg_type);

            let second = apply_message(&state, msg);
            prop_assert_eq!(&first, &second);

            if let Ok(next) = first {
                state = next;
            }
        }
    }

    /// Property: recovery from the journal of accepted messages yields
    /// exactly the forward-computed state.
    #[test]
    fn replay_matches_forward_fold(msgs in message_sequences(), job in arbitrary_payload()) {
        let mut journal = vec![SagaMessage::start_saga(saga_id(), job.clone())];
        let mut state = SagaState::new(saga_id(), job).unwrap();

        for msg in msgs {
            if let Ok(next) = apply_message(&state, &msg) {
                journal.push(msg);
                state = next;
            }
        }

        prop_assert_eq!(replay(&journal).unwrap(), state);
    }

    /// Property: a rejection does not depend on how the state was reached.
    /// If a message is rejected against some state, replaying the journal
    /// that produced that state plus the message is rejected too.
    #[test]
    fn rejections_are_sticky(msgs in message_sequences(), job in arbitrary_payload()) {
        let mut journal = vec![SagaMessage::start_saga(saga_id(), job.clone())];
        let mut state = SagaState::new(saga_id(), job).unwrap();

        for msg in msgs {
            match apply_message(&state, &msg) {
                Ok(next) => {
                    journal.push(msg);
                    state = next;
                }
                Err(_) => {
                    let mut poisoned = journal.clone();
                    poisoned.push(msg);
                    prop_assert!(replay(&poisoned).is_err());
                }
            }
        }
    }
}
