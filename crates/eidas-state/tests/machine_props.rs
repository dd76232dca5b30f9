//! Property tests for the verification machine: arbitrary event sequences
//! never corrupt state, and rejected events leave everything untouched.

use eidas_core::{Challenge, Groth16Proof, Pin, TxHash};
use eidas_state::{
    verification_machine, MachineEvent, VerificationEvent, VerificationEventId, VerificationState,
};
use proptest::prelude::*;

fn event_for(id: VerificationEventId) -> VerificationEvent {
    let hash = || TxHash::new(format!("0x{}", "0f".repeat(32))).unwrap();
    match id {
        VerificationEventId::Link => VerificationEvent::Link,
        VerificationEventId::Inserted => VerificationEvent::Inserted,
        VerificationEventId::Entered => VerificationEvent::Entered {
            pin: Pin::new("123456").unwrap(),
        },
        VerificationEventId::Signed => VerificationEvent::Signed,
        VerificationEventId::Generated => VerificationEvent::Generated {
            proof: Groth16Proof {
                a: [1u64.into(), 2u64.into()],
                b: [[3u64.into(), 4u64.into()], [5u64.into(), 6u64.into()]],
                c: [7u64.into(), 8u64.into()],
                input: Groth16Proof::public_input_for(&Challenge::new("c7ab88b0").unwrap()),
            },
        },
        VerificationEventId::Verify => VerificationEvent::Verify { hash: hash() },
        VerificationEventId::Verified => VerificationEvent::Verified,
        VerificationEventId::Revoke => VerificationEvent::Revoke { hash: hash() },
        VerificationEventId::Revoked => VerificationEvent::Revoked,
    }
}

fn any_event_id() -> impl Strategy<Value = VerificationEventId> {
    proptest::sample::select(VerificationEventId::ALL.to_vec())
}

proptest! {
    #[test]
    fn rejected_events_leave_machine_unchanged(ids in proptest::collection::vec(any_event_id(), 0..40)) {
        let mut machine = verification_machine();
        for id in ids {
            let event = event_for(id);
            prop_assert_eq!(event.id(), id);
            let accepted = machine.can(id);
            let state = machine.current();
            let context = machine.context().clone();
            let taken = machine.history().len();

            match machine.send(event) {
                Ok(next) => {
                    prop_assert!(accepted);
                    prop_assert_eq!(next, machine.current());
                    prop_assert_eq!(machine.history().len(), taken + 1);
                }
                Err(_) => {
                    prop_assert!(!accepted);
                    prop_assert_eq!(machine.current(), state);
                    prop_assert_eq!(machine.context(), &context);
                    prop_assert_eq!(machine.history().len(), taken);
                }
            }
        }
    }

    #[test]
    fn pin_is_only_held_while_signing(ids in proptest::collection::vec(any_event_id(), 0..40)) {
        let mut machine = verification_machine();
        for id in ids {
            let _ = machine.send(event_for(id));
            let holds_pin = machine.context().pin.is_some();
            prop_assert_eq!(holds_pin, machine.current() == VerificationState::Signing);
        }
    }
}
