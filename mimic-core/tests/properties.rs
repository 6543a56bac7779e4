//! Property-based tests
//!
//! Invariants of attach/detach, exposure and wire identity under arbitrary
//! operation sequences.

use proptest::prelude::*;

use mimic_core::{Handler, HandlerKind, Session, SessionConfig, SignalId};

#[derive(Debug, Clone, Copy)]
enum Op {
    Attach(usize),
    Detach(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4).prop_map(Op::Attach),
        (0usize..4).prop_map(Op::Detach),
    ]
}

fn handler_for(index: usize) -> Handler {
    match index {
        0 => Handler::client_only("x++;"),
        1 => Handler::auto_learn(|| {}),
        2 => Handler::pre_learn(|| {}, || {}),
        _ => Handler::dynamic(|_| {}),
    }
}

proptest! {
    /// Wire tokens round-trip and are unique per ID.
    #[test]
    fn prop_wire_id_roundtrip(raw in any::<u64>()) {
        let id = SignalId::from_raw(raw);
        let token = id.to_wire();

        prop_assert_eq!(SignalId::parse_wire(&token), Ok(id));
        prop_assert_eq!(token, format!("s{:x}", raw));
    }

    /// Zero-padded tokens never resolve.
    #[test]
    fn prop_padded_wire_id_rejected(raw in any::<u64>()) {
        let padded = format!("s0{:x}", raw);
        prop_assert!(SignalId::parse_wire(&padded).is_err());
    }

    /// With the expose-all policy on, a signal is registered iff it has a
    /// handler that needs the server; `connected` tracks the handler count.
    #[test]
    fn prop_exposure_matches_server_handlers(ops in prop::collection::vec(op(), 0..40)) {
        let mut session = Session::default();
        let node = session.create_node();
        let signal = session.create_signal(node, "click").unwrap();
        let handlers: Vec<_> = (0..4)
            .map(|i| session.insert_handler(handler_for(i)))
            .collect();

        let mut attached = [false; 4];
        for op in ops {
            match op {
                Op::Attach(i) => {
                    let added = session.add_listener(signal, handlers[i]).unwrap();
                    prop_assert_eq!(added, !attached[i]);
                    attached[i] = true;
                }
                Op::Detach(i) => {
                    let removed = session.remove_listener(signal, handlers[i]).unwrap();
                    prop_assert_eq!(removed, attached[i]);
                    attached[i] = false;
                }
            }

            let s = session.signal(signal).unwrap();
            let count = attached.iter().filter(|a| **a).count();
            prop_assert_eq!(s.listener_count(), count);
            prop_assert_eq!(s.is_connected(), count > 0);

            let needs_server = attached[1..].iter().any(|a| *a);
            prop_assert_eq!(session.registry().contains(signal), needs_server);
            prop_assert_eq!(s.is_exposed(), needs_server);
            prop_assert!(session.registry().len() <= 1);
        }
    }

    /// Without the policy, a learned server handler alone never exposes a
    /// signal.
    #[test]
    fn prop_learned_handlers_stay_client_side(kinds in prop::collection::vec(1usize..3, 1..6)) {
        let mut session = Session::new(SessionConfig {
            always_expose_signals: false,
            ..SessionConfig::default()
        });
        let node = session.create_node();
        let signal = session.create_signal(node, "click").unwrap();

        let mut learner = mimic_core::CollectingLearner::default();
        for kind in kinds {
            let h = session.insert_handler(handler_for(kind));
            let other = session.create_signal(node, "warmup").unwrap();
            session.add_listener(other, h).unwrap();
            session.process_pre_learn(other, &mut learner).unwrap();
            session.process_auto_learn(other, &mut learner).unwrap();
            prop_assert!(session.handler(h).unwrap().is_learned());
            prop_assert!(session.handler(h).unwrap().kind() != HandlerKind::ClientOnly);

            session.add_listener(signal, h).unwrap();
            prop_assert!(!session.registry().contains(signal));
        }
    }
}
