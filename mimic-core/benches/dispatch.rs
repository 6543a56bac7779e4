//! Benchmarks for script composition and event dispatch.
//!
//! Run with: `cargo bench --package mimic-core --bench dispatch`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mimic_core::{
    ClientEvent, CollectingLearner, Handler, RoundTripCall, Session, SignalId,
};
use std::hint::black_box;

// ============================================================================
// Fixtures
// ============================================================================

/// A session with one signal carrying `learned` client-only handlers and
/// one dynamic handler.
fn session_with_handlers(learned: usize) -> (Session, SignalId) {
    let mut session = Session::default();
    let node = session.create_node();
    let signal = session
        .create_signal(node, "click")
        .expect("node exists");
    for i in 0..learned {
        let h = session.insert_handler(Handler::client_only(format!("v{}++;", i)));
        session.add_listener(signal, h).expect("ids are valid");
    }
    let h = session.insert_handler(Handler::dynamic(|event| {
        black_box(event.client_x);
    }));
    session.add_listener(signal, h).expect("ids are valid");
    session
        .set_prevent_default(signal, true)
        .expect("signal exists");
    (session, signal)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_script(c: &mut Criterion) {
    let mut group = c.benchmark_group("script");
    for handlers in [1usize, 8, 64] {
        let (session, signal) = session_with_handlers(handlers);
        group.bench_with_input(BenchmarkId::new("compose", handlers), &handlers, |b, _| {
            b.iter(|| black_box(session.script(signal).expect("signal exists")));
        });

        let call = RoundTripCall::with_args(["1", "2"]).expect("two arguments");
        group.bench_with_input(BenchmarkId::new("round_trip", handlers), &handlers, |b, _| {
            b.iter(|| black_box(session.round_trip_call(signal, &call).expect("signal exists")));
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    for handlers in [1usize, 8, 64] {
        let (mut session, signal) = session_with_handlers(handlers);
        let event = ClientEvent::for_signal(signal.to_wire());
        let mut learner = CollectingLearner::default();
        group.bench_with_input(
            BenchmarkId::new("client_event", handlers),
            &handlers,
            |b, _| {
                b.iter(|| black_box(session.handle_client_event(&event, &mut learner)));
            },
        );
    }
    group.finish();
}

fn bench_wire_id(c: &mut Criterion) {
    c.bench_function("wire_id/parse", |b| {
        b.iter(|| black_box(SignalId::parse_wire(black_box("s1f3a"))))
    });
}

criterion_group!(benches, bench_script, bench_dispatch, bench_wire_id);
criterion_main!(benches);
