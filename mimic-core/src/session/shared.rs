//! Lockable session handle.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SessionConfig;

use super::Session;

/// A session shared between worker threads.
///
/// Only one turn runs at a time; a turn is the closure passed to
/// [`turn`](Self::turn). Cloning yields another handle to the same session.
#[derive(Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::from_session(Session::new(config))
    }

    pub fn from_session(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access to the session.
    pub fn turn<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.inner.lock();
        f(&mut session)
    }

    /// Run `f` if no other turn is in progress.
    pub fn try_turn<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut session = self.inner.try_lock()?;
        Some(f(&mut session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Handler;
    use std::thread;

    #[test]
    fn turns_are_serialized_across_threads() {
        let shared = SharedSession::default();
        let signal = shared.turn(|s| {
            let node = s.create_node();
            s.create_signal(node, "click").unwrap()
        });

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        shared.turn(|s| {
                            let h = s.insert_handler(Handler::client_only("x++;"));
                            s.add_listener(signal, h).unwrap();
                        });
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let count = shared.turn(|s| s.signal(signal).unwrap().listener_count());
        assert_eq!(count, 100);
    }

    #[test]
    fn try_turn_fails_while_locked() {
        let shared = SharedSession::default();
        shared.turn(|_| {
            assert!(shared.try_turn(|_| ()).is_none());
        });
        assert!(shared.try_turn(|_| ()).is_some());
    }
}
