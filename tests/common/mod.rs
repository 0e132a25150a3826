#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;

use warm_pool::Manager;

/// A stand-in for an expensive session: only carries its creation id.
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    pub id: usize,
}

/// Manager that counts calls and can be told to fail.
#[derive(Debug, Default)]
pub struct CountingManager {
    pub created: AtomicUsize,
    pub disposed: Mutex<Vec<usize>>,
    /// Fail the n-th creation (1-based) when set.
    pub fail_create_at: Option<usize>,
    /// Fail disposal of these session ids.
    pub fail_dispose: Vec<usize>,
}

impl CountingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create_at(n: usize) -> Self {
        Self {
            fail_create_at: Some(n),
            ..Self::default()
        }
    }

    pub fn failing_dispose(ids: Vec<usize>) -> Self {
        Self {
            fail_dispose: ids,
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(SeqCst)
    }

    pub fn disposed(&self) -> Vec<usize> {
        let mut ids = self.disposed.lock().unwrap().clone();
        ids.sort_unstable();
        ids
    }
}

impl Manager for CountingManager {
    type Resource = Session;
    type Error = String;

    fn create(&self) -> Result<Session, String> {
        let id = self.created.fetch_add(1, SeqCst) + 1;
        if self.fail_create_at == Some(id) {
            return Err(format!("browser {id} failed to launch"));
        }
        Ok(Session { id })
    }

    fn dispose(&self, session: Session) -> Result<(), String> {
        self.disposed.lock().unwrap().push(session.id);
        if self.fail_dispose.contains(&session.id) {
            return Err(format!("browser {} failed to close", session.id));
        }
        Ok(())
    }
}

/// Poll `cond` until it holds, failing the test after five seconds.
pub fn wait_until(cond: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while !cond() {
        assert!(std::time::Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
}
