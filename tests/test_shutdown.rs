mod common;

use std::sync::{Arc, Mutex, OnceLock, Weak, mpsc};

use common::{CountingManager, Session, wait_until};
use warm_pool::{Manager, Pool, State};

/// Releases a parked session back into its pool from inside `dispose`.
#[derive(Default)]
struct ReleasingManager {
    inner: CountingManager,
    pool: OnceLock<Weak<Pool<ReleasingManager>>>,
    parked: Mutex<Option<Session>>,
}

impl Manager for ReleasingManager {
    type Resource = Session;
    type Error = String;

    fn create(&self) -> Result<Session, String> {
        self.inner.create()
    }

    fn dispose(&self, session: Session) -> Result<(), String> {
        let parked = self.parked.lock().unwrap().take();
        if let (Some(parked), Some(pool)) = (parked, self.pool.get().and_then(Weak::upgrade)) {
            pool.release(parked).unwrap();
        }
        self.inner.dispose(session)
    }
}

#[test]
fn shutdown_disposes_every_idle_session() {
    let pool = Pool::new(CountingManager::new(), 3).unwrap();
    pool.warm_up().unwrap();
    let report = pool.shutdown();
    assert_eq!(report.disposed, 3);
    assert!(report.is_clean());
    assert_eq!(pool.manager().disposed(), vec![1, 2, 3]);
    assert_eq!(pool.available(), 0);
    assert_eq!(pool.state(), State::Drained);
    assert!(pool.is_initialized());
}

#[test]
fn shutdown_skips_checked_out_sessions() {
    let pool = Pool::new(CountingManager::new(), 2).unwrap();
    let held = pool.acquire().unwrap();
    let report = pool.shutdown();
    assert_eq!(report.disposed, 1);
    assert_eq!(pool.manager().disposed().len(), 1);
    assert!(!pool.manager().disposed().contains(&held.id));
    assert_eq!(pool.in_use(), 1);

    // A late release is accepted and waits for the next drain.
    let late_id = held.id;
    pool.release(held).unwrap();
    assert_eq!(pool.available(), 1);
    let report = pool.shutdown();
    assert_eq!(report.disposed, 1);
    assert!(pool.manager().disposed().contains(&late_id));
}

#[test]
fn releasing_before_shutdown_disposes_both() {
    let pool = Pool::new(CountingManager::new(), 2).unwrap();
    let r1 = pool.acquire().unwrap();
    let r2 = pool.acquire().unwrap();
    pool.release(r1).unwrap();
    pool.release(r2).unwrap();
    assert_eq!(pool.shutdown().disposed, 2);
    assert_eq!(pool.created() - pool.disposed(), 0);
}

#[test]
fn disposal_failure_does_not_stop_the_drain() {
    let pool = Pool::new(CountingManager::failing_dispose(vec![2]), 3).unwrap();
    pool.warm_up().unwrap();
    let report = pool.shutdown();
    assert_eq!(report.disposed, 3);
    assert!(!report.is_clean());
    assert_eq!(report.failures, vec!["browser 2 failed to close".to_string()]);
    assert_eq!(pool.manager().disposed(), vec![1, 2, 3]);
}

#[test]
fn shutdown_before_warm_up_is_a_no_op() {
    let pool = Pool::new(CountingManager::new(), 2).unwrap();
    let report = pool.shutdown();
    assert_eq!(report.disposed, 0);
    assert_eq!(pool.state(), State::Uninitialized);

    // The pool still warms up on demand afterwards.
    let session = pool.acquire().unwrap();
    assert_eq!(pool.created(), 2);
    pool.release(session).unwrap();
}

#[test]
fn acquire_after_shutdown_gets_late_releases() {
    let pool = Pool::new(CountingManager::new(), 2).unwrap();
    let held = pool.acquire().unwrap();
    pool.shutdown();
    assert!(pool.try_acquire().unwrap().is_none());

    pool.release(held).unwrap();
    let again = pool.try_acquire().unwrap().unwrap();
    assert_eq!(pool.created(), 2);
    pool.release(again).unwrap();
}

#[test]
fn dropping_the_pool_disposes_idle_sessions() {
    let manager = Arc::new(CountingManager::new());
    let pool = Pool::new(manager.clone(), 3).unwrap();
    let held = pool.acquire().unwrap();
    drop(pool);
    assert_eq!(manager.disposed().len(), 2);
    assert!(!manager.disposed().contains(&held.id));
}

#[test]
fn release_during_drain_is_disposed_by_the_same_drain() {
    let pool = Arc::new(Pool::new(ReleasingManager::default(), 3).unwrap());
    pool.manager().pool.set(Arc::downgrade(&pool)).unwrap();
    let held = pool.acquire().unwrap();
    *pool.manager().parked.lock().unwrap() = Some(held);

    let report = pool.shutdown();
    assert_eq!(report.disposed, 3);
    assert!(report.is_clean());
    assert_eq!(pool.in_use(), 0);
    assert_eq!(pool.available(), 0);
    assert_eq!(pool.manager().inner.disposed(), vec![1, 2, 3]);
}

#[test]
fn blocking_acquire_after_shutdown_waits_for_late_release() {
    let pool = Arc::new(Pool::new(CountingManager::new(), 2).unwrap());
    let held = pool.acquire().unwrap();
    pool.shutdown();

    let (tx, rx) = mpsc::channel();
    let clone_pool = pool.clone();
    let handle = std::thread::spawn(move || {
        let session = clone_pool.acquire().unwrap();
        tx.send(session.id).unwrap();
        session
    });

    wait_until(|| pool.waiting() == 1);
    assert!(rx.recv_timeout(std::time::Duration::from_millis(50)).is_err());

    let late_id = held.id;
    pool.release(held).unwrap();
    assert_eq!(rx.recv().unwrap(), late_id);
    let session = handle.join().unwrap();
    assert_eq!(pool.waiting(), 0);
    assert_eq!(pool.state(), State::Drained);
    assert_eq!(pool.created(), 2);
    pool.release(session).unwrap();
}
