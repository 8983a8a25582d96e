#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::*;

#[test]
fn same_thread_reacquires_without_blocking() {
    let manager = LockManager::new(Some(Duration::from_millis(100)));

    let outer = manager.file_lock_default("a.md").unwrap();
    // Reentrant: a thread owning a file lock may take it again.
    let inner = manager.file_lock_default("a.md").unwrap();
    drop(inner);
    drop(outer);

    // Fully released afterwards: another thread can take it immediately.
    let manager = Arc::new(manager);
    let other = Arc::clone(&manager);
    let handle = std::thread::spawn(move || other.file_lock_default("a.md").is_ok());
    assert!(handle.join().unwrap());
}

#[test]
fn contended_lock_times_out() {
    let manager = Arc::new(LockManager::new(Some(Duration::from_millis(50))));

    let _held = manager.file_lock_default("b.md").unwrap();

    let other = Arc::clone(&manager);
    let handle = std::thread::spawn(move || other.file_lock_default("b.md"));
    let result = handle.join().unwrap();
    assert!(matches!(result, Err(crate::error::Error::LockTimeout { .. })));
}

#[test]
fn release_unblocks_waiter() {
    let manager = Arc::new(LockManager::new(Some(Duration::from_secs(5))));
    let acquired = Arc::new(AtomicBool::new(false));

    let guard = manager.file_lock_default("c.md").unwrap();

    let other = Arc::clone(&manager);
    let flag = Arc::clone(&acquired);
    let handle = std::thread::spawn(move || {
        let _guard = other.file_lock_default("c.md").unwrap();
        flag.store(true, Ordering::SeqCst);
    });

    std::thread::sleep(Duration::from_millis(20));
    assert!(!acquired.load(Ordering::SeqCst));

    drop(guard);
    handle.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
}

#[test]
fn disjoint_keys_do_not_contend() {
    let manager = Arc::new(LockManager::new(Some(Duration::from_millis(50))));

    let _a = manager.file_lock_default("a.md").unwrap();
    let other = Arc::clone(&manager);
    let handle = std::thread::spawn(move || other.file_lock_default("b.md").is_ok());
    assert!(handle.join().unwrap());
}

#[test]
fn cache_lock_is_reentrant() {
    let manager = LockManager::new(None);
    let outer = manager.cache_lock();
    let inner = manager.cache_lock();
    drop(inner);
    drop(outer);
}

#[test]
fn statistics_report_active_owners() {
    let manager = LockManager::new(Some(Duration::from_millis(50)));

    let _a = manager.file_lock_default("a.md").unwrap();
    let _b = manager.file_lock_default("b.md").unwrap();
    drop(_b);

    let stats = manager.statistics();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.active, 1);
    assert!(stats.owners.contains_key("a.md"));

    let info = &stats.owners["a.md"];
    assert_eq!(info.depth, 1);
}

#[test]
fn cleanup_refuses_while_locks_active() {
    let manager = LockManager::new(Some(Duration::from_millis(50)));

    let guard = manager.file_lock_default("a.md").unwrap();
    assert!(manager.cleanup_locks().is_err());

    drop(guard);
    assert_eq!(manager.cleanup_locks().unwrap(), 1);
    assert_eq!(manager.statistics().total, 0);
}

#[test]
fn foreign_release_is_a_warning_not_a_panic() {
    let manager = Arc::new(LockManager::new(Some(Duration::from_millis(50))));

    let guard = manager.file_lock_default("a.md").unwrap();

    // Dropping the guard from another thread must not free the lock it
    // doesn't own, and must not panic.
    let handle = std::thread::spawn(move || drop(guard));
    handle.join().unwrap();

    // Still held by this thread's ownership record.
    assert_eq!(manager.statistics().active, 1);
}
