//! 进度状态测试
//!
//! 测试项：
//! - 各事件对计数的影响
//! - changed() 收到更新、wait_until() 不错过快速更新
//! - 状态销毁后监听者收到错误

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::states::progress_state::{AssemblyProgress, ProgressState, ProgressStateError};

#[test]
fn events_update_counters() {
    let state = ProgressState::new();
    state.on_submitted();
    state.on_submitted();
    state.on_submitted();
    state.on_completed(100);
    state.on_failed();
    state.on_rejected();

    assert_eq!(
        state.get_current(),
        AssemblyProgress {
            submitted: 2,
            completed: 2,
            failed: 2,
            bytes_written: 100,
        }
    );
    assert!(state.get_current().is_drained());
}

#[tokio::test]
async fn changed_delivers_new_value() {
    let state = ProgressState::new();
    let mut watcher = state.watch();

    let s = state.clone();
    tokio::spawn(async move {
        s.on_submitted();
    });

    let value = timeout(Duration::from_secs(5), watcher.changed())
        .await
        .expect("等待变化超时")
        .unwrap();
    assert_eq!(value.submitted, 1);
    assert_eq!(watcher.borrow().submitted, 1);
}

#[tokio::test]
async fn wait_until_does_not_miss_rapid_updates() {
    let state = Arc::new(ProgressState::new());
    let mut watcher = state.watch();

    let s = Arc::clone(&state);
    tokio::spawn(async move {
        for _ in 0..100 {
            s.on_submitted();
            s.on_completed(1);
        }
    });

    let value = timeout(
        Duration::from_secs(5),
        watcher.wait_until(|p| p.bytes_written == 100),
    )
    .await
    .expect("等待进度超时")
    .unwrap();
    assert!(value.is_drained());
}

#[tokio::test]
async fn dropped_state_closes_watchers() {
    let state = ProgressState::new();
    let mut watcher = state.watch();
    drop(state);

    let result = watcher.changed().await;
    assert!(matches!(result, Err(ProgressStateError::Closed)));
}
