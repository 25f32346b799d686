//! # ProgressState：组装进度的响应式状态
//!
//! 基于 [`tokio::sync::watch`]：写入方只做计数更新，读写都不阻塞；
//! 监听方通过 [`ProgressWatcher::changed`] 异步等待下一次变化。
//!
//! 与 `result()` 中单槽位的「最近错误」不同，这里的 `failed` 会累计所有失败的写入，
//! 并发失败时不会丢失计数。

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

/// 组装器的进度快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyProgress {
    /// 已提交的块数
    pub submitted: u64,
    /// 已完成（无论成败）的块数
    pub completed: u64,
    /// 写入或记录日志失败的块数
    pub failed: u64,
    /// 已写入并记录日志的字节数
    pub bytes_written: u64,
}

impl AssemblyProgress {
    /// 所有已提交的块都已完成。
    pub fn is_drained(&self) -> bool {
        self.completed >= self.submitted
    }
}

#[derive(Debug, Error)]
pub enum ProgressStateError {
    /// 状态的持有方（组装器）已被销毁
    #[error("进度状态已被销毁")]
    Closed,
}

/// 进度状态，可 Clone，多个写入方共享同一份计数。
#[derive(Debug, Clone)]
pub struct ProgressState {
    sender: Arc<watch::Sender<AssemblyProgress>>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressState {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AssemblyProgress::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// 在当前值上就地修改并通知所有监听者。
    pub fn update_field<F>(&self, updater: F)
    where
        F: FnOnce(&mut AssemblyProgress),
    {
        self.sender.send_modify(updater);
    }

    pub fn on_submitted(&self) {
        self.update_field(|p| p.submitted += 1);
    }

    /// 同步写入在提交阶段失败，撤回计数。
    pub fn on_rejected(&self) {
        self.update_field(|p| {
            p.submitted = p.submitted.saturating_sub(1);
            p.failed += 1;
        });
    }

    pub fn on_completed(&self, bytes: u64) {
        self.update_field(|p| {
            p.completed += 1;
            p.bytes_written += bytes;
        });
    }

    pub fn on_failed(&self) {
        self.update_field(|p| {
            p.completed += 1;
            p.failed += 1;
        });
    }

    /// 当前进度快照。
    pub fn get_current(&self) -> AssemblyProgress {
        *self.sender.borrow()
    }

    pub fn watch(&self) -> ProgressWatcher {
        ProgressWatcher {
            receiver: self.sender.subscribe(),
        }
    }
}

/// 进度监听器。
#[derive(Debug)]
pub struct ProgressWatcher {
    receiver: watch::Receiver<AssemblyProgress>,
}

impl ProgressWatcher {
    /// 异步等待下一次变化，返回新值；状态被销毁时返回错误。
    pub async fn changed(&mut self) -> Result<AssemblyProgress, ProgressStateError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| ProgressStateError::Closed)?;
        Ok(*self.receiver.borrow_and_update())
    }

    /// 异步等待直到进度满足条件；当前值已满足时立即返回。
    pub async fn wait_until<F>(
        &mut self,
        predicate: F,
    ) -> Result<AssemblyProgress, ProgressStateError>
    where
        F: FnMut(&AssemblyProgress) -> bool,
    {
        let value = self
            .receiver
            .wait_for(predicate)
            .await
            .map_err(|_| ProgressStateError::Closed)?;
        Ok(*value)
    }

    pub fn borrow(&self) -> AssemblyProgress {
        *self.receiver.borrow()
    }
}
