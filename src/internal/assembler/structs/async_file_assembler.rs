//! 异步组装器：`write` 提交后立即返回，实际写入在 tokio 运行时中完成。
//!
//! ## 完成回调
//!
//! 每个块在独立任务中完成：
//! - 写入成功：追加日志条目，然后完成计数 +1；
//! - 写入失败：不记日志，完成计数 +1，并记录为最近错误。
//!
//! 完成回调与后续的 `write`、`result()` 可以并发执行。
//!
//! ## 等待
//!
//! [`AsyncFileAssembler::wait_for_async`] 阻塞调用线程，直到完成计数追上提交计数。
//! 同一时刻只允许一个等待者，第二个并发等待者得到 `AlreadyWaiting`。
//! 不要在驱动这些写入的单线程运行时的工作线程上调用，否则写入任务永远得不到执行。

use std::fs::OpenOptions;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, error, info, trace};

use crate::internal::assembler::structs::assembly_result::AssemblyResult;
use crate::internal::assembler::traits::file_assembler::FileAssembler;
use crate::internal::assembly_log::structs::assembly_log::AssemblyLog;
use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::range::structs::range::Range;
use crate::internal::states::progress_state::{
    AssemblyProgress, ProgressState, ProgressWatcher,
};

#[derive(Debug, Default)]
struct DrainState {
    submitted: u64,
    completed: u64,
    waiting: bool,
}

/// 调用方与完成回调共享的计数、错误槽位与进度。
#[derive(Debug, Default)]
struct Shared {
    drain: Mutex<DrainState>,
    drained: Condvar,
    last_error: Mutex<Option<AssemblyError>>,
    progress: ProgressState,
}

impl Shared {
    /// 计数与进度在同一把锁内更新，等待者醒来时两者一致。
    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut DrainState, &ProgressState),
    {
        if let Ok(mut state) = self.drain.lock() {
            apply(&mut *state, &self.progress);
        }
        self.drained.notify_all();
    }

    fn submit(&self) {
        self.update(|state, progress| {
            state.submitted += 1;
            progress.on_submitted();
        });
    }

    /// 提交阶段就失败：撤回提交计数。
    fn reject(&self, err: AssemblyError) {
        self.record_error(err);
        self.update(|state, progress| {
            state.submitted = state.submitted.saturating_sub(1);
            progress.on_rejected();
        });
    }

    fn complete(&self, outcome: AssemblyResultOf<u64>) {
        let written = match outcome {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                self.record_error(e);
                None
            }
        };
        self.update(|state, progress| {
            state.completed += 1;
            match written {
                Some(bytes) => progress.on_completed(bytes),
                None => progress.on_failed(),
            }
        });
    }

    fn record_error(&self, err: AssemblyError) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(err);
        }
    }

    fn counters(&self) -> AssemblyResultOf<(u64, u64)> {
        let state = self.drain.lock().map_err(|_| AssemblyError::LockPoisoned)?;
        Ok((state.submitted, state.completed))
    }
}

#[derive(Debug)]
pub struct AsyncFileAssembler {
    path: PathBuf,
    runtime: Handle,
    /// 没有外部运行时时自建，销毁时在后台关闭
    owned_runtime: Option<Runtime>,
    file: Mutex<Option<Arc<TokioMutex<File>>>>,
    /// 与 `file` 指向同一文件，用于阻塞式落盘
    sync_handle: Mutex<Option<std::fs::File>>,
    assembly_log: Arc<AssemblyLog>,
    shared: Arc<Shared>,
}

impl AsyncFileAssembler {
    /// 写入任务提交到 `runtime`。
    pub fn new(path: impl AsRef<Path>, assembly_log: Arc<AssemblyLog>, runtime: Handle) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            runtime,
            owned_runtime: None,
            file: Mutex::new(None),
            sync_handle: Mutex::new(None),
            assembly_log,
            shared: Arc::new(Shared::default()),
        }
    }

    /// 自建一个多线程运行时承载写入任务。
    pub fn with_owned_runtime(
        path: impl AsRef<Path>,
        assembly_log: Arc<AssemblyLog>,
    ) -> AssemblyResultOf<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("file-assembly")
            .enable_all()
            .build()?;
        let mut assembler = Self::new(path, assembly_log, runtime.handle().clone());
        assembler.owned_runtime = Some(runtime);
        Ok(assembler)
    }

    /// 阻塞直到所有已提交的写入完成；已有等待者时返回 `AlreadyWaiting`。
    pub fn wait_for_async(&self) -> AssemblyResultOf<()> {
        let mut state = self
            .shared
            .drain
            .lock()
            .map_err(|_| AssemblyError::LockPoisoned)?;
        if state.waiting {
            return Err(AssemblyError::AlreadyWaiting);
        }
        state.waiting = true;
        debug!(completed = state.completed, submitted = state.submitted, "等待异步写入完成");

        let waited = self
            .shared
            .drained
            .wait_while(state, |s| s.completed < s.submitted);
        let mut state = waited.map_err(|_| AssemblyError::LockPoisoned)?;
        state.waiting = false;
        trace!(completed = state.completed, submitted = state.submitted, "异步写入已全部完成");
        Ok(())
    }

    /// 异步等待所有已提交的写入完成，供运行时内的调用方使用。
    pub async fn drained(&self) -> AssemblyResultOf<()> {
        let mut watcher = self.shared.progress.watch();
        watcher
            .wait_until(|p| p.is_drained())
            .await
            .map_err(|_| AssemblyError::AssemblerClosed)?;
        Ok(())
    }

    /// 当前是否有线程阻塞在 [`Self::wait_for_async`]。
    pub fn is_waiting(&self) -> bool {
        self.shared
            .drain
            .lock()
            .map(|state| state.waiting)
            .unwrap_or(false)
    }

    fn current_file(&self) -> AssemblyResultOf<Arc<TokioMutex<File>>> {
        let guard = self.file.lock().map_err(|_| AssemblyError::LockPoisoned)?;
        guard.as_ref().cloned().ok_or(AssemblyError::AssemblerClosed)
    }

    /// 不占用等待者名额的等待，供 `close` 使用。
    fn wait_until_drained(&self) -> AssemblyResultOf<()> {
        let state = self
            .shared
            .drain
            .lock()
            .map_err(|_| AssemblyError::LockPoisoned)?;
        let _state = self
            .shared
            .drained
            .wait_while(state, |s| s.completed < s.submitted)
            .map_err(|_| AssemblyError::LockPoisoned)?;
        Ok(())
    }
}

/// 在 `offset` 处写满整块并刷新 tokio 文件的内部缓冲。
async fn write_at(file: &TokioMutex<File>, chunk: &[u8], offset: i64) -> AssemblyResultOf<()> {
    let mut guard = file.lock().await;
    guard.seek(SeekFrom::Start(offset as u64)).await?;
    guard.write_all(chunk).await?;
    guard.flush().await?;
    Ok(())
}

async fn append_entry(assembly_log: Arc<AssemblyLog>, low: i64, high: i64) -> AssemblyResultOf<()> {
    tokio::task::spawn_blocking(move || assembly_log.append(low, high)).await?
}

impl FileAssembler for AsyncFileAssembler {
    fn init(&mut self) -> AssemblyResultOf<()> {
        debug!(path = %self.path.display(), "初始化异步组装器");
        let std_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)?;
        let async_file = File::from_std(std_file.try_clone()?);

        *self.file.lock().map_err(|_| AssemblyError::LockPoisoned)? =
            Some(Arc::new(TokioMutex::new(async_file)));
        *self
            .sync_handle
            .lock()
            .map_err(|_| AssemblyError::LockPoisoned)? = Some(std_file);
        self.assembly_log.init(false)
    }

    fn result(&self) -> AssemblyResultOf<AssemblyResult> {
        let missing_ranges = self.assembly_log.read()?;
        let (submitted, completed) = self.shared.counters()?;
        let last_error = self
            .shared
            .last_error
            .lock()
            .map_err(|_| AssemblyError::LockPoisoned)?
            .take();
        Ok(AssemblyResult {
            missing_ranges,
            submitted,
            completed,
            last_error,
        })
    }

    fn write(&self, chunk: Bytes, offset: i64) {
        if chunk.is_empty() {
            return;
        }
        trace!(offset, len = chunk.len(), "提交块");
        self.shared.submit();

        let high = match Range::of_chunk(offset, chunk.len()) {
            Ok(span) => span.high,
            Err(e) => {
                error!(offset, len = chunk.len(), error = %e, "块区间非法");
                self.shared.reject(e);
                return;
            }
        };
        let file = match self.current_file() {
            Ok(f) => f,
            Err(e) => {
                error!(offset, error = %e, "提交块失败");
                self.shared.reject(e);
                return;
            }
        };

        let assembly_log = Arc::clone(&self.assembly_log);
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            let len = chunk.len() as u64;
            let outcome = match write_at(&file, &chunk, offset).await {
                Ok(()) => {
                    trace!(low = offset, high, "块写入完成");
                    match append_entry(assembly_log, offset, high).await {
                        Ok(()) => Ok(len),
                        Err(e) => {
                            error!(low = offset, high, error = %e, "记录区间失败");
                            Err(e)
                        }
                    }
                }
                Err(e) => {
                    error!(low = offset, high, error = %e, "块写入失败");
                    Err(e)
                }
            };
            shared.complete(outcome);
        });
    }

    fn flush(&self) -> AssemblyResultOf<()> {
        debug!(path = %self.path.display(), "刷新部分文件");
        self.wait_for_async()?;
        let guard = self
            .sync_handle
            .lock()
            .map_err(|_| AssemblyError::LockPoisoned)?;
        let file = guard.as_ref().ok_or(AssemblyError::AssemblerClosed)?;
        file.sync_data()?;
        Ok(())
    }

    fn close(&self) -> AssemblyResultOf<()> {
        let file = self
            .file
            .lock()
            .map_err(|_| AssemblyError::LockPoisoned)?
            .take();
        self.wait_until_drained()?;
        let sync_handle = self
            .sync_handle
            .lock()
            .map_err(|_| AssemblyError::LockPoisoned)?
            .take();
        if file.is_some() || sync_handle.is_some() {
            info!(path = %self.path.display(), "关闭部分文件");
        }
        Ok(())
    }

    fn progress(&self) -> AssemblyProgress {
        self.shared.progress.get_current()
    }

    fn watch_progress(&self) -> ProgressWatcher {
        self.shared.progress.watch()
    }
}

impl Drop for AsyncFileAssembler {
    fn drop(&mut self) {
        if let Some(runtime) = self.owned_runtime.take() {
            runtime.shutdown_background();
        }
    }
}
