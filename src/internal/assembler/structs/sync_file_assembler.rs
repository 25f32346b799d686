//! 同步组装器：调用线程内完成写入与日志追加。
//!
//! 调用方需自行决定续用已有部分文件还是新建：源内容未变时续用，已变时应换新文件。

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::{debug, error, info, trace};

use crate::internal::assembler::structs::assembly_result::AssemblyResult;
use crate::internal::assembler::traits::file_assembler::FileAssembler;
use crate::internal::assembly_log::structs::assembly_log::AssemblyLog;
use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::range::structs::range::Range;
use crate::internal::states::progress_state::{
    AssemblyProgress, ProgressState, ProgressWatcher,
};

#[derive(Debug)]
pub struct SyncFileAssembler {
    path: PathBuf,
    file: Mutex<Option<File>>,
    assembly_log: Arc<AssemblyLog>,
    submitted: AtomicU64,
    completed: AtomicU64,
    last_error: Mutex<Option<AssemblyError>>,
    progress: ProgressState,
}

impl SyncFileAssembler {
    pub fn new(path: impl AsRef<Path>, assembly_log: Arc<AssemblyLog>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(None),
            assembly_log,
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            last_error: Mutex::new(None),
            progress: ProgressState::new(),
        }
    }

    /// 写满整块后追加日志条目。
    fn write_chunk(&self, chunk: &[u8], offset: i64) -> AssemblyResultOf<()> {
        let span = Range::of_chunk(offset, chunk.len())?;
        {
            let mut guard = self.file.lock().map_err(|_| AssemblyError::LockPoisoned)?;
            let file = guard.as_mut().ok_or(AssemblyError::AssemblerClosed)?;
            file.seek(SeekFrom::Start(offset as u64))?;
            file.write_all(chunk)?;
        }
        self.assembly_log.append(span.low, span.high)
    }

    fn record_error(&self, err: AssemblyError) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(err);
        }
    }
}

impl FileAssembler for SyncFileAssembler {
    fn init(&mut self) -> AssemblyResultOf<()> {
        debug!(path = %self.path.display(), "初始化同步组装器");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)?;
        *self.file.lock().map_err(|_| AssemblyError::LockPoisoned)? = Some(file);
        self.assembly_log.init(false)
    }

    fn result(&self) -> AssemblyResultOf<AssemblyResult> {
        let missing_ranges = self.assembly_log.read()?;
        let last_error = self
            .last_error
            .lock()
            .map_err(|_| AssemblyError::LockPoisoned)?
            .take();
        Ok(AssemblyResult {
            missing_ranges,
            submitted: self.submitted.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            last_error,
        })
    }

    fn write(&self, chunk: Bytes, offset: i64) {
        if chunk.is_empty() {
            return;
        }
        trace!(offset, len = chunk.len(), "写入块");
        self.submitted.fetch_add(1, Ordering::SeqCst);
        self.progress.on_submitted();

        match self.write_chunk(&chunk, offset) {
            Ok(()) => {
                self.completed.fetch_add(1, Ordering::SeqCst);
                self.progress.on_completed(chunk.len() as u64);
            }
            Err(e) => {
                error!(offset, error = %e, "写入块失败");
                // 失败的块不计入待完成的工作
                self.submitted.fetch_sub(1, Ordering::SeqCst);
                self.progress.on_rejected();
                self.record_error(e);
            }
        }
    }

    fn flush(&self) -> AssemblyResultOf<()> {
        debug!(path = %self.path.display(), "刷新部分文件");
        let guard = self.file.lock().map_err(|_| AssemblyError::LockPoisoned)?;
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
        if file.is_some() {
            info!(path = %self.path.display(), "关闭部分文件");
        }
        Ok(())
    }

    fn progress(&self) -> AssemblyProgress {
        self.progress.get_current()
    }

    fn watch_progress(&self) -> ProgressWatcher {
        self.progress.watch()
    }
}
