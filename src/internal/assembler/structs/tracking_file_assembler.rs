//! 带断点续传的文件组装入口
//!
//! 管理三个文件：目标文件 `target`、部分文件 `target.part` 与组装日志 `target.binlog`。
//! 数据先写入部分文件，每写完一块就在日志中追加该块的区间；进程中断后重新 `init`
//! 即可从日志中恢复已完成的区间，只补写缺失部分。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! # use file_assembly::assembler::{AssemblyOutcome, TrackingFileAssembler};
//! # fn example(data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let mut assembler = TrackingFileAssembler::new("download/video.mp4").buffer_size(64 * 1024);
//! assembler.init(data.len() as i64, b"etag-1")?;
//!
//! let mut reader = data;
//! assembler.consume(&mut reader, 0, data.len() as i64 - 1)?;
//!
//! match assembler.close()? {
//!     AssemblyOutcome::Finalized { path } => println!("完成: {}", path.display()),
//!     AssemblyOutcome::Pending { missing } => println!("仍缺: {}", missing),
//!     AssemblyOutcome::Untouched => {}
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## 初始化检查
//!
//! `init` 在创建任何文件之前检查磁盘状态：目标文件已存在、日志与部分文件只存在其一、
//! 父路径不是目录，都会直接返回错误。已有日志时还会比对区间与标签，不一致说明源内容已变，
//! 返回 `SignatureMismatch`，由调用方删除旧文件后重来。

mod consume;
mod preflight;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

use crate::internal::assembly_log::structs::assembly_log::AssemblyLog;
use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::range::traits::range_store::RangeStore;
use crate::internal::states::progress_state::{AssemblyProgress, ProgressWatcher};

use super::allocating_buffer_source::AllocatingBufferSource;
use super::assembler_config::{AssemblerConfig, LOG_EXT, PART_EXT};
use super::assembly_mode::AssemblyMode;
use super::assembly_outcome::AssemblyOutcome;
use super::assembly_result::AssemblyResult;
use super::async_file_assembler::AsyncFileAssembler;
use super::chunk_output_stream::ChunkOutputStream;
use super::sync_file_assembler::SyncFileAssembler;
use crate::internal::assembler::traits::buffer_source::BufferSource;
use crate::internal::assembler::traits::file_assembler::FileAssembler;

/// `path` 后追加后缀，不替换原有扩展名。
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// 目标文件对应的部分文件路径。
pub fn to_part_file(target: impl AsRef<Path>) -> PathBuf {
    with_suffix(target.as_ref(), PART_EXT)
}

/// 目标文件对应的默认日志路径。
pub fn to_log_file(target: impl AsRef<Path>) -> PathBuf {
    with_suffix(target.as_ref(), LOG_EXT)
}

pub struct TrackingFileAssembler {
    target: PathBuf,
    part_path: PathBuf,
    config: AssemblerConfig,
    buffer_source: Arc<dyn BufferSource>,
    assembler: Option<Box<dyn FileAssembler>>,
    assembly_log: Option<Arc<AssemblyLog>>,
}

impl TrackingFileAssembler {
    pub fn new(target: impl AsRef<Path>) -> Self {
        let target = target.as_ref().to_path_buf();
        Self {
            part_path: to_part_file(&target),
            target,
            config: AssemblerConfig::default(),
            buffer_source: Arc::new(AllocatingBufferSource),
            assembler: None,
            assembly_log: None,
        }
    }

    /// 使用完整配置创建。
    pub fn with_config(target: impl AsRef<Path>, config: AssemblerConfig) -> Self {
        let mut assembler = Self::new(target);
        assembler.config = config;
        assembler
    }

    /// 使用异步组装器，默认同步。
    pub fn async_mode(mut self) -> Self {
        self.config.mode = AssemblyMode::Async;
        self
    }

    pub fn mode(mut self, mode: AssemblyMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// 自定义日志路径；传空路径表示恢复默认。
    pub fn log_path(mut self, path: impl AsRef<Path>) -> Self {
        let p = path.as_ref();
        self.config.log_path = if p.as_os_str().is_empty() {
            None
        } else {
            Some(p.to_path_buf())
        };
        self
    }

    /// 关闭时是否在完成后删除日志并重命名部分文件，默认开启。
    pub fn auto_cleanup(mut self, enabled: bool) -> Self {
        self.config.auto_cleanup = enabled;
        self
    }

    /// `consume` 与输出流的块大小。
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size.max(1);
        self
    }

    /// 异步模式下承载写入任务的运行时。
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.config.runtime = Some(handle);
        self
    }

    pub fn buffer_source(mut self, source: Arc<dyn BufferSource>) -> Self {
        self.buffer_source = source;
        self
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn part_path(&self) -> &Path {
        &self.part_path
    }

    /// 实际使用的日志路径。
    pub fn log_file(&self) -> PathBuf {
        self.config
            .log_path
            .clone()
            .unwrap_or_else(|| to_log_file(&self.target))
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.assembler.is_some()
    }

    /// 开始或继续组装一个 `target_size` 字节、以 `tag` 标识内容版本的文件。只能成功调用一次。
    pub fn init(&mut self, target_size: i64, tag: &[u8]) -> AssemblyResultOf<()> {
        if self.assembler.is_some() {
            return Err(AssemblyError::AlreadyInitialized);
        }
        let log_path = self.log_file();
        preflight::check_files(&self.target, &self.part_path, &log_path)?;
        preflight::ensure_parent_dir(&self.target)?;

        let high = target_size
            .checked_sub(1)
            .ok_or(AssemblyError::InvalidRange {
                low: 0,
                high: target_size,
            })?;
        let assembly_log = Arc::new(AssemblyLog::new(&log_path));
        let created = assembly_log.init_file(0, high, tag)?;

        if let Err(e) = self.attach(Arc::clone(&assembly_log), target_size, tag) {
            let _ = assembly_log.close();
            if created {
                // 本次新建的日志没有对应的部分文件，留着会让下次 init 报 MissingPartialFile
                let _ = assembly_log.delete();
            }
            return Err(e);
        }

        info!(
            path = %self.target.display(),
            size = target_size,
            mode = ?self.config.mode,
            resumed = !created,
            "组装器初始化完成"
        );
        Ok(())
    }

    fn attach(
        &mut self,
        assembly_log: Arc<AssemblyLog>,
        target_size: i64,
        tag: &[u8],
    ) -> AssemblyResultOf<()> {
        let header = assembly_log.header()?;
        preflight::verify_header(&header, target_size, tag)?;

        let mut assembler: Box<dyn FileAssembler> = match self.config.mode {
            AssemblyMode::Sync => Box::new(SyncFileAssembler::new(
                &self.part_path,
                Arc::clone(&assembly_log),
            )),
            AssemblyMode::Async => Box::new(self.build_async(Arc::clone(&assembly_log))?),
        };
        assembler.init()?;

        self.assembler = Some(assembler);
        self.assembly_log = Some(assembly_log);
        Ok(())
    }

    /// 配置的运行时优先；否则取当前的多线程运行时。单线程运行时不能用：
    /// `flush`/`close` 会阻塞它唯一的线程，排在上面的写入任务永远得不到执行。
    fn build_async(&self, assembly_log: Arc<AssemblyLog>) -> AssemblyResultOf<AsyncFileAssembler> {
        let handle = self.config.runtime.clone().or_else(|| {
            Handle::try_current()
                .ok()
                .filter(|h| h.runtime_flavor() != RuntimeFlavor::CurrentThread)
        });
        match handle {
            Some(handle) => Ok(AsyncFileAssembler::new(&self.part_path, assembly_log, handle)),
            None => {
                debug!("没有可用的多线程 tokio 运行时，自建运行时");
                AsyncFileAssembler::with_owned_runtime(&self.part_path, assembly_log)
            }
        }
    }

    fn assembler(&self) -> AssemblyResultOf<&dyn FileAssembler> {
        self.assembler
            .as_deref()
            .ok_or(AssemblyError::NotInitialized)
    }

    /// 共享的组装日志，初始化之后可用。
    pub fn assembly_log(&self) -> AssemblyResultOf<&AssemblyLog> {
        self.assembly_log
            .as_deref()
            .ok_or(AssemblyError::NotInitialized)
    }

    /// 把一块数据写到 `offset`；写入本身的失败通过 [`Self::result`] 报告。
    pub fn write(&self, chunk: Bytes, offset: i64) -> AssemblyResultOf<()> {
        self.assembler()?.write(chunk, offset);
        Ok(())
    }

    /// 覆盖 `[start, end]` 的输出流，按 `buffer_size` 分块提交。
    pub fn output_stream(&self, start: i64, end: i64) -> AssemblyResultOf<ChunkOutputStream<'_>> {
        ChunkOutputStream::new(
            self.assembler()?,
            start,
            end,
            Arc::clone(&self.buffer_source),
            self.config.buffer_size,
        )
    }

    pub fn result(&self) -> AssemblyResultOf<AssemblyResult> {
        self.assembler()?.result()
    }

    pub fn flush(&self) -> AssemblyResultOf<()> {
        self.assembler()?.flush()?;
        self.assembly_log()?.flush()
    }

    pub fn progress(&self) -> AssemblyResultOf<AssemblyProgress> {
        Ok(self.assembler()?.progress())
    }

    pub fn watch_progress(&self) -> AssemblyResultOf<ProgressWatcher> {
        Ok(self.assembler()?.watch_progress())
    }

    /// 关闭组装器与日志。
    ///
    /// 开启自动清理且已无缺失区间时，删除日志并把部分文件重命名为目标文件；
    /// 否则保留两者供下次续传。从未初始化时返回 [`AssemblyOutcome::Untouched`]。
    pub fn close(mut self) -> AssemblyResultOf<AssemblyOutcome> {
        let (Some(assembler), Some(assembly_log)) =
            (self.assembler.take(), self.assembly_log.take())
        else {
            return Ok(AssemblyOutcome::Untouched);
        };

        assembler.close()?;
        drop(assembler);

        let missing = assembly_log.read()?;
        assembly_log.close()?;

        if !self.config.auto_cleanup || missing.size() > 0 {
            if missing.size() > 0 {
                warn!(path = %self.target.display(), missing = %missing, "组装未完成，保留部分文件");
            }
            return Ok(AssemblyOutcome::Pending { missing });
        }

        assembly_log.delete()?;
        std::fs::rename(&self.part_path, &self.target).map_err(AssemblyError::Rename)?;
        info!(path = %self.target.display(), "组装完成");
        Ok(AssemblyOutcome::Finalized {
            path: self.target.clone(),
        })
    }
}
