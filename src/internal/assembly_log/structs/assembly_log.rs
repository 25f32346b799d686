//! 组装日志：日志头 + 只追加的已完成区间条目。
//!
//! ## 文件格式
//!
//! 文件开头为 [`AssemblyLogHeader`]，随后是零个或多个 16 字节条目 `{low, high}`，
//! 每个条目表示该闭区间的数据已经写入部分文件。条目只追加，不改写也不删除。
//!
//! ## 句柄
//!
//! 写句柄以追加模式打开，读句柄独立打开；写入方追加的同时读取方可从头重放，互不干扰。
//! 句柄槽位上的锁只保护打开/关闭，不对追加顺序做任何保证：多个调用方同时 `append`
//! 时，每次调用仅依赖追加模式下单次写入的原子性。
//!
//! ## 重放
//!
//! [`AssemblyLog::read`] 从日志头声明的完整区间出发，依次减去每个条目，得到**尚未写入**的区间。
//! 末尾不足 16 字节的残缺条目（崩溃时写了一半）视为没有更多条目，而不是错误。

use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tracing::{debug, trace};

use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::range::structs::slotted_range_store::SlottedRangeStore;
use crate::internal::range::traits::range_store::{
    decode_range, encode_range, RangeStore, RANGE_ENTRY_SIZE,
};

use super::assembly_log_header::{AssemblyLogHeader, HEADER_SIZE};

#[derive(Debug)]
pub struct AssemblyLog {
    path: PathBuf,
    header: RwLock<AssemblyLogHeader>,
    writer: RwLock<Option<File>>,
    reader: Mutex<Option<File>>,
}

impl AssemblyLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            header: RwLock::new(AssemblyLogHeader::default()),
            writer: RwLock::new(None),
            reader: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 日志头快照。
    pub fn header(&self) -> AssemblyResultOf<AssemblyLogHeader> {
        let guard = self.header.read().map_err(|_| AssemblyError::LockPoisoned)?;
        Ok(guard.clone())
    }

    /// 首次运行与续传的分界点。
    ///
    /// 文件不存在时用给定区间与标签初始化日志头并创建文件，返回 `true`；
    /// 文件已存在时忽略给定参数，加载文件中的日志头，返回 `false`。
    pub fn init_file(&self, low: i64, high: i64, tag: &[u8]) -> AssemblyResultOf<bool> {
        if !self.path.exists() {
            {
                let mut header = self.header.write().map_err(|_| AssemblyError::LockPoisoned)?;
                header.init(low, high, tag)?;
            }
            self.init(false)?;
            debug!(path = %self.path.display(), low, high, "创建新的组装日志");
            return Ok(true);
        }

        // 已有但为空的文件不是本次创建的，不往里写日志头
        let size = std::fs::metadata(&self.path)?.len();
        if size < HEADER_SIZE as u64 {
            return Err(AssemblyError::InvalidFileSize {
                size,
                header: HEADER_SIZE as u64,
            });
        }
        self.init(false)?;
        debug!(path = %self.path.display(), "加载已有组装日志");
        Ok(false)
    }

    /// 打开写句柄（`read_only` 为 `false` 时）与独立的读句柄，可重复调用。
    ///
    /// 写句柄首次创建且文件为空时写入日志头；文件非空但不足日志头长度时返回 `InvalidFileSize`。
    pub fn init(&self, read_only: bool) -> AssemblyResultOf<()> {
        let mut refresh_header = true;

        if !read_only {
            let mut writer = self.writer.write().map_err(|_| AssemblyError::LockPoisoned)?;
            if writer.is_none() {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                let size = file.metadata()?.len();
                if size == 0 {
                    let header = self.header.read().map_err(|_| AssemblyError::LockPoisoned)?;
                    header.write(&mut file)?;
                    refresh_header = false;
                } else if size < HEADER_SIZE as u64 {
                    return Err(AssemblyError::InvalidFileSize {
                        size,
                        header: HEADER_SIZE as u64,
                    });
                }
                *writer = Some(file);
            }
        }

        let mut reader = self.reader.lock().map_err(|_| AssemblyError::LockPoisoned)?;
        if reader.is_none() {
            let mut file = File::open(&self.path)?;
            if refresh_header {
                let loaded = AssemblyLogHeader::read(&mut file)?;
                let mut header = self.header.write().map_err(|_| AssemblyError::LockPoisoned)?;
                *header = loaded;
            }
            *reader = Some(file);
        }
        Ok(())
    }

    /// 追加一个已完成区间。
    pub fn append(&self, low: i64, high: i64) -> AssemblyResultOf<()> {
        let writer = self.writer.read().map_err(|_| AssemblyError::LockPoisoned)?;
        let mut file: &File = writer.as_ref().ok_or(AssemblyError::LogNotOpen)?;
        file.write_all(&encode_range(low, high))?;
        trace!(low, high, "追加日志条目");
        Ok(())
    }

    /// 重放日志，返回尚未写入的区间。
    pub fn read(&self) -> AssemblyResultOf<SlottedRangeStore> {
        let span = self.header()?.span();
        let mut missing = SlottedRangeStore::new();
        missing.add(span.low, span.high)?;

        let reader = self.reader.lock().map_err(|_| AssemblyError::LockPoisoned)?;
        let mut file: &File = reader.as_ref().ok_or(AssemblyError::LogNotOpen)?;
        file.seek(SeekFrom::Start(HEADER_SIZE as u64))?;

        let mut buffered = BufReader::new(file);
        let mut entry = [0u8; RANGE_ENTRY_SIZE];
        loop {
            match buffered.read_exact(&mut entry) {
                Ok(()) => {
                    let (low, high) = decode_range(&entry);
                    missing.sub(low, high)?;
                }
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(missing)
    }

    /// 将写句柄上的数据落盘；不保证目录项持久化。
    pub fn flush(&self) -> AssemblyResultOf<()> {
        let writer = self.writer.read().map_err(|_| AssemblyError::LockPoisoned)?;
        let file = writer.as_ref().ok_or(AssemblyError::LogNotOpen)?;
        file.sync_data()?;
        Ok(())
    }

    /// 关闭读写句柄，重复调用无副作用。
    pub fn close(&self) -> AssemblyResultOf<()> {
        let writer = self
            .writer
            .write()
            .map_err(|_| AssemblyError::LockPoisoned)?
            .take();
        let reader = self
            .reader
            .lock()
            .map_err(|_| AssemblyError::LockPoisoned)?
            .take();
        if writer.is_some() || reader.is_some() {
            debug!(path = %self.path.display(), "关闭组装日志");
        }
        Ok(())
    }

    /// 压缩日志（用当前缺失区间重写条目），尚未实现。
    pub fn compact(&self) -> AssemblyResultOf<()> {
        Err(AssemblyError::NotImplemented("组装日志压缩"))
    }

    /// 删除日志文件；文件存在且被删除时返回 `true`。
    pub fn delete(&self) -> AssemblyResultOf<bool> {
        if !self.path.is_file() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        debug!(path = %self.path.display(), "删除组装日志");
        Ok(true)
    }
}
