//! 初始化前对目标文件、部分文件与日志文件三者状态的一致性检查。

use std::path::Path;

use tracing::warn;

use crate::internal::assembly_log::structs::assembly_log_header::AssemblyLogHeader;
use crate::internal::errors::{AssemblyError, AssemblyResultOf};
use crate::internal::range::structs::range::Range;

/// 检查磁盘状态是否允许开始（或继续）组装。
///
/// 依次检查：目标文件已存在、只有日志没有部分文件、只有部分文件没有日志；
/// 任何一项命中都不会创建或修改文件。
pub(super) fn check_files(target: &Path, part: &Path, log: &Path) -> AssemblyResultOf<()> {
    let display = target.display().to_string();
    if target.exists() {
        return Err(AssemblyError::AlreadyComplete(display));
    }

    match (part.exists(), log.exists()) {
        (false, true) => {
            warn!(log = %log.display(), "日志存在但部分文件缺失");
            Err(AssemblyError::MissingPartialFile(display))
        }
        (true, false) => {
            warn!(part = %part.display(), "部分文件存在但日志缺失");
            Err(AssemblyError::DanglingTrackerFile(display))
        }
        _ => Ok(()),
    }
}

/// 确保目标文件所在目录存在，不存在时逐级创建。
pub(super) fn ensure_parent_dir(target: &Path) -> AssemblyResultOf<()> {
    let Some(parent) = target.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    if parent.exists() {
        if !parent.is_dir() {
            return Err(AssemblyError::NotADirectory(parent.display().to_string()));
        }
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|source| AssemblyError::DirectoryCreateFailed {
        path: parent.display().to_string(),
        source,
    })
}

/// 已有日志的区间与标签必须与本次请求一致，否则说明源内容已变。
pub(super) fn verify_header(
    header: &AssemblyLogHeader,
    target_size: i64,
    tag: &[u8],
) -> AssemblyResultOf<()> {
    let expected = Range {
        low: 0,
        high: target_size.saturating_sub(1),
    };
    let span = header.span();
    let stored_tag = header.tag()?;
    if span != expected || stored_tag != tag {
        return Err(AssemblyError::SignatureMismatch(format!(
            "期望 {} / {:?}，日志中为 {} / {:?}",
            expected,
            String::from_utf8_lossy(tag),
            span,
            String::from_utf8_lossy(stored_tag)
        )));
    }
    Ok(())
}
