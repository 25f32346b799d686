use std::path::PathBuf;

use tokio::runtime::Handle;

use super::assembly_mode::AssemblyMode;

/// 部分文件后缀
pub const PART_EXT: &str = ".part";

/// 组装日志文件后缀
pub const LOG_EXT: &str = ".binlog";

/// 默认块大小：1MB，用于 consume 与输出流
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub mode: AssemblyMode,
    /// 关闭时若已无缺失区间，则删除日志并把部分文件重命名为目标文件
    pub auto_cleanup: bool,
    /// 每块的字节数
    pub buffer_size: usize,
    /// 自定义日志路径；`None` 时为目标路径 + [`LOG_EXT`]
    pub log_path: Option<PathBuf>,
    /// 异步模式使用的运行时；`None` 时取当前运行时，没有则自建
    pub runtime: Option<Handle>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            mode: AssemblyMode::Sync,
            auto_cleanup: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
            log_path: None,
            runtime: None,
        }
    }
}
