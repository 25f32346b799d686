//! 文件组装相关错误类型。

use thiserror::Error;

/// 组装过程中所有可失败操作的统一错误。
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("非法区间: low({low}) > high({high})")]
    InvalidRange { low: i64, high: i64 },

    /// 单段存储只接受与当前区间相交或相邻的区间。
    #[error("区间 {low}-{high} 与当前区间不连续")]
    IllegalRange { low: i64, high: i64 },

    #[error("标签过长: {len} 字节，上限 {max} 字节")]
    TagTooLarge { len: usize, max: usize },

    #[error("日志文件签名不匹配")]
    BadSignature,

    #[error("数据不足: 需要 {expected} 字节，实际 {actual} 字节")]
    ChannelUnderflow { expected: u64, actual: u64 },

    #[error("日志头已损坏: {0}")]
    CorruptHeader(String),

    #[error("日志文件大小异常: {size} 字节，小于日志头 {header} 字节")]
    InvalidFileSize { size: u64, header: u64 },

    #[error("组装器只能初始化一次")]
    AlreadyInitialized,

    #[error("组装器尚未初始化")]
    NotInitialized,

    #[error("目标文件已存在: {0}")]
    AlreadyComplete(String),

    #[error("缺少部分文件，日志文件孤立存在: {0}")]
    MissingPartialFile(String),

    #[error("缺少日志文件，部分文件孤立存在: {0}")]
    DanglingTrackerFile(String),

    #[error("创建目录失败 {path}: {source}")]
    DirectoryCreateFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("父路径不是目录: {0}")]
    NotADirectory(String),

    /// 续传时日志头中的区间或标签与调用方期望不一致。
    #[error("日志头与期望不符: {0}")]
    SignatureMismatch(String),

    #[error("写入超出范围: 上限 {limit} 字节")]
    Overflow { limit: i64 },

    #[error("已有线程在等待异步写入完成")]
    AlreadyWaiting,

    #[error("未实现: {0}")]
    NotImplemented(&'static str),

    #[error("日志文件未打开")]
    LogNotOpen,

    #[error("组装器已关闭")]
    AssemblerClosed,

    #[error("获取内部锁失败")]
    LockPoisoned,

    #[error("重命名部分文件失败: {0}")]
    Rename(std::io::Error),

    #[error("后台写入任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 本库统一的返回类型。
pub type AssemblyResultOf<T> = Result<T, AssemblyError>;
