//! 组装日志领域模块：日志头编解码与只追加日志。

pub mod structs;
