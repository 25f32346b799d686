/// 内部实现模块
mod internal;


/// 区间与区间集合
pub mod range {
    use crate::internal;
    pub use internal::range::structs::*;
    pub use internal::range::traits::range_store::{
        decode_range, encode_range, RangeStore, RANGE_ENTRY_SIZE,
    };
}

/// 组装日志：日志头与只追加的区间条目
pub mod assembly_log {
    use crate::internal;
    pub use internal::assembly_log::structs::*;
}

/// 组装器：同步/异步写入、输出流与带续传的入口
pub mod assembler {
    use crate::internal;
    pub use internal::assembler::structs::*;
    pub use internal::assembler::traits::*;
}

pub mod states {
    pub mod progress_state {
        use crate::internal;
        pub use internal::states::progress_state::*;
    }
}

pub mod errors {
    use crate::internal;
    pub use internal::errors::*;
}
