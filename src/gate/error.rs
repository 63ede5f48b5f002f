//! Error types for ranged-gate
//!
//! ranged-gate 的错误类型

use super::range::Kind;
use std::fmt;
use std::io;

/// Error type for ranged-gate operations
///
/// ranged-gate 操作的错误类型
///
/// Broken protocol invariants (a `blocked_by` counter going below zero, a wait
/// signal posted twice, releasing a slot that is not held) are not represented
/// here: they panic.
///
/// 协议不变量被破坏（`blocked_by` 计数减到负数、等待信号被重复发出、释放未持有的槽位）
/// 不在此表示，而是直接 panic。
#[derive(Debug)]
pub enum Error {
    /// I/O error
    ///
    /// I/O 错误
    Io(io::Error),

    /// Empty backing file cannot be attached
    ///
    /// 空的后备文件无法挂载
    EmptyRegion,

    /// Backing file is shorter than the control block
    ///
    /// 后备文件小于控制块
    RegionTooSmall {
        len: u64,
        required: u64,
    },

    /// Control block header does not match this build's layout
    ///
    /// 控制块头部与当前构建的布局不匹配
    LayoutMismatch {
        what: &'static str,
    },

    /// Range start is after its end
    ///
    /// 范围起点大于终点
    InvalidRange {
        start: u64,
        end: u64,
    },

    /// Requested admission capacity exceeds the slot capacity
    ///
    /// 请求的准入容量超过槽位容量
    InvalidCapacity {
        requested: u32,
        max: u32,
    },

    /// Unknown verbosity name
    ///
    /// 未知的日志详细程度
    InvalidVerbosity(String),

    /// No empty slot was left in the participant table
    ///
    /// 参与者表中没有空槽位
    TableExhausted {
        kind: Kind,
        capacity: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::EmptyRegion => write!(f, "Cannot attach empty region / 无法挂载空区域"),
            Error::RegionTooSmall { len, required } => {
                write!(
                    f,
                    "Region length {} is smaller than control block size {} / 区域长度 {} 小于控制块大小 {}",
                    len, required, len, required
                )
            }
            Error::LayoutMismatch { what } => {
                write!(f, "Control block {} mismatch / 控制块 {} 不匹配", what, what)
            }
            Error::InvalidRange { start, end } => {
                write!(
                    f,
                    "Range start {} is after end {} / 范围起点 {} 大于终点 {}",
                    start, end, start, end
                )
            }
            Error::InvalidCapacity { requested, max } => {
                write!(
                    f,
                    "Admission capacity {} exceeds slot capacity {} / 准入容量 {} 超过槽位容量 {}",
                    requested, max, requested, max
                )
            }
            Error::InvalidVerbosity(name) => {
                write!(f, "Unknown verbosity {:?} / 未知的日志级别 {:?}", name, name)
            }
            Error::TableExhausted { kind, capacity } => {
                write!(
                    f,
                    "{} table exhausted ({} slots) / {} 表已满（{} 个槽位）",
                    kind, capacity, kind, capacity
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Convert from io::Error to Error
///
/// 从 io::Error 转换到 Error
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Convert from Error to io::Error for compatibility
///
/// 从 Error 转换到 io::Error 以保持兼容性
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io_err) => io_err,
            Error::EmptyRegion
            | Error::RegionTooSmall { .. }
            | Error::LayoutMismatch { .. } => io::Error::new(io::ErrorKind::InvalidData, err.to_string()),
            Error::InvalidRange { .. }
            | Error::InvalidCapacity { .. }
            | Error::InvalidVerbosity(_) => io::Error::new(io::ErrorKind::InvalidInput, err.to_string()),
            Error::TableExhausted { .. } => io::Error::new(io::ErrorKind::OutOfMemory, err.to_string()),
        }
    }
}

/// Result type alias using our custom Error type
///
/// 使用自定义 Error 类型的 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
