//! Gate configuration
//!
//! Gate 配置

use super::error::{Error, Result};
use super::layout::SLOT_CAPACITY;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Diagnostics verbosity of one gate handle
///
/// 单个 gate 句柄的诊断日志详细程度
///
/// Events go through `tracing`; the sink is whatever subscriber the process installs.
///
/// 事件通过 `tracing` 输出；输出目标由进程安装的订阅者决定。
///
/// - `Off`: nothing
/// - `Basic`: entered / passed / exited events with blocker and wake counts
/// - `Detailed`: additionally every blocking relationship, every decrement at
///   release, and the active participant listing
///
/// - `Off`：不输出
/// - `Basic`：进入、通过、退出事件，附带阻塞与唤醒计数
/// - `Detailed`：额外输出每一条阻塞关系、释放时的每次递减以及当前活跃参与者列表
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Verbosity {
    #[default]
    Off,
    Basic,
    Detailed,
}

impl Verbosity {
    #[inline]
    pub fn basic(self) -> bool {
        self >= Verbosity::Basic
    }

    #[inline]
    pub fn detailed(self) -> bool {
        self >= Verbosity::Detailed
    }
}

/// Parses `off`, `basic`, `detailed`, or the numeric levels `0`..=`3`
/// (`1` and `2` are both basic)
///
/// 解析 `off`、`basic`、`detailed` 或数字级别 `0`..=`3`（`1` 和 `2` 都是 basic）
impl FromStr for Verbosity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(Verbosity::Off),
            "basic" | "1" | "2" => Ok(Verbosity::Basic),
            "detailed" | "3" => Ok(Verbosity::Detailed),
            _ => Err(Error::InvalidVerbosity(s.to_string())),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Off => f.write_str("off"),
            Verbosity::Basic => f.write_str("basic"),
            Verbosity::Detailed => f.write_str("detailed"),
        }
    }
}

/// Options for creating a control block
///
/// 创建控制块的选项
///
/// # Examples
///
/// ```
/// # use ranged_gate::{GateOptions, Verbosity};
/// # use std::num::NonZeroU32;
/// let options = GateOptions::new()
///     .max_admitted(NonZeroU32::new(16).unwrap())
///     .verbosity(Verbosity::Basic);
/// assert_eq!(options.get_max_admitted().get(), 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateOptions {
    /// Admission tokens: participants allowed inside the pipeline at once
    ///
    /// 准入令牌：同时允许进入流程的参与者数量
    max_admitted: NonZeroU32,

    /// Verbosity of the handle returned by the constructor
    ///
    /// 构造函数返回的句柄的日志详细程度
    verbosity: Verbosity,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            max_admitted: NonZeroU32::new(SLOT_CAPACITY as u32).expect("slot capacity is non-zero"),
            verbosity: Verbosity::Off,
        }
    }
}

impl GateOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn max_admitted(mut self, max_admitted: NonZeroU32) -> Self {
        self.max_admitted = max_admitted;
        self
    }

    #[inline]
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[inline]
    pub fn get_max_admitted(&self) -> NonZeroU32 {
        self.max_admitted
    }

    #[inline]
    pub fn get_verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Check the options against the compiled slot capacity
    ///
    /// 按编译期槽位容量校验选项
    ///
    /// # Errors
    /// Returns `InvalidCapacity` if `max_admitted` exceeds [`SLOT_CAPACITY`]
    ///
    /// # Errors
    /// 如果 `max_admitted` 超过 [`SLOT_CAPACITY`]，返回 `InvalidCapacity` 错误
    pub fn validate(&self) -> Result<()> {
        if self.max_admitted.get() as usize > SLOT_CAPACITY {
            return Err(Error::InvalidCapacity {
                requested: self.max_admitted.get(),
                max: SLOT_CAPACITY as u32,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_parsing() {
        assert_eq!("off".parse::<Verbosity>().unwrap(), Verbosity::Off);
        assert_eq!("Basic".parse::<Verbosity>().unwrap(), Verbosity::Basic);
        assert_eq!(" detailed ".parse::<Verbosity>().unwrap(), Verbosity::Detailed);
        assert_eq!("1".parse::<Verbosity>().unwrap(), Verbosity::Basic);
        assert_eq!("2".parse::<Verbosity>().unwrap(), Verbosity::Basic);
        assert_eq!("3".parse::<Verbosity>().unwrap(), Verbosity::Detailed);
        assert!(matches!("loud".parse::<Verbosity>(), Err(Error::InvalidVerbosity(_))));
    }

    #[test]
    fn test_verbosity_ordering() {
        assert!(!Verbosity::Off.basic());
        assert!(Verbosity::Basic.basic());
        assert!(!Verbosity::Basic.detailed());
        assert!(Verbosity::Detailed.basic());
        assert!(Verbosity::Detailed.detailed());
    }

    #[test]
    fn test_options_validation() {
        assert!(GateOptions::new().validate().is_ok());
        let too_many = GateOptions::new().max_admitted(NonZeroU32::new(SLOT_CAPACITY as u32 + 1).unwrap());
        match too_many.validate() {
            Err(Error::InvalidCapacity { requested, max }) => {
                assert_eq!(requested, SLOT_CAPACITY as u32 + 1);
                assert_eq!(max, SLOT_CAPACITY as u32);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
