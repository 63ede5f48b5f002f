//! Safe participant handle over a shared control block
//!
//! 基于共享控制块的安全参与者句柄

use super::error::Result;
use super::layout::ControlBlock;
use super::options::{GateOptions, Verbosity};
use super::region::Region;
use std::path::Path;
use std::sync::Arc;

/// Handle through which a participant is admitted and released
///
/// 参与者进行准入与释放的句柄
///
/// A `Gate` is an attachment to one control block. Cloning is cheap and shares the
/// same mapping; threads may each hold a clone, and other processes attach with
/// [`Gate::open`]. Verbosity and the owner id reported in diagnostics are
/// per-handle settings, not shared state.
///
/// `Gate` 是对一个控制块的挂载。克隆代价很低且共享同一映射；每个线程可以持有一个克隆，
/// 其他进程通过 [`Gate::open`] 挂载。日志详细程度和诊断中报告的所有者 id 是句柄级设置，
/// 不是共享状态。
///
/// # Usage Example
///
/// ```
/// # use ranged_gate::{Gate, GateOptions, RecordRange, Request, Result};
/// # fn main() -> Result<()> {
/// let gate = Gate::anonymous(GateOptions::new())?;
///
/// let writer = gate.admit(Request::write(10))?;
/// assert_eq!(writer.blocked_by(), 0);
///
/// // A reader over [5, 15] arriving now would wait for the writer
/// // 此时到达的 [5, 15] 读者会等待写者
/// let reader_gate = gate.clone();
/// std::thread::scope(|s| {
///     let reader = s.spawn(move || {
///         let reader = reader_gate.admit(Request::read(RecordRange::new(5, 15)?))?;
///         assert_eq!(reader.blocked_by(), 1);
///         reader_gate.complete(reader, 11);
///         Ok::<_, ranged_gate::Error>(())
///     });
///
///     while gate.occupancy().readers.is_empty() {
///         std::thread::yield_now();
///     }
///     gate.complete(writer, 1);
///     reader.join().unwrap()
/// })?;
///
/// let stats = gate.stats_snapshot();
/// assert_eq!(stats.total_writers, 1);
/// assert_eq!(stats.total_readers, 1);
/// assert_eq!(stats.processed_count, 12);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Gate {
    region: Arc<Region>,
    verbosity: Verbosity,
    owner: u32,
}

impl Gate {
    /// Attach to an existing control block at `path`
    ///
    /// 挂载 `path` 处已存在的控制块
    ///
    /// # Errors
    /// - `EmptyRegion` / `RegionTooSmall` if the file cannot hold a control block
    /// - `LayoutMismatch` if the header was written by an incompatible build
    ///   or is not initialized yet
    ///
    /// # Errors
    /// - 如果文件无法容纳控制块，返回 `EmptyRegion` / `RegionTooSmall`
    /// - 如果头部由不兼容的版本写入或尚未初始化，返回 `LayoutMismatch`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_region(Region::open(path)?, Verbosity::Off))
    }

    /// Create a control block shared by the threads of this process
    ///
    /// 创建由本进程线程共享的控制块
    pub fn anonymous(options: GateOptions) -> Result<Self> {
        options.validate()?;
        let region = Region::anonymous(options.get_max_admitted().get())?;
        Ok(Self::from_region(region, options.get_verbosity()))
    }

    pub(crate) fn from_region(region: Region, verbosity: Verbosity) -> Self {
        Self {
            region: Arc::new(region),
            verbosity,
            owner: std::process::id(),
        }
    }

    /// Same attachment with a different diagnostics verbosity
    ///
    /// 相同挂载，使用不同的诊断日志详细程度
    #[inline]
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Same attachment reporting `owner` instead of the process id
    ///
    /// 相同挂载，报告 `owner` 而不是进程 id
    #[inline]
    pub fn with_owner(mut self, owner: u32) -> Self {
        self.owner = owner;
        self
    }

    #[inline]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Identity recorded in the slots this handle occupies
    ///
    /// 此句柄占用的槽位中记录的身份
    #[inline]
    pub fn owner(&self) -> u32 {
        self.owner
    }

    /// Admission tokens configured when the block was created
    ///
    /// 创建控制块时配置的准入令牌数量
    #[inline]
    pub fn max_admitted(&self) -> u32 {
        self.block().max_admitted()
    }

    /// Admission tokens not currently taken
    ///
    /// 当前未被占用的准入令牌数量
    #[inline]
    pub fn available_tokens(&self) -> u32 {
        self.block().admission.available()
    }

    #[inline]
    pub(crate) fn block(&self) -> &ControlBlock {
        self.region.block()
    }
}

/// Implement Debug for Gate
///
/// 为 Gate 实现 Debug
impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("region", &self.region)
            .field("verbosity", &self.verbosity)
            .field("owner", &self.owner)
            .finish()
    }
}
