//! Fair range-aware reader/writer admission across processes
//!
//! 跨进程的公平、范围感知读写准入
//!
//! This library coordinates independent processes (or threads) that contend for
//! overlapping record ranges of a shared file. All coordination state lives in one
//! memory-mapped control block; blocking uses process-shared futex words embedded
//! in that block.
//!
//! 本库协调争用共享文件中重叠记录范围的独立进程（或线程）。所有协调状态都存放在
//! 一个内存映射的控制块中；阻塞使用嵌入在该控制块中的跨进程 futex 字。
//!
//! # Features
//!
//! - **Range-aware**: Readers share access; a writer excludes readers whose range
//!   contains its record and writers on the same record
//! - **Fair**: A global ticket orders arrivals; nobody overtakes an earlier
//!   conflicting participant
//! - **Explicit wake-up**: Each waiter sleeps on its own signal and is woken
//!   exactly once, by the last conflicting participant to release
//! - **Bounded**: At most `max_admitted` participants are inside at once
//! - **Multi-process**: File-backed control blocks work across `fork`/`exec`
//!
//! # 特性
//!
//! - **范围感知**：读者共享访问；写者排斥范围包含其记录的读者以及同一记录上的写者
//! - **公平**：全局票据为到达排序；任何人都不会越过更早到达的冲突参与者
//! - **显式唤醒**：每个等待者在自己的信号上休眠，并由最后一个释放的冲突参与者唤醒恰好一次
//! - **有界**：同时最多有 `max_admitted` 个参与者在内部
//! - **多进程**：基于文件的控制块可跨 `fork`/`exec` 使用
//!
//! # Platform Support
//!
//! Blocking waits use the Linux futex and sleep in the kernel until woken. On
//! other targets the same words are polled: a short spin followed by 200µs
//! sleeps, so waiters there cost CPU wake-ups and see extra latency.
//!
//! # 平台支持
//!
//! 阻塞等待在 Linux 上使用 futex，在内核中休眠直到被唤醒。在其他平台上会轮询同样的字：
//! 先短暂自旋，然后以 200µs 为间隔休眠，因此等待者会产生额外的 CPU 唤醒和延迟。
//!
//! # Quick Start
//!
//! ```
//! use ranged_gate::{GateOptions, RecordRange, Request, Result, Session};
//! # use tempfile::tempdir;
//! # fn main() -> Result<()> {
//! # let dir = tempdir()?;
//! # let path = dir.path().join("records.gate");
//!
//! // Create the shared block (other processes use Gate::open(&path))
//! // 创建共享控制块（其他进程使用 Gate::open(&path)）
//! let session = Session::create(&path, GateOptions::new())?;
//! let gate = session.gate();
//!
//! // Overlapping readers are admitted together
//! // 重叠的读者会被同时准入
//! let r1 = gate.admit(Request::read(RecordRange::new(0, 99)?))?;
//! let r2 = gate.admit(Request::read(RecordRange::new(50, 149)?))?;
//! assert_eq!(r1.blocked_by() + r2.blocked_by(), 0);
//! assert!(r1.ticket() < r2.ticket());
//!
//! // ... read records ...
//! // ... 读取记录 ...
//!
//! gate.complete(r1, 100);
//! gate.complete(r2, 100);
//!
//! let stats = gate.stats_snapshot();
//! assert_eq!(stats.total_readers, 2);
//! assert_eq!(stats.processed_count, 200);
//! # Ok(())
//! # }
//! ```
//!
//! # Main Types
//!
//! - [`Session`]: Creates a named control block and unlinks it when dropped
//! - [`Gate`]: Attachment to a control block; `admit`, `release`, statistics
//! - [`Request`]: A reader range or a writer record
//! - [`Admission`]: Proof of admission, consumed by [`Gate::release`]
//! - [`StatsSnapshot`] / [`Occupancy`]: Statistics and table snapshots
//!
//! # 主要类型
//!
//! - [`Session`][]: 创建具名控制块并在丢弃时删除
//! - [`Gate`][]: 对控制块的挂载；`admit`、`release`、统计
//! - [`Request`][]: 读者范围或写者记录
//! - [`Admission`][]: 准入凭据，由 [`Gate::release`] 消费
//! - [`StatsSnapshot`] / [`Occupancy`][]: 统计与表快照

mod gate;

pub use gate::{
    Admission, Error, Gate, GateOptions, Kind, Occupancy, RecordRange, ReleaseReceipt, Request,
    Result, SLOT_CAPACITY, Session, SlotView, StatsSnapshot, Ticket, Verbosity,
};
