//! Range-aware reader/writer admission over a memory-mapped control block
//!
//! 基于内存映射控制块的范围感知读写准入
//!
//! Provides:
//! - [`Gate`]: participant handle offering `admit` / `release` and statistics
//! - [`Session`]: exclusive creator and owner of a named control block
//!
//! 提供：
//! - [`Gate`]: 提供 `admit` / `release` 与统计功能的参与者句柄
//! - [`Session`]: 具名控制块的独占创建者和所有者
//!
//! # Protocol
//!
//! 1. A participant takes one of `max_admitted` admission tokens
//! 2. Under the table mutex it counts the conflicting participants already present,
//!    takes the first empty slot of its table and the next ticket
//! 3. If anything conflicts, it sleeps on the slot's private wait signal
//! 4. On release it clears its slot and decrements `blocked_by` on every conflicting
//!    entry with a later ticket, raising the signal of each entry that reaches zero
//! 5. It returns its admission token
//!
//! # 协议
//!
//! 1. 参与者获取 `max_admitted` 个准入令牌中的一个
//! 2. 在表互斥锁下统计已存在的冲突参与者，占用所在表的第一个空槽位并获取下一个票据
//! 3. 若存在冲突，则在槽位的私有等待信号上休眠
//! 4. 释放时清空自己的槽位，并对所有票据更晚的冲突条目递减 `blocked_by`，
//!    计数归零的条目会被触发信号
//! 5. 归还准入令牌

mod admission;
mod error;
mod handle;
mod layout;
mod options;
mod range;
mod region;
mod release;
mod session;
mod stats;
mod sync;
mod ticket;


// Re-export public API
// 重新导出公共 API
pub use error::{Error, Result};
pub use handle::Gate;
pub use layout::SLOT_CAPACITY;
pub use options::{GateOptions, Verbosity};
pub use range::{Admission, Kind, RecordRange, ReleaseReceipt, Request};
pub use session::Session;
pub use stats::{Occupancy, SlotView, StatsSnapshot};
pub use ticket::Ticket;
