//! Statistics aggregator and occupancy snapshots
//!
//! 统计聚合器与占用快照

use super::handle::Gate;
use super::layout::{ControlBlock, GlobalTotals, KindTotals};
use super::range::{Admission, Kind, RecordRange, ReleaseReceipt};
use super::sync::ShmMutexGuard;
use super::ticket::Ticket;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Copy of the running statistics
///
/// 运行统计的副本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsSnapshot {
    pub total_readers: u64,
    pub total_writers: u64,
    pub cumulative_read_wait: Duration,
    pub cumulative_write_wait: Duration,
    pub max_wait: Duration,
    pub processed_count: u64,
}

impl StatsSnapshot {
    /// Mean reader wait, `None` before the first reader is recorded
    ///
    /// 读者平均等待时间，在记录第一个读者之前为 `None`
    pub fn average_read_wait(&self) -> Option<Duration> {
        average(self.cumulative_read_wait, self.total_readers)
    }

    /// Mean writer wait, `None` before the first writer is recorded
    ///
    /// 写者平均等待时间，在记录第一个写者之前为 `None`
    pub fn average_write_wait(&self) -> Option<Duration> {
        average(self.cumulative_write_wait, self.total_writers)
    }
}

fn average(total: Duration, count: u64) -> Option<Duration> {
    if count == 0 {
        return None;
    }
    Some(Duration::from_micros((total.as_micros() / count as u128) as u64))
}

/// One occupied slot as seen in an [`Occupancy`] snapshot
///
/// [`Occupancy`] 快照中的一个已占用槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotView {
    pub slot: usize,
    pub range: RecordRange,
    pub ticket: Ticket,
    pub blocked_by: u32,
    pub owner: u32,
}

impl SlotView {
    /// Past its wait (or never had to wait)
    ///
    /// 已通过等待（或无需等待）
    #[inline]
    pub fn is_running(&self) -> bool {
        self.blocked_by == 0
    }
}

/// Consistent picture of both tables taken under the table mutex
///
/// 在表互斥锁下获取的两张表的一致快照
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Occupancy {
    pub readers: Vec<SlotView>,
    pub writers: Vec<SlotView>,
    pub active_readers: u32,
    pub active_writers: u32,
    pub next_ticket: u64,
}

impl Occupancy {
    /// Table counters agree with the occupied slots
    ///
    /// 表计数器与已占用槽位一致
    pub fn is_consistent(&self) -> bool {
        self.active_readers as usize == self.readers.len()
            && self.active_writers as usize == self.writers.len()
    }

    /// Total participants holding a slot
    ///
    /// 持有槽位的参与者总数
    pub fn len(&self) -> usize {
        self.readers.len() + self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Both kind mutexes held in the global order, granting the cross-kind totals
///
/// 按全局顺序持有两个类型互斥锁，从而可以访问跨类型统计
///
/// The reader mutex is always taken before the writer mutex, whatever the kind of
/// the caller, so two participants can never hold one each and wait for the other.
///
/// 无论调用者属于哪种类型，总是先获取读者互斥锁再获取写者互斥锁，
/// 因此两个参与者不可能各持一把锁并等待对方。
struct StatsGuard<'a> {
    readers: ShmMutexGuard<'a, KindTotals>,
    writers: ShmMutexGuard<'a, KindTotals>,
    block: &'a ControlBlock,
}

impl<'a> StatsGuard<'a> {
    fn lock(block: &'a ControlBlock) -> Self {
        let readers = block.kind_stats(Kind::Reader).lock();
        let writers = block.kind_stats(Kind::Writer).lock();
        Self { readers, writers, block }
    }
}

impl Deref for StatsGuard<'_> {
    type Target = GlobalTotals;

    fn deref(&self) -> &GlobalTotals {
        // Safety: both kind mutexes are held for the guard's lifetime
        // Safety: 守卫存活期间同时持有两个类型互斥锁
        unsafe { &*self.block.global_stats.get() }
    }
}

impl DerefMut for StatsGuard<'_> {
    fn deref_mut(&mut self) -> &mut GlobalTotals {
        // Safety: both kind mutexes are held for the guard's lifetime
        // Safety: 守卫存活期间同时持有两个类型互斥锁
        unsafe { &mut *self.block.global_stats.get() }
    }
}

#[inline]
fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

impl Gate {
    /// Account one finished participant of `kind` that waited `wait`
    ///
    /// 记录一个等待了 `wait` 的 `kind` 类型参与者完成
    ///
    /// Updates the kind's count and cumulative wait under the kind mutex, then
    /// raises the global maximum under both mutexes.
    ///
    /// 在类型互斥锁下更新该类型的计数和累计等待时间，然后在两把锁下更新全局最大值。
    pub fn record_timing(&self, kind: Kind, wait: Duration) {
        let block = self.block();
        let wait = micros(wait);

        {
            let mut totals = block.kind_stats(kind).lock();
            totals.count += 1;
            totals.cumulative_wait_micros = totals.cumulative_wait_micros.saturating_add(wait);
        }

        let mut global = StatsGuard::lock(block);
        global.max_wait_micros = global.max_wait_micros.max(wait);
    }

    /// Add `count` processed records to the global total
    ///
    /// 将 `count` 条已处理记录加入全局总数
    pub fn record_processed(&self, count: u64) {
        let mut global = StatsGuard::lock(self.block());
        global.processed = global.processed.saturating_add(count);
    }

    /// Release, then record the admission's wait and `processed` records
    ///
    /// 释放，然后记录此次准入的等待时间和 `processed` 条记录
    pub fn complete(&self, admission: Admission, processed: u64) -> ReleaseReceipt {
        let kind = admission.kind();
        let waited = admission.waited();
        let receipt = self.release(admission);
        self.record_timing(kind, waited);
        self.record_processed(processed);
        receipt
    }

    /// Copy all statistics under both statistics mutexes
    ///
    /// 在两把统计互斥锁下复制全部统计数据
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        let global = StatsGuard::lock(self.block());
        StatsSnapshot {
            total_readers: global.readers.count,
            total_writers: global.writers.count,
            cumulative_read_wait: Duration::from_micros(global.readers.cumulative_wait_micros),
            cumulative_write_wait: Duration::from_micros(global.writers.cumulative_wait_micros),
            max_wait: Duration::from_micros(global.max_wait_micros),
            processed_count: global.processed,
        }
    }

    /// Snapshot both participant tables under the table mutex
    ///
    /// 在表互斥锁下获取两张参与者表的快照
    pub fn occupancy(&self) -> Occupancy {
        let tables = self.block().tables.lock();
        let views = |kind: Kind| -> Vec<SlotView> {
            tables
                .occupied(kind)
                .map(|(slot, entry)| SlotView {
                    slot,
                    range: entry.range(),
                    ticket: entry.ticket(),
                    blocked_by: entry.blocked_by,
                    owner: entry.owner,
                })
                .collect()
        };

        Occupancy {
            readers: views(Kind::Reader),
            writers: views(Kind::Writer),
            active_readers: tables.active(Kind::Reader),
            active_writers: tables.active(Kind::Writer),
            next_ticket: tables.tickets.peek().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_wait() {
        let mut snapshot = StatsSnapshot::default();
        assert_eq!(snapshot.average_read_wait(), None);
        assert_eq!(snapshot.average_write_wait(), None);

        snapshot.total_readers = 4;
        snapshot.cumulative_read_wait = Duration::from_millis(10);
        assert_eq!(snapshot.average_read_wait(), Some(Duration::from_micros(2500)));
    }

    #[test]
    fn test_micros_saturates() {
        assert_eq!(micros(Duration::from_micros(7)), 7);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
