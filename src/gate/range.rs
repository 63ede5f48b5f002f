//! Record range, request and admission proof types
//!
//! 记录范围、请求和准入凭据类型

use super::error::{Error, Result};
use super::ticket::Ticket;
use std::fmt;
use std::time::Duration;

/// Participant kind
///
/// 参与者类型
///
/// Readers share access with other readers; every other pairing is exclusive
/// on overlapping ranges.
///
/// 读者之间共享访问；其他任意组合在范围重叠时互斥。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    Reader,
    Writer,
}

impl Kind {
    /// Both kinds, in table order
    ///
    /// 按表顺序排列的两种类型
    pub const ALL: [Kind; 2] = [Kind::Reader, Kind::Writer];

    /// Index of this kind's table in the control block
    ///
    /// 此类型的表在控制块中的下标
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Kind::Reader => 0,
            Kind::Writer => 1,
        }
    }

    /// Whether two participants of these kinds exclude each other on overlap
    ///
    /// 两种类型的参与者在范围重叠时是否互斥
    #[inline]
    pub fn conflicts_with(self, other: Kind) -> bool {
        !(self == Kind::Reader && other == Kind::Reader)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Reader => f.write_str("Reader"),
            Kind::Writer => f.write_str("Writer"),
        }
    }
}

/// Inclusive record range
///
/// 闭区间记录范围
///
/// Uses the closed interval `[start, end]`. A writer always holds a single point,
/// i.e. `start == end`.
///
/// 使用闭区间 `[start, end]`。写者总是持有单个点，即 `start == end`。
///
/// # Examples
///
/// ```
/// # use ranged_gate::RecordRange;
/// let range = RecordRange::new(5, 15).unwrap();
/// assert!(range.contains(10));
/// assert!(range.overlaps(&RecordRange::point(15)));
/// assert!(!range.overlaps(&RecordRange::point(16)));
/// assert_eq!(range.len(), 11);
///
/// assert!(RecordRange::new(3, 2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordRange {
    /// First record (inclusive)
    ///
    /// 第一条记录（包含）
    start: u64,

    /// Last record (inclusive)
    ///
    /// 最后一条记录（包含）
    end: u64,
}

impl RecordRange {
    /// Create a range `[start, end]`
    ///
    /// 创建范围 `[start, end]`
    ///
    /// # Errors
    /// Returns `InvalidRange` if `start > end`
    ///
    /// # Errors
    /// 如果 `start > end`，返回 `InvalidRange` 错误
    #[inline]
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a single-point range `[point, point]`
    ///
    /// 创建单点范围 `[point, point]`
    #[inline]
    pub fn point(point: u64) -> Self {
        Self { start: point, end: point }
    }

    /// Internal constructor for values read back from the control block
    ///
    /// 从控制块读回数据时使用的内部构造函数
    #[inline]
    pub(crate) fn from_bounds_unchecked(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of records covered (always at least 1)
    ///
    /// 覆盖的记录数（至少为 1）
    ///
    /// The full domain `[0, u64::MAX]` holds one record more than `u64` can count
    /// and reports `u64::MAX`.
    ///
    /// 完整值域 `[0, u64::MAX]` 比 `u64` 能表示的多一条记录，此时返回 `u64::MAX`。
    #[inline]
    pub fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    /// A closed range is never empty
    ///
    /// 闭区间永远不为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn contains(&self, record: u64) -> bool {
        self.start <= record && record <= self.end
    }

    /// Check whether two closed ranges share at least one record
    ///
    /// 检查两个闭区间是否至少共享一条记录
    #[inline]
    pub fn overlaps(&self, other: &RecordRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for RecordRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_point() {
            write!(f, "({})", self.start)
        } else {
            write!(f, "({},{})", self.start, self.end)
        }
    }
}

/// Admission request: a kind plus the range it touches
///
/// 准入请求：参与者类型及其访问的范围
///
/// # Examples
///
/// ```
/// # use ranged_gate::{Kind, RecordRange, Request};
/// let read = Request::read(RecordRange::new(0, 9).unwrap());
/// let write = Request::write(4);
/// assert_eq!(write.kind(), Kind::Writer);
/// assert!(read.conflicts_with(&write));
/// assert!(!read.conflicts_with(&Request::read(RecordRange::point(4))));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    kind: Kind,
    range: RecordRange,
}

impl Request {
    /// Shared access to `range`
    ///
    /// 对 `range` 的共享访问
    #[inline]
    pub fn read(range: RecordRange) -> Self {
        Self { kind: Kind::Reader, range }
    }

    /// Exclusive access to the single record `point`
    ///
    /// 对单条记录 `point` 的独占访问
    #[inline]
    pub fn write(point: u64) -> Self {
        Self { kind: Kind::Writer, range: RecordRange::point(point) }
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline]
    pub fn range(&self) -> RecordRange {
        self.range
    }

    /// Range conflict between two requests
    ///
    /// 两个请求之间的范围冲突
    #[inline]
    pub fn conflicts_with(&self, other: &Request) -> bool {
        conflicts(self.kind, &self.range, other.kind, &other.range)
    }
}

/// The single conflict rule shared by admission and release
///
/// 准入与释放共用的冲突规则
#[inline]
pub(crate) fn conflicts(a_kind: Kind, a: &RecordRange, b_kind: Kind, b: &RecordRange) -> bool {
    a_kind.conflicts_with(b_kind) && a.overlaps(b)
}

/// Proof that a participant was admitted
///
/// 参与者已获准入的凭据
///
/// Returned by [`Gate::admit`](super::Gate::admit) once the participant is past
/// its blocking wait. It must be handed back to [`Gate::release`](super::Gate::release).
/// Dropping it releases nothing: like a participant that crashes inside its
/// critical section, the slot and the admission token stay held.
///
/// 由 [`Gate::admit`](super::Gate::admit) 在参与者通过阻塞等待后返回，
/// 必须交还给 [`Gate::release`](super::Gate::release)。
/// 丢弃它不会释放任何东西：与在临界区内崩溃的参与者一样，槽位和准入令牌仍被占用。
#[must_use = "an admission holds a slot until it is passed to Gate::release"]
#[derive(Debug)]
pub struct Admission {
    pub(crate) block_id: u64,
    pub(crate) kind: Kind,
    pub(crate) slot: usize,
    pub(crate) ticket: Ticket,
    pub(crate) range: RecordRange,
    pub(crate) blocked_by: u32,
    pub(crate) waited: Duration,
}

impl Admission {
    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Slot index in this kind's table
    ///
    /// 在该类型表中的槽位下标
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    #[inline]
    pub fn range(&self) -> RecordRange {
        self.range
    }

    /// Number of earlier conflicting participants found at admission time
    ///
    /// 准入时发现的更早的冲突参与者数量
    #[inline]
    pub fn blocked_by(&self) -> u32 {
        self.blocked_by
    }

    /// Time from requesting the admission token until the wait was passed
    ///
    /// 从请求准入令牌到通过等待所经过的时间
    #[inline]
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

/// Receipt returned by a release
///
/// 释放操作返回的凭据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseReceipt {
    pub(crate) kind: Kind,
    pub(crate) slot: usize,
    pub(crate) ticket: Ticket,
    pub(crate) unblocked_readers: u32,
    pub(crate) unblocked_writers: u32,
    pub(crate) woken: u32,
}

impl ReleaseReceipt {
    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Readers whose `blocked_by` was decremented
    ///
    /// `blocked_by` 被递减的读者数量
    #[inline]
    pub fn unblocked_readers(&self) -> u32 {
        self.unblocked_readers
    }

    /// Writers whose `blocked_by` was decremented
    ///
    /// `blocked_by` 被递减的写者数量
    #[inline]
    pub fn unblocked_writers(&self) -> u32 {
        self.unblocked_writers
    }

    /// Participants whose count reached zero and whose signal was raised
    ///
    /// 计数归零并被唤醒的参与者数量
    #[inline]
    pub fn woken(&self) -> u32 {
        self.woken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_symmetric_and_inclusive() {
        let a = RecordRange::new(5, 15).unwrap();
        let b = RecordRange::new(15, 20).unwrap();
        let c = RecordRange::new(16, 20).unwrap();

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn test_conflict_rule() {
        let span = RecordRange::new(0, 10).unwrap();
        let inside = RecordRange::point(10);
        let outside = RecordRange::point(11);

        // 读者与读者不冲突
        assert!(!conflicts(Kind::Reader, &span, Kind::Reader, &span));
        // 写者点落在读者区间内
        assert!(conflicts(Kind::Writer, &inside, Kind::Reader, &span));
        assert!(conflicts(Kind::Reader, &span, Kind::Writer, &inside));
        assert!(!conflicts(Kind::Writer, &outside, Kind::Reader, &span));
        // 写者与写者同点
        assert!(conflicts(Kind::Writer, &inside, Kind::Writer, &inside));
        assert!(!conflicts(Kind::Writer, &inside, Kind::Writer, &outside));
    }

    #[test]
    fn test_invalid_range() {
        match RecordRange::new(7, 6) {
            Err(Error::InvalidRange { start, end }) => {
                assert_eq!((start, end), (7, 6));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_len_of_full_domain() {
        assert_eq!(RecordRange::point(9).len(), 1);
        assert_eq!(RecordRange::new(5, 15).unwrap().len(), 11);

        // 完整值域无法用 u64 计数，饱和为 u64::MAX
        let full = RecordRange::new(0, u64::MAX).unwrap();
        assert_eq!(full.len(), u64::MAX);
        assert_eq!(RecordRange::new(1, u64::MAX).unwrap().len(), u64::MAX);
        assert!(full.contains(u64::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(RecordRange::point(3).to_string(), "(3)");
        assert_eq!(RecordRange::new(1, 4).unwrap().to_string(), "(1,4)");
        assert_eq!(Kind::Writer.to_string(), "Writer");
    }
}
