//! Global arrival-order tickets
//!
//! 全局到达顺序票据

use std::fmt;

/// Arrival order of an admitted participant
///
/// 已准入参与者的到达顺序
///
/// Tickets are issued across both tables from a single counter, so any two
/// participants are totally ordered by arrival.
///
/// 票据由同一个计数器为两张表统一发放，因此任意两个参与者都按到达顺序全序排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticket(u64);

impl Ticket {
    #[inline]
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sequential ticket allocator
///
/// 顺序票据分配器
///
/// Lives inside the mutex-guarded participant tables of the control block, so
/// `&mut self` access already implies the table lock is held. Tickets start
/// at 0 and are never reused.
///
/// 位于控制块中受互斥锁保护的参与者表内，因此获得 `&mut self` 即意味着已持有表锁。
/// 票据从 0 开始，永不复用。
#[repr(C)]
#[derive(Debug)]
pub(crate) struct TicketAllocator {
    /// Next ticket to hand out
    ///
    /// 下一个要发放的票据
    next: u64,
}

impl TicketAllocator {
    /// Issue the next ticket
    ///
    /// 发放下一个票据
    #[inline]
    pub(crate) fn issue(&mut self) -> Ticket {
        let ticket = Ticket(self.next);
        self.next = self
            .next
            .checked_add(1)
            .expect("ticket counter overflowed u64");
        ticket
    }

    /// The ticket the next admission will receive
    ///
    /// 下一次准入将获得的票据
    #[inline]
    pub(crate) fn peek(&self) -> Ticket {
        Ticket(self.next)
    }
}
