//! Control block layout shared by every attached participant
//!
//! 所有挂载的参与者共享的控制块布局
//!
//! ```text
//! ControlBlock (#[repr(C)], page-aligned at the start of the mapping)
//! ├── Header            magic / version / capacity / max_admitted / block size / block id
//! ├── admission         ShmSemaphore, initialized to max_admitted
//! ├── tables            ShmMutex<Tables>
//! │   ├── entries       [[Entry; SLOT_CAPACITY]; 2]   reader table, writer table
//! │   ├── active        [u32; 2]                      occupied slots per table
//! │   └── tickets       TicketAllocator
//! ├── signals           [[WaitSignal; SLOT_CAPACITY]; 2]
//! ├── kind_stats        [ShmMutex<KindTotals>; 2]     reader mutex first
//! └── global_stats      UnsafeCell<GlobalTotals>      guarded by both kind mutexes
//! ```
//!
//! A zero-filled mapping is a valid empty state for everything except the header
//! and the admission semaphore.
//!
//! 全零的映射对除头部和准入信号量以外的所有部分都是合法的空状态。

use super::range::{Kind, RecordRange};
use super::sync::{ShmMutex, ShmSemaphore, WaitSignal};
use super::ticket::{Ticket, TicketAllocator};
use std::cell::UnsafeCell;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Slots per participant table
///
/// 每张参与者表的槽位数
pub const SLOT_CAPACITY: usize = 128;

pub(crate) const MAGIC: u64 = u64::from_le_bytes(*b"RNGGATE1");
pub(crate) const LAYOUT_VERSION: u32 = 1;

const SLOT_EMPTY: u32 = 0;
const SLOT_OCCUPIED: u32 = 1;

#[repr(C)]
pub(crate) struct Header {
    /// Written last during initialization
    ///
    /// 初始化时最后写入
    magic: AtomicU64,
    version: u32,
    capacity: u32,
    max_admitted: u32,
    _reserved: u32,
    block_size: u64,
    /// Random identity chosen at creation, carried by every admission
    ///
    /// 创建时选定的随机标识，每次准入都会携带
    block_id: u64,
}

/// One participant slot
///
/// 一个参与者槽位
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct Entry {
    pub(crate) start: u64,
    pub(crate) end: u64,
    pub(crate) ticket: u64,
    state: u32,
    pub(crate) blocked_by: u32,
    pub(crate) owner: u32,
    _reserved: u32,
}

impl Entry {
    pub(crate) fn occupied(range: RecordRange, ticket: Ticket, blocked_by: u32, owner: u32) -> Self {
        Self {
            start: range.start(),
            end: range.end(),
            ticket: ticket.get(),
            state: SLOT_OCCUPIED,
            blocked_by,
            owner,
            _reserved: 0,
        }
    }

    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        self.state == SLOT_OCCUPIED
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.state = SLOT_EMPTY;
        self.blocked_by = 0;
    }

    #[inline]
    pub(crate) fn range(&self) -> RecordRange {
        RecordRange::from_bounds_unchecked(self.start, self.end)
    }

    #[inline]
    pub(crate) fn ticket(&self) -> Ticket {
        Ticket::new(self.ticket)
    }
}

/// Everything guarded by the table mutex
///
/// 受表互斥锁保护的全部数据
#[repr(C)]
pub(crate) struct Tables {
    entries: [[Entry; SLOT_CAPACITY]; 2],
    active: [u32; 2],
    pub(crate) tickets: TicketAllocator,
}

impl Tables {
    #[inline]
    pub(crate) fn table(&self, kind: Kind) -> &[Entry; SLOT_CAPACITY] {
        &self.entries[kind.index()]
    }

    #[inline]
    pub(crate) fn table_mut(&mut self, kind: Kind) -> &mut [Entry; SLOT_CAPACITY] {
        &mut self.entries[kind.index()]
    }

    /// Occupied-slot counter of one table
    ///
    /// 一张表的已占用槽位计数
    #[inline]
    pub(crate) fn active(&self, kind: Kind) -> u32 {
        self.active[kind.index()]
    }

    #[inline]
    pub(crate) fn active_mut(&mut self, kind: Kind) -> &mut u32 {
        &mut self.active[kind.index()]
    }

    /// First empty slot of a table
    ///
    /// 表中第一个空槽位
    #[inline]
    pub(crate) fn first_empty(&self, kind: Kind) -> Option<usize> {
        self.table(kind).iter().position(|entry| !entry.is_occupied())
    }

    /// Occupied slots of a table with their indices
    ///
    /// 表中已占用的槽位及其下标
    pub(crate) fn occupied(&self, kind: Kind) -> impl Iterator<Item = (usize, &Entry)> {
        self.table(kind)
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_occupied())
    }

    /// Recount occupied slots by scanning the table
    ///
    /// 通过扫描表重新统计已占用槽位
    pub(crate) fn count_occupied(&self, kind: Kind) -> u32 {
        self.occupied(kind).count() as u32
    }
}

/// Per-kind statistics accumulators
///
/// 按参与者类型区分的统计累加器
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct KindTotals {
    pub(crate) count: u64,
    pub(crate) cumulative_wait_micros: u64,
}

/// Cross-kind statistics, touched only while both kind mutexes are held
///
/// 跨类型统计，仅在同时持有两个类型互斥锁时访问
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct GlobalTotals {
    pub(crate) max_wait_micros: u64,
    pub(crate) processed: u64,
}

fn fresh_block_id() -> u64 {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u32(std::process::id());
    hasher.finish()
}

/// The shared control block
///
/// 共享控制块
#[repr(C)]
pub(crate) struct ControlBlock {
    header: Header,
    pub(crate) admission: ShmSemaphore,
    pub(crate) tables: ShmMutex<Tables>,
    signals: [[WaitSignal; SLOT_CAPACITY]; 2],
    pub(crate) kind_stats: [ShmMutex<KindTotals>; 2],
    pub(crate) global_stats: UnsafeCell<GlobalTotals>,
}

// Safety: `global_stats` is only accessed while both `kind_stats` mutexes are held;
// every other field is an atomic or a ShmMutex.
// Safety: `global_stats` 仅在同时持有两个 `kind_stats` 互斥锁时访问；其余字段均为原子量或 ShmMutex。
unsafe impl Sync for ControlBlock {}
unsafe impl Send for ControlBlock {}

impl ControlBlock {
    /// Byte size of the control block
    ///
    /// 控制块的字节大小
    pub(crate) const SIZE: usize = std::mem::size_of::<ControlBlock>();

    /// Initialize a freshly zeroed block in place
    ///
    /// 就地初始化一个刚清零的控制块
    ///
    /// # Safety
    ///
    /// `block` must point to `SIZE` zeroed, writable bytes that no other participant
    /// uses yet.
    ///
    /// # Safety
    ///
    /// `block` 必须指向 `SIZE` 字节已清零且可写的内存，并且尚无其他参与者使用。
    pub(crate) unsafe fn init_in_place(block: *mut ControlBlock, max_admitted: u32) {
        // Safety: zeroed memory is a valid ControlBlock (all-zero atomics, unlocked
        // mutexes, empty slots), so forming a reference is sound.
        // Safety: 清零的内存是合法的 ControlBlock（原子量为零、互斥锁未加锁、槽位为空），因此可以构造引用。
        let block = unsafe { &mut *block };
        block.header.version = LAYOUT_VERSION;
        block.header.capacity = SLOT_CAPACITY as u32;
        block.header.max_admitted = max_admitted;
        block.header.block_size = Self::SIZE as u64;
        block.header.block_id = fresh_block_id();
        block.admission.init(max_admitted);
        block.header.magic.store(MAGIC, Ordering::Release);
    }

    /// Validate the header of an existing block
    ///
    /// 校验已有控制块的头部
    pub(crate) fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.header.magic.load(Ordering::Acquire) != MAGIC {
            return Err("magic");
        }
        if self.header.version != LAYOUT_VERSION {
            return Err("version");
        }
        if self.header.capacity as usize != SLOT_CAPACITY {
            return Err("slot capacity");
        }
        if self.header.block_size != Self::SIZE as u64 {
            return Err("block size");
        }
        if self.header.max_admitted == 0 || self.header.max_admitted as usize > SLOT_CAPACITY {
            return Err("admission capacity");
        }
        Ok(())
    }

    /// Identity of this block, shared by every mapping of it
    ///
    /// 此控制块的标识，所有映射共享
    #[inline]
    pub(crate) fn block_id(&self) -> u64 {
        self.header.block_id
    }

    #[inline]
    pub(crate) fn max_admitted(&self) -> u32 {
        self.header.max_admitted
    }

    /// Wait signal of a slot
    ///
    /// 槽位的等待信号
    #[inline]
    pub(crate) fn signal(&self, kind: Kind, slot: usize) -> &WaitSignal {
        &self.signals[kind.index()][slot]
    }

    #[inline]
    pub(crate) fn kind_stats(&self, kind: Kind) -> &ShmMutex<KindTotals> {
        &self.kind_stats[kind.index()]
    }
}
