//! Release controller
//!
//! 释放控制器

use super::handle::Gate;
use super::range::{Admission, Kind, ReleaseReceipt, conflicts};
use tracing::{debug, info};

impl Gate {
    /// Release an admission and wake the participants it was blocking
    ///
    /// 释放一次准入并唤醒被它阻塞的参与者
    ///
    /// Empties the slot, then walks both tables for conflicting entries with a
    /// later ticket. Exactly those entries counted this participant when they were
    /// admitted, so each gets its `blocked_by` decremented once; an entry whose
    /// count reaches zero has its wait signal raised. Finally the admission token
    /// is returned. Never blocks on anything but the table mutex.
    ///
    /// 清空槽位，然后遍历两张表，找出票据更晚且冲突的条目。恰好是这些条目在准入时
    /// 计入了当前参与者，因此每个条目的 `blocked_by` 递减一次；计数归零的条目会被触发
    /// 等待信号。最后归还准入令牌。除表互斥锁外不会阻塞。
    ///
    /// # Panics
    /// - If the admission was issued by a different control block
    /// - If the slot no longer holds this admission's ticket
    /// - If a `blocked_by` counter would go below zero
    /// - If a wait signal would be raised twice
    ///
    /// # Panics
    /// - 如果准入来自另一个控制块
    /// - 如果槽位不再持有此次准入的票据
    /// - 如果某个 `blocked_by` 计数将变为负数
    /// - 如果某个等待信号将被重复触发
    pub fn release(&self, admission: Admission) -> ReleaseReceipt {
        let block = self.block();
        assert_eq!(
            admission.block_id,
            block.block_id(),
            "admission was issued by a different control block"
        );
        let Admission { kind, slot, ticket, range, .. } = admission;

        let receipt = {
            let mut tables = block.tables.lock();

            let entry = tables.table(kind)[slot];
            assert!(
                entry.is_occupied() && entry.ticket() == ticket,
                "{} slot {} is not held by ticket {}",
                kind,
                slot,
                ticket
            );

            tables.table_mut(kind)[slot].clear();
            let active = tables.active_mut(kind);
            *active = active
                .checked_sub(1)
                .unwrap_or_else(|| panic!("{} counter underflow", kind));

            let mut unblocked = [0u32; 2];
            let mut woken = 0;

            for other in Kind::ALL {
                if !kind.conflicts_with(other) {
                    continue;
                }
                for (other_slot, waiting) in tables.table_mut(other).iter_mut().enumerate() {
                    if !waiting.is_occupied()
                        || waiting.ticket() <= ticket
                        || !conflicts(kind, &range, other, &waiting.range())
                    {
                        continue;
                    }

                    waiting.blocked_by = waiting.blocked_by.checked_sub(1).unwrap_or_else(|| {
                        panic!("{} slot {} blocked_by underflow", other, other_slot)
                    });
                    unblocked[other.index()] += 1;

                    if self.verbosity().detailed() {
                        debug!(
                            owner = self.owner(),
                            %kind,
                            %range,
                            waiter = waiting.owner,
                            waiter_kind = %other,
                            waiter_slot = other_slot,
                            remaining = waiting.blocked_by,
                            "was blocking [{}]{}",
                            waiting.owner,
                            other
                        );
                    }

                    if waiting.blocked_by == 0 {
                        block.signal(other, other_slot).post();
                        woken += 1;
                    }
                }
            }

            debug_assert_eq!(tables.active(kind), tables.count_occupied(kind));

            if self.verbosity().basic() {
                info!(
                    owner = self.owner(),
                    %kind,
                    %range,
                    %ticket,
                    unblocked_readers = unblocked[Kind::Reader.index()],
                    unblocked_writers = unblocked[Kind::Writer.index()],
                    woken,
                    "exited after unblocking {} reader(s) & {} writer(s)",
                    unblocked[Kind::Reader.index()],
                    unblocked[Kind::Writer.index()]
                );
            }

            ReleaseReceipt {
                kind,
                slot,
                ticket,
                unblocked_readers: unblocked[Kind::Reader.index()],
                unblocked_writers: unblocked[Kind::Writer.index()],
                woken,
            }
        };

        block.admission.release();

        if self.verbosity().detailed() {
            self.log_active("after release");
        }

        receipt
    }
}
