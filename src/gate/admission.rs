//! Admission controller
//!
//! 准入控制器

use super::error::{Error, Result};
use super::handle::Gate;
use super::layout::{Entry, SLOT_CAPACITY, Tables};
use super::range::{Admission, Kind, Request, conflicts};
use std::time::Instant;
use tracing::{debug, info};

impl Gate {
    /// Admit a participant, blocking until every earlier conflicting participant
    /// has released
    ///
    /// 准入一个参与者，阻塞直到所有更早到达的冲突参与者都已释放
    ///
    /// Takes an admission token, registers the request in its table with the next
    /// ticket and the number of conflicting participants already present, then
    /// waits on the slot's signal if that number is non-zero. Readers never wait
    /// for readers. Arrival order is strict: a reader that arrives after a waiting
    /// writer on the same record waits for that writer too.
    ///
    /// 获取准入令牌，以下一个票据和当前已存在的冲突参与者数量在表中登记请求，
    /// 若该数量非零则等待槽位信号。读者从不等待读者。到达顺序是严格的：
    /// 在同一记录上晚于等待中写者到达的读者也会等待该写者。
    ///
    /// # Returns
    /// An [`Admission`] that must be passed to [`Gate::release`]
    ///
    /// # 返回值
    /// 必须交给 [`Gate::release`] 的 [`Admission`]
    ///
    /// # Errors
    /// Returns `TableExhausted` if the request's table has no empty slot. This only
    /// happens when the block was created with more admission tokens than slots in
    /// use by a misbehaving participant; the token is returned and nothing is
    /// registered, but the caller should treat it as fatal.
    ///
    /// # Errors
    /// 如果请求对应的表没有空槽位，返回 `TableExhausted`。令牌会被归还且不会登记任何内容，
    /// 但调用者应将其视为致命错误。
    pub fn admit(&self, request: Request) -> Result<Admission> {
        let started = Instant::now();
        let block = self.block();
        let kind = request.kind();
        let range = request.range();

        block.admission.acquire();

        let (slot, ticket, blocked_by) = {
            let mut tables = block.tables.lock();

            let blocked_by = self.count_blockers(&tables, &request);

            let Some(slot) = tables.first_empty(kind) else {
                drop(tables);
                block.admission.release();
                return Err(Error::TableExhausted {
                    kind,
                    capacity: SLOT_CAPACITY,
                });
            };

            let ticket = tables.tickets.issue();
            block.signal(kind, slot).reset();
            tables.table_mut(kind)[slot] = Entry::occupied(range, ticket, blocked_by, self.owner());
            *tables.active_mut(kind) += 1;
            assert!(
                tables.active(kind) as usize <= SLOT_CAPACITY,
                "{} counter exceeds table capacity",
                kind
            );

            if self.verbosity().basic() {
                info!(
                    owner = self.owner(),
                    %kind,
                    %range,
                    slot,
                    %ticket,
                    blocked_by,
                    "entered at slot {} and is blocked by {} participant(s)",
                    slot,
                    blocked_by
                );
            }

            (slot, ticket, blocked_by)
        };

        if blocked_by > 0 {
            block.signal(kind, slot).wait();
        }

        let waited = started.elapsed();

        if self.verbosity().basic() {
            info!(owner = self.owner(), %kind, %range, %ticket, ?waited, "passed the wait");
        }
        if self.verbosity().detailed() {
            self.log_active("after admission");
        }

        Ok(Admission {
            block_id: block.block_id(),
            kind,
            slot,
            ticket,
            range,
            blocked_by,
            waited,
        })
    }

    /// Count occupied entries that conflict with `request`
    ///
    /// 统计与 `request` 冲突的已占用条目
    ///
    /// A reader scans the writer table; a writer scans both tables.
    ///
    /// 读者扫描写者表；写者扫描两张表。
    fn count_blockers(&self, tables: &Tables, request: &Request) -> u32 {
        let mut blocked_by = 0;
        for other in Kind::ALL {
            if !request.kind().conflicts_with(other) {
                continue;
            }
            for (slot, entry) in tables.occupied(other) {
                if !conflicts(request.kind(), &request.range(), other, &entry.range()) {
                    continue;
                }
                blocked_by += 1;
                if self.verbosity().detailed() {
                    debug!(
                        owner = self.owner(),
                        kind = %request.kind(),
                        range = %request.range(),
                        blocker = entry.owner,
                        blocker_kind = %other,
                        blocker_slot = slot,
                        blocker_ticket = %entry.ticket(),
                        "is being blocked by [{}]{}",
                        entry.owner,
                        other
                    );
                }
            }
        }
        blocked_by
    }

    /// Emit the running readers and writers
    ///
    /// 输出正在运行的读者和写者
    pub(crate) fn log_active(&self, when: &'static str) {
        let occupancy = self.occupancy();
        let running = |views: &[super::stats::SlotView]| -> Vec<u32> {
            views.iter().filter(|v| v.is_running()).map(|v| v.owner).collect()
        };
        debug!(
            owner = self.owner(),
            active_readers = ?running(&occupancy.readers),
            active_writers = ?running(&occupancy.writers),
            "{}",
            when
        );
    }
}
