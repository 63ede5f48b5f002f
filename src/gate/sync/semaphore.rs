//! Counting semaphore usable across processes
//!
//! 可跨进程使用的计数信号量

use super::futex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Counting semaphore stored in shared memory
///
/// 存放在共享内存中的计数信号量
///
/// `waiters` counts processes that may be parked on `count`, so `release` can skip
/// the wake syscall when nobody waits.
///
/// `waiters` 记录可能阻塞在 `count` 上的进程数，使 `release` 在无人等待时跳过唤醒系统调用。
#[repr(C)]
pub(crate) struct ShmSemaphore {
    count: AtomicU32,
    waiters: AtomicU32,
}

impl ShmSemaphore {
    #[cfg(test)]
    pub(crate) fn new(permits: u32) -> Self {
        Self {
            count: AtomicU32::new(permits),
            waiters: AtomicU32::new(0),
        }
    }

    /// Set the number of permits; only valid before any participant attaches
    ///
    /// 设置许可数量；只能在任何参与者挂载之前调用
    pub(crate) fn init(&self, permits: u32) {
        self.count.store(permits, Ordering::Release);
        self.waiters.store(0, Ordering::Release);
    }

    /// Take one permit, blocking until one is available
    ///
    /// 获取一个许可，无可用许可时阻塞
    pub(crate) fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            self.waiters.fetch_add(1, Ordering::SeqCst);
            futex::wait(&self.count, 0);
            self.waiters.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Take one permit without blocking
    ///
    /// 非阻塞地获取一个许可
    pub(crate) fn try_acquire(&self) -> bool {
        let mut current = self.count.load(Ordering::Relaxed);
        while current > 0 {
            match self.count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    /// Return one permit
    ///
    /// 归还一个许可
    pub(crate) fn release(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) > 0 {
            futex::wake(&self.count, 1);
        }
    }

    /// Currently available permits (diagnostic only)
    ///
    /// 当前可用许可数（仅用于诊断）
    pub(crate) fn available(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_try_acquire_exhausts_permits() {
        let sem = ShmSemaphore::new(2);
        assert!(sem.try_acquire());
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
        sem.release();
        assert_eq!(sem.available(), 1);
        assert!(sem.try_acquire());
    }

    #[test]
    fn test_bounds_concurrency() {
        const PERMITS: u32 = 3;
        let sem = ShmSemaphore::new(PERMITS);
        let inside = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..12 {
                s.spawn(|| {
                    for _ in 0..20 {
                        sem.acquire();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_micros(50));
                        inside.fetch_sub(1, Ordering::SeqCst);
                        sem.release();
                    }
                });
            }
        });

        assert!(peak.load(Ordering::SeqCst) <= PERMITS as usize);
        assert_eq!(sem.available(), PERMITS);
    }

    #[test]
    fn test_blocked_acquire_is_woken_by_release() {
        let sem = ShmSemaphore::new(0);
        std::thread::scope(|s| {
            let waiter = s.spawn(|| sem.acquire());
            std::thread::sleep(Duration::from_millis(20));
            assert!(!waiter.is_finished());
            sem.release();
            waiter.join().unwrap();
        });
        assert_eq!(sem.available(), 0);
    }
}
