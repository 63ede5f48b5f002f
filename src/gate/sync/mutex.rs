//! Futex-based mutex usable across processes
//!
//! 可跨进程使用的基于 futex 的互斥锁

use super::futex;
use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU32, Ordering};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
const CONTENDED: u32 = 2;

/// Mutex whose lock word and protected data both live in shared memory
///
/// 锁字和受保护数据都位于共享内存中的互斥锁
///
/// Three-state futex lock: `0` unlocked, `1` locked, `2` locked with possible
/// waiters. Unlock only issues a wake syscall in the contended state.
///
/// 三态 futex 锁：`0` 未加锁，`1` 已加锁，`2` 已加锁且可能有等待者。
/// 只有在竞争状态下解锁才会发起唤醒系统调用。
///
/// `T` must be plain data (no pointers, no heap ownership) because other processes
/// see the same bytes at a different address.
///
/// `T` 必须是纯数据（不含指针或堆所有权），因为其他进程会在不同地址看到同样的字节。
#[repr(C)]
pub(crate) struct ShmMutex<T> {
    state: AtomicU32,
    data: UnsafeCell<T>,
}

// Safety: access to `data` is serialized by `state`
// Safety: 对 `data` 的访问由 `state` 串行化
unsafe impl<T: Send> Send for ShmMutex<T> {}
unsafe impl<T: Send> Sync for ShmMutex<T> {}

impl<T> ShmMutex<T> {
    #[cfg(test)]
    pub(crate) fn new(data: T) -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
            data: UnsafeCell::new(data),
        }
    }

    /// Acquire the lock, blocking the calling thread or process
    ///
    /// 获取锁，必要时阻塞调用的线程或进程
    pub(crate) fn lock(&self) -> ShmMutexGuard<'_, T> {
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.lock_contended();
        }
        ShmMutexGuard { mutex: self }
    }

    #[cold]
    fn lock_contended(&self) {
        // Once we have had to wait, keep the word at CONTENDED so our own unlock
        // wakes whoever queued up behind us.
        // 一旦发生过等待，就保持 CONTENDED，使我们自己的解锁能唤醒排在后面的等待者。
        while self.state.swap(CONTENDED, Ordering::Acquire) != UNLOCKED {
            futex::wait(&self.state, CONTENDED);
        }
    }

    #[inline]
    fn unlock(&self) {
        if self.state.swap(UNLOCKED, Ordering::Release) == CONTENDED {
            futex::wake(&self.state, 1);
        }
    }
}

/// RAII guard for [`ShmMutex`]
///
/// [`ShmMutex`] 的 RAII 守卫
pub(crate) struct ShmMutexGuard<'a, T> {
    mutex: &'a ShmMutex<T>,
}

impl<T> Deref for ShmMutexGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // Safety: the guard proves the lock is held
        // Safety: 守卫证明锁已被持有
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for ShmMutexGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the guard proves the lock is held exclusively
        // Safety: 守卫证明锁被独占持有
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for ShmMutexGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_mutex_is_unlocked() {
        let mutex: ShmMutex<u64> = ShmMutex::new(0);
        assert_eq!(mutex.state.load(Ordering::Relaxed), UNLOCKED);
        {
            let mut guard = mutex.lock();
            *guard += 1;
            assert_ne!(mutex.state.load(Ordering::Relaxed), UNLOCKED);
        }
        assert_eq!(mutex.state.load(Ordering::Relaxed), UNLOCKED);
        assert_eq!(*mutex.lock(), 1);
    }

    #[test]
    fn test_mutual_exclusion_under_contention() {
        // 非原子的读-改-写，只有互斥才能保证结果正确
        let mutex = ShmMutex::new(0u64);
        const THREADS: u64 = 8;
        const ROUNDS: u64 = 10_000;

        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..ROUNDS {
                        let mut guard = mutex.lock();
                        let value = *guard;
                        std::hint::black_box(&value);
                        *guard = value + 1;
                    }
                });
            }
        });

        assert_eq!(*mutex.lock(), THREADS * ROUNDS);
        assert_eq!(mutex.state.load(Ordering::Relaxed), UNLOCKED);
    }
}
