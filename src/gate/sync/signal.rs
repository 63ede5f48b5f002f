//! Per-slot binary wait signal
//!
//! 每个槽位的二值等待信号

use super::futex;
use std::sync::atomic::{AtomicU32, Ordering};

const CLEAR: u32 = 0;
const RAISED: u32 = 1;

/// One-shot wake-up for the occupant of a slot
///
/// 槽位占用者的一次性唤醒信号
///
/// During one occupancy the slot's owner is the only waiter and exactly one
/// releasing participant is the only poster. The admission and release protocol
/// guarantees that; the signal only checks that it is never raised twice.
///
/// 在一次占用期间，槽位所有者是唯一的等待者，恰好一个释放者是唯一的发出者。
/// 这一点由准入与释放协议保证；信号本身只检查不会被重复触发。
#[repr(C)]
pub(crate) struct WaitSignal {
    state: AtomicU32,
}

impl WaitSignal {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self { state: AtomicU32::new(CLEAR) }
    }

    /// Return to "not signaled" for a new occupancy
    ///
    /// 为新的占用恢复为"未触发"
    #[inline]
    pub(crate) fn reset(&self) {
        self.state.store(CLEAR, Ordering::Release);
    }

    /// Raise the signal and wake its waiter
    ///
    /// 触发信号并唤醒等待者
    ///
    /// # Panics
    /// If the signal is already raised
    ///
    /// # Panics
    /// 如果信号已被触发
    #[inline]
    pub(crate) fn post(&self) {
        let previous = self.state.swap(RAISED, Ordering::Release);
        assert_eq!(previous, CLEAR, "wait signal posted twice");
        futex::wake(&self.state, 1);
    }

    /// Block until raised, then consume the signal
    ///
    /// 阻塞直到被触发，然后消费该信号
    pub(crate) fn wait(&self) {
        while self
            .state
            .compare_exchange(RAISED, CLEAR, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            futex::wait(&self.state, CLEAR);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_raised(&self) -> bool {
        self.state.load(Ordering::Acquire) == RAISED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_post_before_wait_is_not_lost() {
        let signal = WaitSignal::new();
        signal.post();
        assert!(signal.is_raised());
        signal.wait();
        assert!(!signal.is_raised());
    }

    #[test]
    fn test_wait_blocks_until_post() {
        let signal = WaitSignal::new();
        std::thread::scope(|s| {
            let waiter = s.spawn(|| signal.wait());
            std::thread::sleep(Duration::from_millis(20));
            assert!(!waiter.is_finished());
            signal.post();
            waiter.join().unwrap();
        });
    }

    #[test]
    #[should_panic(expected = "wait signal posted twice")]
    fn test_double_post_panics() {
        let signal = WaitSignal::new();
        signal.post();
        signal.post();
    }

    #[test]
    fn test_reset_clears_stale_signal() {
        let signal = WaitSignal::new();
        signal.post();
        signal.reset();
        assert!(!signal.is_raised());
        signal.post();
        signal.wait();
    }
}
