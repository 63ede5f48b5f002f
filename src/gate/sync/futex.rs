//! Futex wait/wake on a shared 32-bit word
//!
//! 基于共享 32 位字的 futex 等待/唤醒

use std::sync::atomic::AtomicU32;

/// Block while `word` still holds `expected`
///
/// 当 `word` 仍等于 `expected` 时阻塞
///
/// May return spuriously; callers re-check their condition in a loop.
///
/// 可能会虚假返回；调用者需要在循环中重新检查条件。
#[cfg(target_os = "linux")]
#[inline]
pub(crate) fn wait(word: &AtomicU32, expected: u32) {
    // Safety: `word` is a valid, aligned u32 for the duration of the call. EINTR and
    // EAGAIN both mean "re-check", so the return value is ignored.
    // Safety: 调用期间 `word` 是有效且对齐的 u32。EINTR 与 EAGAIN 都意味着"重新检查"，因此忽略返回值。
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAIT,
            expected,
            std::ptr::null::<libc::timespec>(),
        );
    }
}

/// Wake up to `count` waiters blocked on `word`
///
/// 唤醒最多 `count` 个阻塞在 `word` 上的等待者
#[cfg(target_os = "linux")]
#[inline]
pub(crate) fn wake(word: &AtomicU32, count: i32) {
    // Safety: same as `wait`; waking a word nobody waits on is a no-op
    // Safety: 同 `wait`；唤醒没有等待者的字不会产生任何效果
    unsafe {
        libc::syscall(libc::SYS_futex, word.as_ptr(), libc::FUTEX_WAKE, count);
    }
}

#[cfg(not(target_os = "linux"))]
const SPIN_LIMIT: u32 = 128;

#[cfg(not(target_os = "linux"))]
const PARK_INTERVAL: std::time::Duration = std::time::Duration::from_micros(200);

/// Polling stand-in for the futex wait: spin, then sleep one interval
///
/// futex 等待的轮询替代：先自旋，再休眠一个间隔
#[cfg(not(target_os = "linux"))]
#[inline]
pub(crate) fn wait(word: &AtomicU32, expected: u32) {
    use std::sync::atomic::Ordering;

    for _ in 0..SPIN_LIMIT {
        if word.load(Ordering::Acquire) != expected {
            return;
        }
        std::hint::spin_loop();
    }
    if word.load(Ordering::Acquire) == expected {
        std::thread::sleep(PARK_INTERVAL);
    }
}

#[cfg(not(target_os = "linux"))]
#[inline]
pub(crate) fn wake(_word: &AtomicU32, _count: i32) {}
