//! Process-shared synchronization primitives
//!
//! 跨进程共享的同步原语
//!
//! Every primitive here is a plain `#[repr(C)]` struct of `AtomicU32` words, so it
//! can live inside a `MAP_SHARED` mapping and be used by every process that maps
//! the same region. The all-zero bit pattern is a valid initial state for each of
//! them (unlocked mutex, empty semaphore, unsignaled wait signal).
//!
//! 这里的每个原语都是由 `AtomicU32` 字组成的 `#[repr(C)]` 结构体，因此可以放在
//! `MAP_SHARED` 映射中，被所有映射同一区域的进程使用。全零位模式对它们都是合法的
//! 初始状态（未加锁的互斥锁、计数为零的信号量、未触发的等待信号）。
//!
//! Blocking uses the futex word directly:
//! - Linux: `futex(2)` without `FUTEX_PRIVATE_FLAG`, so waits and wakes work across
//!   processes that map the same file
//! - Other platforms: bounded spinning followed by a short sleep
//!
//! 阻塞直接基于 futex 字：
//! - Linux：不带 `FUTEX_PRIVATE_FLAG` 的 `futex(2)`，使等待和唤醒可以跨越映射同一文件的进程
//! - 其他平台：有限次自旋后短暂休眠

mod futex;
mod mutex;
mod semaphore;
mod signal;

pub(crate) use mutex::{ShmMutex, ShmMutexGuard};
pub(crate) use semaphore::ShmSemaphore;
pub(crate) use signal::WaitSignal;
