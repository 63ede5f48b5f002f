//! 多进程测试：fork 出的子进程通过同一个文件挂载控制块
#![cfg(unix)]

use memmap2::{MmapMut, MmapOptions};
use ranged_gate::{Gate, GateOptions, Kind, RecordRange, Request, Session};
use std::fs::OpenOptions;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use tempfile::tempdir;

const CHILDREN: u32 = 4;
const ROUNDS: u64 = 100;
const RECORDS: usize = 8;

/// 跨进程共享的记录占用表：正数为读者数量，-1 为写者，最后一格计数违规
struct SharedCells {
    _mmap: MmapMut,
    cells: *const AtomicI32,
}

impl SharedCells {
    fn create(path: &Path) -> Self {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .unwrap();
        let len = (RECORDS + 1) * std::mem::size_of::<AtomicI32>();
        file.set_len(len as u64).unwrap();
        let mut mmap = unsafe { MmapOptions::new().len(len).map_mut(&file).unwrap() };
        let cells = mmap.as_mut_ptr().cast::<AtomicI32>().cast_const();
        Self { _mmap: mmap, cells }
    }

    fn cell(&self, index: usize) -> &AtomicI32 {
        assert!(index <= RECORDS);
        unsafe { &*self.cells.add(index) }
    }

    fn violations(&self) -> i32 {
        self.cell(RECORDS).load(Ordering::SeqCst)
    }

    fn enter(&self, request: &Request) {
        let range = request.range();
        for record in range.start()..=range.end() {
            let cell = self.cell(record as usize);
            let ok = match request.kind() {
                Kind::Reader => cell.fetch_add(1, Ordering::SeqCst) >= 0,
                Kind::Writer => cell.compare_exchange(0, -1, Ordering::SeqCst, Ordering::SeqCst).is_ok(),
            };
            if !ok {
                self.cell(RECORDS).fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn leave(&self, request: &Request) {
        let range = request.range();
        for record in range.start()..=range.end() {
            let cell = self.cell(record as usize);
            match request.kind() {
                Kind::Reader => {
                    cell.fetch_sub(1, Ordering::SeqCst);
                }
                Kind::Writer => {
                    cell.store(0, Ordering::SeqCst);
                }
            }
        }
    }
}

/// 子进程主体：交替以写者和读者身份争用同一段记录
fn run_child(path: &Path, cells: &SharedCells, id: u32) {
    let gate = Gate::open(path).unwrap().with_owner(id);

    for round in 0..ROUNDS {
        let point = (round + id as u64) % RECORDS as u64;
        let request = if round % 2 == 0 {
            Request::write(point)
        } else {
            let end = (point + 2).min(RECORDS as u64 - 1);
            Request::read(RecordRange::new(point, end).unwrap())
        };

        let admission = gate.admit(request).unwrap();
        cells.enter(&request);
        std::thread::sleep(Duration::from_micros(50));
        cells.leave(&request);
        gate.complete(admission, 1);
    }
}

#[test]
fn test_forked_participants_share_one_block() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("multi.gate");
    let cells = SharedCells::create(&dir.path().join("cells.bin"));

    let session = Session::create(&path, GateOptions::new()).unwrap();
    let gate = session.gate();

    let mut children = Vec::new();
    for id in 0..CHILDREN {
        let child = unsafe { libc::fork() };
        if child == 0 {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| run_child(&path, &cells, id + 1)));
            let code = if result.is_ok() { 0 } else { 2 };
            unsafe { libc::_exit(code) };
        }
        assert!(child > 0, "fork failed");
        children.push(child);
    }

    for child in children {
        let mut status: libc::c_int = 0;
        unsafe { libc::waitpid(child, &mut status, 0) };
        assert!(
            libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0,
            "participant {} failed (exit status: {})",
            child,
            libc::WEXITSTATUS(status)
        );
    }

    assert_eq!(cells.violations(), 0);

    let stats = gate.stats_snapshot();
    let total = CHILDREN as u64 * ROUNDS;
    assert_eq!(stats.total_readers + stats.total_writers, total);
    assert_eq!(stats.total_writers, total / 2);
    assert_eq!(stats.processed_count, total);

    let occupancy = gate.occupancy();
    assert!(occupancy.is_empty());
    assert!(occupancy.is_consistent());
    assert_eq!(occupancy.next_ticket, total);
    assert_eq!(gate.available_tokens(), gate.max_admitted());

    drop(session);
    assert!(!path.exists());
}
