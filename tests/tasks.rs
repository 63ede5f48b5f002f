//! 异步任务中的参与者：阻塞的准入放在 spawn_blocking 中执行

use ranged_gate::{Gate, GateOptions, RecordRange, Request, Result, Session};
use std::num::NonZeroU32;
use tempfile::tempdir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spawn_blocking_participants() {
    let options = GateOptions::new().max_admitted(NonZeroU32::new(4).unwrap());
    let gate = Gate::anonymous(options).unwrap();

    let mut handles = Vec::new();
    for i in 0..32u64 {
        let gate = gate.clone();
        handles.push(tokio::task::spawn_blocking(move || -> Result<u64> {
            let request = if i % 4 == 0 {
                Request::write(i % 8)
            } else {
                Request::read(RecordRange::new(i % 8, i % 8 + 3)?)
            };
            let admission = gate.admit(request)?;
            std::thread::sleep(std::time::Duration::from_millis(1));
            let records = request.range().len();
            gate.complete(admission, records);
            Ok(records)
        }));
    }

    let mut processed = 0;
    for handle in handles {
        processed += handle.await.unwrap().unwrap();
    }

    let stats = gate.stats_snapshot();
    assert_eq!(stats.total_writers, 8);
    assert_eq!(stats.total_readers, 24);
    assert_eq!(stats.processed_count, processed);
    assert!(gate.occupancy().is_empty());
    assert_eq!(gate.available_tokens(), 4);
}

#[tokio::test]
async fn test_session_shared_with_tasks() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.gate");
    let session = Session::create(&path, GateOptions::new()).unwrap();

    // 任务通过路径独立挂载
    let writer_path = path.clone();
    let writer = tokio::task::spawn_blocking(move || {
        let gate = Gate::open(&writer_path).unwrap();
        for point in 0..10 {
            let admission = gate.admit(Request::write(point)).unwrap();
            gate.complete(admission, 1);
        }
    });

    let reader_path = path.clone();
    let reader = tokio::task::spawn_blocking(move || {
        let gate = Gate::open(&reader_path).unwrap();
        for start in 0..10 {
            let admission = gate
                .admit(Request::read(RecordRange::new(start, start + 1).unwrap()))
                .unwrap();
            gate.complete(admission, 2);
        }
    });

    writer.await.unwrap();
    reader.await.unwrap();

    let stats = session.gate().stats_snapshot();
    assert_eq!(stats.total_writers, 10);
    assert_eq!(stats.total_readers, 10);
    assert_eq!(stats.processed_count, 30);
}
