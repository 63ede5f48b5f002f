use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ranged_gate::{Gate, GateOptions, RecordRange, Request, Session};
use std::hint::black_box;
use tempfile::tempdir;

/// 测试参数
const ROUNDS_PER_WORKER: u64 = 1_000;
const RECORDS: u64 = 64;
const WORKER_COUNTS: [u64; 3] = [2, 4, 8];

/// 按工作者编号和轮次生成请求，每 4 次中有 1 次写
fn request_for(worker: u64, round: u64) -> Request {
    let point = (worker * 7 + round * 13) % RECORDS;
    if round % 4 == 0 {
        Request::write(point)
    } else {
        let end = (point + 3).min(RECORDS - 1);
        Request::read(RecordRange::new(point, end).unwrap())
    }
}

/// 多个线程在同一控制块上争用
fn run_threads(gate: &Gate, workers: u64) {
    std::thread::scope(|s| {
        for worker in 0..workers {
            s.spawn(move || {
                for round in 0..ROUNDS_PER_WORKER {
                    let admission = gate.admit(request_for(worker, round)).unwrap();
                    gate.complete(admission, 1);
                }
            });
        }
    });
}

/// 使用 tokio 的 spawn_blocking 运行参与者
async fn run_tasks(gate: &Gate, workers: u64) {
    let mut handles = Vec::new();
    for worker in 0..workers {
        let gate = gate.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            for round in 0..ROUNDS_PER_WORKER {
                let admission = gate.admit(request_for(worker, round)).unwrap();
                gate.complete(admission, 1);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

fn uncontended_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended");

    let anonymous = Gate::anonymous(GateOptions::new()).unwrap();
    group.bench_function("anonymous_write", |b| {
        b.iter(|| {
            let admission = anonymous.admit(black_box(Request::write(1))).unwrap();
            black_box(anonymous.release(admission));
        });
    });

    let range = RecordRange::new(0, 1_000).unwrap();
    group.bench_function("anonymous_read", |b| {
        b.iter(|| {
            let admission = anonymous.admit(black_box(Request::read(range))).unwrap();
            black_box(anonymous.release(admission));
        });
    });

    // 基于文件的控制块
    let dir = tempdir().unwrap();
    let session = Session::create(dir.path().join("bench.gate"), GateOptions::new()).unwrap();
    let shared = session.gate();
    group.bench_function("file_backed_write_with_stats", |b| {
        b.iter(|| {
            let admission = shared.admit(black_box(Request::write(1))).unwrap();
            black_box(shared.complete(admission, 1));
        });
    });

    group.finish();
}

fn contended_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");

    // 设置较少的样本数
    group.sample_size(10);

    let runtime = tokio::runtime::Runtime::new().unwrap();

    for workers in WORKER_COUNTS {
        let parameter = format!("{}workers_{}rounds", workers, ROUNDS_PER_WORKER);

        group.bench_with_input(BenchmarkId::new("threads", &parameter), &workers, |b, &workers| {
            let gate = Gate::anonymous(GateOptions::new()).unwrap();
            b.iter(|| run_threads(&gate, workers));
        });

        group.bench_with_input(BenchmarkId::new("tokio_blocking", &parameter), &workers, |b, &workers| {
            let gate = Gate::anonymous(GateOptions::new()).unwrap();
            let gate = &gate;
            b.to_async(&runtime).iter(move || run_tasks(gate, workers));
        });
    }

    group.finish();
}

criterion_group!(benches, uncontended_benchmark, contended_benchmark);
criterion_main!(benches);
