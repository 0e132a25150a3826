use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use warm_pool::{Pool, manager_fn};

fn new_pool(capacity: usize) -> Pool<impl warm_pool::Manager<Resource = Vec<u8>, Error = ()>> {
    let pool = Pool::new(manager_fn(|| Ok(vec![0u8; 1024]), |_| Ok(())), capacity).unwrap();
    pool.warm_up().unwrap();
    pool
}

fn acquire_release(c: &mut Criterion) {
    let pool = new_pool(16);
    c.bench_function("acquire_release", |b| {
        b.iter(|| {
            let buf = pool.acquire().unwrap();
            black_box(&buf);
            pool.release(buf).unwrap();
        })
    });

    c.bench_function("entry_guard", |b| {
        b.iter(|| {
            let entry = pool.get().unwrap();
            black_box(entry.len());
        })
    });
}

fn contended(c: &mut Criterion) {
    let pool = Arc::new(new_pool(2));
    c.bench_function("contended_4_threads", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let pool = pool.clone();
                    std::thread::spawn(move || {
                        for _ in 0..64 {
                            let buf = pool.acquire().unwrap();
                            black_box(&buf);
                            pool.release(buf).unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });
}

criterion_group!(benches, acquire_release, contended);
criterion_main!(benches);
