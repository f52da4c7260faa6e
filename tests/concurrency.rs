use bytering::{RingBuffer, SpscRingBuffer};
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

const BUDGET: usize = 256 * 1024;

#[test]
fn mpmc_accounting_balances_after_drain() {
    let ring = Arc::new(RingBuffer::new(1024).unwrap());
    let remaining = Arc::new(AtomicUsize::new(BUDGET));
    let writers_done = Arc::new(AtomicUsize::new(0));
    let writers = 4;
    let readers = 3;

    let mut writer_handles = Vec::new();
    for id in 0..writers {
        let ring = Arc::clone(&ring);
        let remaining = Arc::clone(&remaining);
        let writers_done = Arc::clone(&writers_done);
        writer_handles.push(thread::spawn(move || {
            let mut rng = rand::rng();
            let chunk = [id as u8; 300];
            let mut written = 0usize;

            loop {
                let want = rng.random_range(1..=chunk.len());
                let claimed = remaining
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| {
                        (left > 0).then(|| left - want.min(left))
                    })
                    .map(|left| want.min(left));
                let Ok(mut todo) = claimed else {
                    break;
                };

                while todo > 0 {
                    let n = ring.write(&chunk[..todo]);
                    if n == 0 {
                        thread::yield_now();
                    }
                    todo -= n;
                    written += n;
                }
            }

            writers_done.fetch_add(1, Ordering::Release);
            written
        }));
    }

    let mut reader_handles = Vec::new();
    for _ in 0..readers {
        let ring = Arc::clone(&ring);
        let writers_done = Arc::clone(&writers_done);
        reader_handles.push(thread::spawn(move || {
            let mut rng = rand::rng();
            let mut out = [0u8; 512];
            let mut read = 0usize;

            loop {
                let want = rng.random_range(1..=out.len());
                let n = ring.read(&mut out[..want]);
                read += n;

                if n == 0 {
                    if writers_done.load(Ordering::Acquire) == writers && ring.is_empty() {
                        break;
                    }
                    thread::yield_now();
                }
            }

            read
        }));
    }

    let written: usize = writer_handles.into_iter().map(|h| h.join().unwrap()).sum();
    let read: usize = reader_handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(written, BUDGET);
    assert_eq!(read, written);
    assert!(ring.is_empty());
    assert!(ring.check_consistency().is_ok());
}

#[test]
fn concurrent_queries_respect_bounds() {
    let ring = RingBuffer::new(64).unwrap();
    let stop = AtomicUsize::new(0);

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..20_000 {
                ring.write(b"0123456789");
            }
            stop.fetch_add(1, Ordering::Release);
        });

        scope.spawn(|| {
            let mut out = [0u8; 7];
            while stop.load(Ordering::Acquire) == 0 {
                ring.read(&mut out);
            }
        });

        scope.spawn(|| {
            while stop.load(Ordering::Acquire) == 0 {
                let filled = ring.bytes_filled();
                assert!(filled <= ring.capacity());
                assert!(!(ring.is_empty() && ring.is_full()));
            }
        });
    });

    assert!(ring.check_consistency().is_ok());
    assert_eq!(ring.bytes_available() + ring.bytes_filled(), ring.capacity());
}

#[test]
fn single_producer_single_consumer_preserves_order() {
    let ring = RingBuffer::new(97).unwrap();
    let total = 100_000usize;

    thread::scope(|scope| {
        scope.spawn(|| {
            let mut rng = rand::rng();
            let mut next = 0usize;
            while next < total {
                let len = rng.random_range(1..=40).min(total - next);
                let chunk: Vec<u8> = (next..next + len).map(|i| i as u8).collect();
                let n = ring.write(&chunk);
                next += n;
                if n == 0 {
                    thread::yield_now();
                }
            }
        });

        scope.spawn(|| {
            let mut rng = rand::rng();
            let mut out = [0u8; 64];
            let mut seen = 0usize;
            while seen < total {
                let want = rng.random_range(1..=out.len());
                let n = ring.read(&mut out[..want]);
                for &b in &out[..n] {
                    assert_eq!(b, seen as u8);
                    seen += 1;
                }
                if n == 0 {
                    thread::yield_now();
                }
            }
        });
    });

    assert!(ring.is_empty());
}

#[test]
fn lock_free_spsc_preserves_order() {
    let mut ring = SpscRingBuffer::new(128).unwrap();
    let (mut prod, mut cons) = ring.split();
    let total = 200_000usize;

    thread::scope(|scope| {
        scope.spawn(move || {
            let mut rng = rand::rng();
            let mut next = 0usize;
            while next < total {
                let len = rng.random_range(1..=50).min(total - next);
                let chunk: Vec<u8> = (next..next + len).map(|i| i as u8).collect();
                let n = prod.write(&chunk);
                next += n;
                if n == 0 {
                    thread::yield_now();
                }
            }
        });

        scope.spawn(move || {
            let mut out = [0u8; 96];
            let mut seen = 0usize;
            while seen < total {
                let n = cons.read(&mut out);
                for &b in &out[..n] {
                    assert_eq!(b, seen as u8);
                    seen += 1;
                }
                if n == 0 {
                    thread::yield_now();
                }
            }
        });
    });

    assert!(ring.is_empty());
}
