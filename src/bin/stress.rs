use bytering::{ArenaKind, RingBuffer};
use clap::{Parser, ValueEnum};
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Arena {
    Heap,
    Anonymous,
}

impl From<Arena> for ArenaKind {
    fn from(arena: Arena) -> Self {
        match arena {
            Arena::Heap => ArenaKind::Heap,
            Arena::Anonymous => ArenaKind::Anonymous,
        }
    }
}

/// Raises the abort flag if the owning worker unwinds.
struct AbortOnPanic<'a>(&'a AtomicBool);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(true, Ordering::SeqCst);
        }
    }
}

/// Hammer one shared ring with concurrent writers and readers and check that
/// every byte written is read back.
#[derive(Debug, Parser)]
#[command(name = "stress", version)]
struct Args {
    /// Ring capacity in bytes (1..=65535)
    #[arg(long, default_value_t = 4096)]
    capacity: usize,

    /// Number of writer threads
    #[arg(long, default_value_t = 4)]
    writers: usize,

    /// Number of reader threads
    #[arg(long, default_value_t = 4)]
    readers: usize,

    /// Total bytes to push through the ring
    #[arg(long, default_value_t = 256 * 1024 * 1024)]
    budget: usize,

    /// Largest single transfer request in bytes
    #[arg(long, default_value_t = 2048)]
    max_chunk: usize,

    #[arg(long, value_enum, default_value_t = Arena::Heap)]
    arena: Arena,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.writers == 0 || args.readers == 0 || args.max_chunk == 0 {
        return Err("writers, readers and max-chunk must be greater than zero".into());
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| format!("Failed to set Ctrl+C handler: {}", e))?;

    let ring = RingBuffer::with_arena(args.capacity, args.arena.into())?;
    let remaining = AtomicUsize::new(args.budget);
    let writers_done = AtomicUsize::new(0);
    // Set when a worker panics so the rest stop instead of waiting on it.
    let aborted = AtomicBool::new(false);

    tracing::info!(
        capacity = args.capacity,
        writers = args.writers,
        readers = args.readers,
        budget = args.budget,
        arena = %ArenaKind::from(args.arena),
        "starting stress run"
    );

    let started = Instant::now();

    let (written, read) = thread::scope(|scope| {
        let writers: Vec<_> = (0..args.writers)
            .map(|id| {
                let (ring, remaining, writers_done, running, aborted) =
                    (&ring, &remaining, &writers_done, &running, &aborted);
                scope.spawn(move || {
                    let _guard = AbortOnPanic(aborted);
                    let mut rng = rand::rng();
                    let chunk = vec![id as u8; args.max_chunk];
                    let mut written = 0usize;

                    while running.load(Ordering::Relaxed) && !aborted.load(Ordering::Relaxed) {
                        let want = rng.random_range(1..=args.max_chunk);
                        let claimed = remaining.fetch_update(
                            Ordering::AcqRel,
                            Ordering::Acquire,
                            |left| (left > 0).then(|| left - want.min(left)),
                        );
                        let Ok(left) = claimed else {
                            break;
                        };

                        let mut todo = want.min(left);
                        while todo > 0 {
                            let n = ring.write(&chunk[..todo]);
                            if n == 0 {
                                if !running.load(Ordering::Relaxed)
                                    || aborted.load(Ordering::Relaxed)
                                {
                                    break;
                                }
                                thread::yield_now();
                            }
                            todo -= n;
                            written += n;
                        }
                    }

                    writers_done.fetch_add(1, Ordering::Release);
                    written
                })
            })
            .collect();

        let readers: Vec<_> = (0..args.readers)
            .map(|_| {
                let (ring, writers_done, aborted) = (&ring, &writers_done, &aborted);
                scope.spawn(move || {
                    let _guard = AbortOnPanic(aborted);
                    let mut rng = rand::rng();
                    let mut out = vec![0u8; args.max_chunk];
                    let mut read = 0usize;

                    loop {
                        let want = rng.random_range(1..=args.max_chunk);
                        let n = ring.read(&mut out[..want]);
                        read += n;

                        if n == 0 {
                            if aborted.load(Ordering::Relaxed) {
                                break;
                            }
                            if writers_done.load(Ordering::Acquire) == args.writers
                                && ring.is_empty()
                            {
                                break;
                            }
                            thread::yield_now();
                        }
                    }

                    read
                })
            })
            .collect();

        let mut panicked = None;
        let mut written = 0usize;
        for h in writers {
            match h.join() {
                Ok(n) => written += n,
                Err(_) => panicked = Some("writer thread panicked"),
            }
        }
        let mut read = 0usize;
        for h in readers {
            match h.join() {
                Ok(n) => read += n,
                Err(_) => {
                    panicked.get_or_insert("reader thread panicked");
                }
            }
        }

        match panicked {
            Some(msg) => Err(msg),
            None => Ok((written, read)),
        }
    })?;

    let elapsed = started.elapsed().as_secs_f64();
    let snapshot = ring.snapshot();

    tracing::info!(
        written,
        read,
        elapsed_secs = format_args!("{:.2}", elapsed),
        throughput_mib_s = format_args!("{:.2}", written as f64 / elapsed / 1024.0 / 1024.0),
        interrupted = !running.load(Ordering::SeqCst),
        "stress run finished"
    );
    tracing::debug!(?snapshot, "final ring state");

    ring.check_consistency()?;
    if written != read {
        return Err(format!("byte accounting mismatch: written {} read {}", written, read).into());
    }

    Ok(())
}
