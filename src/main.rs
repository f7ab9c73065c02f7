// puzzle71 - CPU scanner for the 71-bit Bitcoin puzzle range
// One scalar multiplication per chunk, then batched +G walking with a
// single field inversion per 2048 points.

use std::process;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::Parser;
use crossbeam_channel::bounded;

use puzzle71::math::gen_mult::GenTable;
use puzzle71::puzzle::{
    BATCH_SIZE, CHUNK_SIZE, NUM_BATCHES, RANGE_HIGH, RANGE_LOW, TARGET_ADDRESS, TARGET_H160,
};
use puzzle71::report::{self, FoundKey};
use puzzle71::scanner::{self, ScanTarget, SharedState, Worker};
use puzzle71::selftest;
use puzzle71::stats::{self, format_num};

#[derive(Parser, Debug)]
#[command(
    name = "puzzle71",
    about = "Batched secp256k1 scanner for the 71-bit Bitcoin puzzle range"
)]
struct Args {
    /// Worker thread count
    #[arg(
        value_name = "THREADS",
        value_parser = clap::value_parser!(u32).range(1..=256),
        default_value_t = 4
    )]
    threads: u32,

    /// Extra locations to copy the found-key record to
    #[arg(long = "backup", value_name = "PATH")]
    backups: Vec<std::path::PathBuf>,
}

fn banner(threads: u32) {
    println!("============================================================");
    println!("  Bitcoin Puzzle #71 Scanner - BATCH INVERSION MODE");
    println!("  Target: {}", TARGET_ADDRESS);
    println!("  Hash160: {}", hex::encode(TARGET_H160));
    println!("  Range: {} - {}", RANGE_LOW.hex(), RANGE_HIGH.hex());
    println!(
        "  Batch: {} pts | {} batches/chunk | {} keys/chunk",
        BATCH_SIZE,
        NUM_BATCHES,
        format_num(CHUNK_SIZE)
    );
    println!("  Threads: {}", threads);
    println!("============================================================");
}

fn summary(start: Instant, shared: &SharedState, found: bool) {
    let elapsed = start.elapsed().as_secs_f64();
    let total = shared.total_keys.load(Ordering::Relaxed);
    let rate = if elapsed > 0.0 {
        total as f64 / elapsed
    } else {
        0.0
    };
    println!("\n============================================================");
    if shared.interrupted.load(Ordering::SeqCst) {
        println!("  Scan interrupted by user.");
    } else if found {
        println!("  KEY FOUND! Check {}", report::FOUND_KEY_FILE);
    }
    println!("  Total keys checked: {}", format_num(total));
    println!("  Elapsed: {:.1} seconds", elapsed);
    println!(
        "  Average rate: {:.0} keys/sec ({:.2} Mkeys/sec)",
        rate,
        rate / 1e6
    );
    println!("============================================================");
}

fn main() {
    let args = Args::parse();
    banner(args.threads);

    println!("  Initializing generator table...");
    let table = match GenTable::build() {
        Ok(t) => Arc::new(t),
        Err(e) => {
            eprintln!("FATAL: {}", e);
            process::exit(1);
        }
    };

    if !selftest::run_self_test(&table) {
        eprintln!("[FATAL] Self-test failed. Exiting to prevent incorrect scanning.");
        process::exit(1);
    }

    let shared = Arc::new(SharedState::new());
    let target = Arc::new(ScanTarget::new(TARGET_H160));

    // Ctrl+C: raise the flags; workers drain at the next batch boundary.
    {
        let shared = shared.clone();
        ctrlc::set_handler(move || {
            println!("\n[!] Stopping...");
            shared.interrupted.store(true, Ordering::SeqCst);
            shared.stop.store(true, Ordering::SeqCst);
        })
        .ok();
    }

    let start = Instant::now();
    let (found_tx, found_rx) = bounded::<FoundKey>(args.threads as usize);

    let stats_handle = {
        let shared = shared.clone();
        thread::Builder::new()
            .name("stats".into())
            .spawn(move || stats::run_sampler(&shared, start))
            .map_err(|e| eprintln!("[!] stats thread spawn failed: {}", e))
            .ok()
    };

    let entropy = scanner::entropy_seed();
    let mut workers = Vec::new();
    for id in 0..args.threads as usize {
        let table = table.clone();
        let target = target.clone();
        let shared = shared.clone();
        let found_tx = found_tx.clone();
        let rng = scanner::worker_rng(entropy, id);
        let spawned = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || {
                let mut worker = Worker::new(id);
                worker.run(rng, &table, &target, &shared, &found_tx);
            });
        match spawned {
            Ok(handle) => workers.push(handle),
            // A worker that cannot start is reported and skipped; the rest
            // keep scanning at reduced throughput.
            Err(e) => eprintln!("[!] worker {}: spawn failed: {}", id, e),
        }
    }
    drop(found_tx);

    if workers.is_empty() {
        eprintln!("FATAL: no workers could be started");
        process::exit(1);
    }

    println!(
        "[▶] Scanning with {} workers... (Ctrl+C to stop)\n",
        workers.len()
    );

    for handle in workers {
        handle.join().ok();
    }
    shared.stop.store(true, Ordering::SeqCst);
    if let Some(handle) = stats_handle {
        handle.join().ok();
    }

    let found = found_rx.try_recv().ok();
    if let Some(record) = &found {
        report::copy_to_backups(record, &args.backups);
    }

    summary(start, &shared, found.is_some());
}
