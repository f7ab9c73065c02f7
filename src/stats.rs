//! Progress sampling and console formatting.

use std::io::Write;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use crate::puzzle::STATS_INTERVAL;
use crate::scanner::SharedState;

/// Sampler thread body: every STATS_INTERVAL seconds read the shared
/// counter and emit one flushed line with the average and instantaneous
/// rates. Sleeps in short slices so cancellation is observed promptly, and
/// holds no lock at any point.
pub fn run_sampler(shared: &SharedState, start: Instant) {
    let mut prev_total = 0u64;
    let mut prev_instant = start;
    let mut last_emit = Instant::now();

    while !shared.stop.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(250));
        if last_emit.elapsed() < Duration::from_secs(STATS_INTERVAL) {
            continue;
        }
        if shared.stop.load(Ordering::Relaxed) {
            break;
        }

        let now = Instant::now();
        let total = shared.total_keys.load(Ordering::Relaxed);
        let elapsed = now.duration_since(start).as_secs_f64();
        let dt = now.duration_since(prev_instant).as_secs_f64();
        let avg = if elapsed > 0.0 {
            total as f64 / elapsed
        } else {
            0.0
        };
        let inst = if dt > 0.0 {
            (total - prev_total) as f64 / dt
        } else {
            0.0
        };

        println!(
            "[{:7.1}s] Checked: {:>14} | Avg: {:8.2} Mkey/s | Now: {:8.2} Mkey/s",
            elapsed,
            total,
            avg / 1e6,
            inst / 1e6
        );
        std::io::stdout().flush().ok();

        prev_total = total;
        prev_instant = now;
        last_emit = now;
    }
}

/// Thousands-separated decimal, for the final summary.
pub fn format_num(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_num() {
        assert_eq!(format_num(0), "0");
        assert_eq!(format_num(999), "999");
        assert_eq!(format_num(1_000), "1,000");
        assert_eq!(format_num(4_194_304), "4,194,304");
        assert_eq!(format_num(1_234_567_890), "1,234,567,890");
    }

    #[test]
    fn test_sampler_stops() {
        let shared = SharedState::new();
        shared.stop.store(true, Ordering::SeqCst);
        // Returns immediately once the flag is up.
        run_sampler(&shared, Instant::now());
    }
}
