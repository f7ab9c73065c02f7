//! The scanning engine: per-worker chunk walks over the puzzle range.
//!
//! Each worker owns its PRNG and batch buffers and touches shared state in
//! exactly two places: relaxed adds to the total-keys counter and
//! acquire loads of the stop flag at batch boundaries. A worker that finds
//! the key verifies it against an independent implementation, writes the
//! record durably, and only then release-stores the stop flag, so anyone
//! who observes the flag also observes the record on disk.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_channel::Sender;

use crate::address;
use crate::crypto;
use crate::math::gen_mult::GenTable;
use crate::math::point::{batch_normalize, Affine, Jacobian};
use crate::math::field::FieldElement;
use crate::puzzle::{
    PrivKey, BATCH_SIZE, COUNTER_FLUSH_THRESHOLD, NUM_BATCHES,
};
use crate::report::FoundKey;

/// Salt mixed into each worker's PRNG seed so per-worker streams never
/// collide even when the process entropy is shared.
const WORKER_SALT: u64 = 6364136223846793005;

/// xorshift64* — tiny, fast, and plenty for picking random chunk starts.
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn new(seed: u64) -> XorShift64 {
        XorShift64 {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

/// One u64 of process-wide entropy. Prefers the OS source and falls back to
/// wall clock ⊕ a monotonic tick with a warning, per the error taxonomy.
pub fn entropy_seed() -> u64 {
    use rand::RngCore;
    let mut buf = [0u8; 8];
    match rand::rngs::OsRng.try_fill_bytes(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(e) => {
            eprintln!(
                "[!] OS entropy unavailable ({}), falling back to clock seeding",
                e
            );
            static TICK: AtomicU64 = AtomicU64::new(0);
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0);
            nanos ^ (TICK.fetch_add(1, Ordering::Relaxed).wrapping_mul(WORKER_SALT) << 20)
        }
    }
}

/// Per-worker PRNG, derived from the process entropy and the worker id.
pub fn worker_rng(process_seed: u64, worker_id: usize) -> XorShift64 {
    XorShift64::new(process_seed ^ (worker_id as u64 + 1).wrapping_mul(WORKER_SALT))
}

/// Draw a uniform seed: top nibble in {4..7} (six random bits in the high
/// half), low half random, rejected and redrawn while a chunk starting
/// there would escape the range.
pub fn draw_seed(rng: &mut XorShift64) -> PrivKey {
    loop {
        let r = rng.next_u64();
        let seed = PrivKey {
            hi: 0x40 | (r & 0x3F),
            lo: rng.next_u64(),
        };
        if seed.is_valid_seed() {
            return seed;
        }
    }
}

/// Flags and counters shared by every thread in the process.
pub struct SharedState {
    /// Monotonic total of keys checked, relaxed ordering; trails the truth
    /// by at most one flush threshold per worker.
    pub total_keys: AtomicU64,
    /// Found-or-terminate flag. Written with release ordering after the
    /// found record hits disk; read with acquire at batch boundaries.
    pub stop: AtomicBool,
    /// Set alongside `stop` by the signal handler so the summary can tell
    /// a cancellation from an exhausted run.
    pub interrupted: AtomicBool,
}

impl SharedState {
    pub fn new() -> SharedState {
        SharedState {
            total_keys: AtomicU64::new(0),
            stop: AtomicBool::new(false),
            interrupted: AtomicBool::new(false),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// The 20-byte needle plus a cached 4-byte prefix for cheap early
/// rejection, and the rendered address for reporting.
pub struct ScanTarget {
    pub h160: [u8; 20],
    pub prefix: [u8; 4],
    pub address: String,
}

impl ScanTarget {
    pub fn new(h160: [u8; 20]) -> ScanTarget {
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&h160[..4]);
        ScanTarget {
            h160,
            prefix,
            address: address::p2pkh_address(&h160),
        }
    }
}

/// A scanning worker. Owns BATCH_SIZE Jacobian and affine slots plus the
/// inversion scratch; buffers are reused for every batch so the steady
/// state performs no allocation at all.
pub struct Worker {
    pub id: usize,
    jac: Vec<Jacobian>,
    aff: Vec<Affine>,
    scratch: Vec<FieldElement>,
    local_count: u64,
}

impl Worker {
    pub fn new(id: usize) -> Worker {
        Worker {
            id,
            jac: vec![Jacobian::INFINITY; BATCH_SIZE],
            aff: vec![
                Affine {
                    x: FieldElement::ZERO,
                    y: FieldElement::ZERO,
                };
                BATCH_SIZE
            ],
            scratch: vec![FieldElement::ZERO; BATCH_SIZE],
            local_count: 0,
        }
    }

    #[inline]
    fn flush_counter(&mut self, shared: &SharedState) {
        if self.local_count > 0 {
            shared
                .total_keys
                .fetch_add(self.local_count, Ordering::Relaxed);
            self.local_count = 0;
        }
    }

    /// Walk one chunk of CHUNK_SIZE keys starting at `seed`: a single
    /// scalar multiplication, then NUM_BATCHES rounds of sequential `+ G`
    /// additions, one batched affine conversion per round, and a
    /// serialize-hash-compare pass over every point.
    ///
    /// Returns the matching key, with the local counter flushed through the
    /// partial batch so the shared total reflects the moment of discovery.
    pub fn scan_chunk(
        &mut self,
        seed: PrivKey,
        table: &GenTable,
        target: &ScanTarget,
        shared: &SharedState,
    ) -> Option<PrivKey> {
        let g = Affine::GENERATOR;
        let mut frontier = table.mul(&seed.to_scalar());
        let mut pub33 = [0u8; 33];

        for batch_num in 0..NUM_BATCHES {
            if shared.stop.load(Ordering::Acquire) {
                break;
            }

            self.jac[0] = frontier;
            for i in 1..BATCH_SIZE {
                self.jac[i] = self.jac[i - 1].add_affine(&g);
            }
            batch_normalize(&self.jac, &mut self.aff, &mut self.scratch);

            for i in 0..BATCH_SIZE {
                self.aff[i].serialize_compressed_into(&mut pub33);
                let h = crypto::hash160(&pub33);
                if h[..4] == target.prefix[..] && h == target.h160 {
                    self.local_count += i as u64 + 1;
                    self.flush_counter(shared);
                    let offset = batch_num as u64 * BATCH_SIZE as u64 + i as u64;
                    return Some(seed.add_offset(offset));
                }
            }

            // Step the frontier past this batch; the next scalar
            // multiplication only happens at the next random seed.
            frontier = self.jac[BATCH_SIZE - 1].add_affine(&g);
            self.local_count += BATCH_SIZE as u64;
            if self.local_count >= COUNTER_FLUSH_THRESHOLD {
                self.flush_counter(shared);
            }
        }

        self.flush_counter(shared);
        None
    }

    /// Worker thread body: random chunks until the stop flag, or until this
    /// worker is the one that finds the key.
    pub fn run(
        &mut self,
        mut rng: XorShift64,
        table: &GenTable,
        target: &ScanTarget,
        shared: &SharedState,
        found_tx: &Sender<FoundKey>,
    ) {
        while !shared.stop.load(Ordering::Acquire) {
            let seed = draw_seed(&mut rng);
            if let Some(key) = self.scan_chunk(seed, table, target, shared) {
                self.publish_found(key, target, shared, found_tx);
                return;
            }
        }
        self.flush_counter(shared);
    }

    fn publish_found(
        &mut self,
        key: PrivKey,
        target: &ScanTarget,
        shared: &SharedState,
        found_tx: &Sender<FoundKey>,
    ) {
        if !verify_candidate(key, &target.h160) {
            // A full 20-byte match that an independent implementation
            // rejects means the engine math is broken; stop the run rather
            // than report a key that cannot spend anything.
            eprintln!(
                "[✗] worker {}: match at {} failed independent verification",
                self.id,
                key.hex()
            );
            shared.stop.store(true, Ordering::Release);
            return;
        }

        let record = FoundKey {
            key,
            address: target.address.clone(),
            h160: target.h160,
            total_keys: shared.total_keys.load(Ordering::Relaxed),
            found_at: chrono::Local::now(),
        };

        // Durable write first, then the release store: a thread that sees
        // the flag set is guaranteed to see a non-empty record file.
        crate::report::publish(&record);
        shared.stop.store(true, Ordering::Release);
        let _ = found_tx.send(record);
    }
}

/// Re-derive the public key with `k256` and hash it with the `sha2`/
/// `ripemd` reference composition. Both stacks are independent of the
/// engine's own field, point, and hash code.
pub fn verify_candidate(key: PrivKey, expected_h160: &[u8; 20]) -> bool {
    use k256::elliptic_curve::sec1::ToEncodedPoint;
    use k256::SecretKey;

    let Ok(secret) = SecretKey::from_slice(&key.to_be_bytes()) else {
        return false;
    };
    let pubkey = secret.public_key();
    let compressed = pubkey.to_encoded_point(true);
    crypto::hash160_ref(compressed.as_bytes()) == *expected_h160
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::MAX_SEED;

    #[test]
    fn test_xorshift_deterministic_and_nonzero() {
        let mut a = XorShift64::new(0xDEADBEEF);
        let mut b = XorShift64::new(0xDEADBEEF);
        for _ in 0..1000 {
            let v = a.next_u64();
            assert_eq!(v, b.next_u64());
        }
        // The zero seed is remapped, not absorbed.
        let mut z = XorShift64::new(0);
        assert_ne!(z.next_u64(), 0);
    }

    #[test]
    fn test_worker_rngs_diverge() {
        let base = 0x0123_4567_89AB_CDEF;
        let mut r0 = worker_rng(base, 0);
        let mut r1 = worker_rng(base, 1);
        let same = (0..64).filter(|_| r0.next_u64() == r1.next_u64()).count();
        assert_eq!(same, 0);
    }

    #[test]
    fn test_draw_seed_stays_in_range() {
        let mut rng = XorShift64::new(42);
        for _ in 0..10_000 {
            let seed = draw_seed(&mut rng);
            assert!(seed.is_valid_seed());
            assert!((0x40..=0x7F).contains(&seed.hi));
            assert!(seed <= MAX_SEED);
        }
    }

    #[test]
    fn test_verify_candidate_key_one() {
        // hash160 of the compressed pubkey for private key 1.
        let h: [u8; 20] = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6")
            .unwrap()
            .try_into()
            .unwrap();
        assert!(verify_candidate(PrivKey { hi: 0, lo: 1 }, &h));
        assert!(!verify_candidate(PrivKey { hi: 0, lo: 2 }, &h));
    }

    #[test]
    fn test_scan_target_prefix() {
        let target = ScanTarget::new(crate::puzzle::TARGET_H160);
        assert_eq!(target.prefix, [0xf6, 0xf5, 0x43, 0x1d]);
        assert_eq!(target.address, crate::puzzle::TARGET_ADDRESS);
    }
}
