//! Startup self-test.
//!
//! Runs before any worker thread exists and gates the whole process: a
//! wrong hash or a wrong point here means every subsequent compare would be
//! garbage and a real hit would scroll past unnoticed. Checks the fused
//! hash pipeline against the known hash160 of G and the `sha2`/`ripemd`
//! reference, the table multiplier against plain point addition, the batch
//! inversion against the multiplier, and the whole EC stack against k256.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;

use crate::address;
use crate::crypto;
use crate::math::gen_mult::GenTable;
use crate::math::point::{batch_to_affine, Affine, Jacobian};
use crate::math::scalar::Scalar;
use crate::puzzle::{PrivKey, TARGET_ADDRESS, TARGET_H160};

/// hash160 of the compressed generator, the address preimage of key 1.
const HASH160_G: [u8; 20] = [
    0x75, 0x1e, 0x76, 0xe8, 0x19, 0x91, 0x96, 0xd4, 0x54, 0x94, 0x1c, 0x45, 0xd1, 0xb3, 0xa3,
    0x23, 0xf1, 0x43, 0x3b, 0xd6,
];

/// Run every check; returns false (after printing what broke) on failure.
pub fn run_self_test(table: &GenTable) -> bool {
    println!("[🔍] Running self-test...");
    let mut all_passed = true;

    all_passed &= check_hash_pipeline();
    all_passed &= check_ec_add(table);
    all_passed &= check_batch_inversion(table);
    all_passed &= check_against_k256(table);

    if all_passed {
        println!("[✓] Self-test passed\n");
    } else {
        eprintln!("\n[✗] SELF-TEST FAILED! Results would be unreliable.");
    }
    all_passed
}

fn check_hash_pipeline() -> bool {
    let g33 = Affine::GENERATOR.serialize_compressed();

    let fused = crypto::hash160(&g33);
    if fused != HASH160_G {
        eprintln!("  [✗] hash160(G) mismatch: got {}", hex::encode(fused));
        return false;
    }
    let reference = crypto::hash160_ref(&g33);
    if fused != reference {
        eprintln!(
            "  [✗] Specialized hashes disagree with sha2/ripemd: {} vs {}",
            hex::encode(fused),
            hex::encode(reference)
        );
        return false;
    }
    let addr = address::p2pkh_address(&TARGET_H160);
    if addr != TARGET_ADDRESS {
        eprintln!(
            "  [✗] Target address mismatch: {} vs {}",
            addr, TARGET_ADDRESS
        );
        return false;
    }
    println!("  [✓] Hash pipeline (hash160(G), reference agreement, target address)");
    true
}

fn check_ec_add(table: &GenTable) -> bool {
    let via_table = table.mul(&Scalar::from_u64(2)).to_affine();
    let via_add = Jacobian::from_affine(&Affine::GENERATOR)
        .add_affine(&Affine::GENERATOR)
        .to_affine();
    match (via_table, via_add) {
        (Some(a), Some(b)) if a.serialize_compressed() == b.serialize_compressed() => {
            println!("  [✓] EC addition (2·G == G + G)");
            true
        }
        _ => {
            eprintln!("  [✗] EC addition mismatch: 2·G != G + G");
            false
        }
    }
}

fn check_batch_inversion(table: &GenTable) -> bool {
    // Walk G, 2G, 3G, 4G in Jacobian, batch-convert, and compare each to
    // the table multiplier's answer.
    let g = Affine::GENERATOR;
    let mut chain = Vec::with_capacity(4);
    let mut acc = Jacobian::from_affine(&g);
    for _ in 0..4 {
        chain.push(acc);
        acc = acc.add_affine(&g);
    }
    let batch = batch_to_affine(&chain);

    for (i, point) in batch.iter().enumerate() {
        let expected = match table.mul(&Scalar::from_u64(i as u64 + 1)).to_affine() {
            Some(p) => p,
            None => {
                eprintln!("  [✗] Batch inversion check: {}·G is infinity", i + 1);
                return false;
            }
        };
        if point.serialize_compressed() != expected.serialize_compressed() {
            eprintln!("  [✗] Batch inversion mismatch at {}·G", i + 1);
            return false;
        }
    }
    println!("  [✓] Batch inversion ({{G..4G}} vs scalar multiplier)");
    true
}

fn check_against_k256(table: &GenTable) -> bool {
    // One trivial key and one mid-range 72-bit key.
    let probes = [
        PrivKey { hi: 0, lo: 1 },
        PrivKey {
            hi: 0x51,
            lo: 0x1234_5678_9ABC_DEF0,
        },
    ];
    for key in probes {
        let ours = match table.mul(&key.to_scalar()).to_affine() {
            Some(p) => p.serialize_compressed(),
            None => {
                eprintln!("  [✗] k256 check: {}·G is infinity", key.hex());
                return false;
            }
        };
        let secret = match SecretKey::from_slice(&key.to_be_bytes()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("  [✗] k256 rejected key {}: {}", key.hex(), e);
                return false;
            }
        };
        let theirs = secret.public_key().to_encoded_point(true);
        if &ours[..] != theirs.as_bytes() {
            eprintln!("  [✗] k256 disagreement at key {}", key.hex());
            return false;
        }
    }
    println!("  [✓] k256 agreement (k = 1 and mid-range)");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_test_passes_on_good_table() {
        let table = GenTable::build().unwrap();
        assert!(run_self_test(&table));
    }

    #[test]
    fn test_self_test_catches_corrupt_table() {
        // Corrupting the 2·G entry must fail the process before any worker
        // would start.
        let mut table = GenTable::build().unwrap();
        table.corrupt_entry_for_test(0, 1);
        assert!(!run_self_test(&table));
    }
}
