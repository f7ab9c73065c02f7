//! Precomputed-table scalar multiplication by the generator.
//!
//! The table holds d * 16^w * G for every window w in 0..64 and digit d in
//! 1..=15, all in affine form so each table hit costs one mixed addition.
//! A 256-bit k * G is then at most 64 additions and no doublings. The walk
//! pays this price once per chunk; everything after the seed point is plain
//! `+ G` stepping.

use super::field::FieldElement;
use super::point::{batch_to_affine, Affine, Jacobian};
use super::scalar::Scalar;
use crate::error::{Result, ScannerError};

const WINDOWS: usize = 64;
const DIGITS: usize = 15;

pub struct GenTable {
    /// windows[w][d - 1] = d * 16^w * G.
    windows: Vec<[Affine; DIGITS]>,
}

impl GenTable {
    /// Build the table: one Jacobian addition chain per window, then a
    /// single batch normalization over all 960 entries.
    pub fn build() -> Result<GenTable> {
        let mut jac = Vec::with_capacity(WINDOWS * DIGITS);
        let mut base = Affine::GENERATOR;
        for w in 0..WINDOWS {
            let mut acc = Jacobian::from_affine(&base);
            for _ in 0..DIGITS {
                jac.push(acc);
                acc = acc.add_affine(&base);
            }
            // acc is now 16 * base, the next window's base.
            if w + 1 < WINDOWS {
                base = acc.to_affine().ok_or_else(|| {
                    ScannerError::SelfTest(format!("generator table degenerated at window {}", w))
                })?;
            }
        }

        let flat = batch_to_affine(&jac);
        let mut windows = Vec::with_capacity(WINDOWS);
        for w in 0..WINDOWS {
            let mut row = [Affine {
                x: FieldElement::ZERO,
                y: FieldElement::ZERO,
            }; DIGITS];
            row.copy_from_slice(&flat[w * DIGITS..(w + 1) * DIGITS]);
            for entry in &row {
                if !entry.is_on_curve() {
                    return Err(ScannerError::SelfTest(format!(
                        "generator table entry off-curve at window {}",
                        w
                    )));
                }
            }
            windows.push(row);
        }
        Ok(GenTable { windows })
    }

    /// k * G in Jacobian form. Returns infinity for k = 0.
    pub fn mul(&self, k: &Scalar) -> Jacobian {
        let mut acc = Jacobian::INFINITY;
        for w in 0..WINDOWS {
            let d = k.nibble(w);
            if d != 0 {
                acc = acc.add_affine(&self.windows[w][d - 1]);
            }
        }
        acc
    }

    #[cfg(test)]
    pub(crate) fn corrupt_entry_for_test(&mut self, window: usize, digit: usize) {
        let entry = &mut self.windows[window][digit];
        entry.x = entry.x + FieldElement::ONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_multiples() {
        let table = GenTable::build().unwrap();
        // 1*G is the generator itself.
        let one = table.mul(&Scalar::from_u64(1)).to_affine().unwrap();
        assert_eq!(one, Affine::GENERATOR);
        // Multiples up to 40 agree with a repeated-addition walk, crossing
        // the first window boundary at 16.
        let mut walk = Jacobian::from_affine(&Affine::GENERATOR);
        for k in 2..=40u64 {
            walk = walk.add_affine(&Affine::GENERATOR);
            let via_table = table.mul(&Scalar::from_u64(k)).to_affine().unwrap();
            assert_eq!(via_table, walk.to_affine().unwrap(), "mismatch at k = {}", k);
        }
    }

    #[test]
    fn test_zero_scalar() {
        let table = GenTable::build().unwrap();
        assert!(table.mul(&Scalar::ZERO).is_infinity());
    }

    #[test]
    fn test_additivity_across_windows() {
        let table = GenTable::build().unwrap();
        // (2^64 + 5) * G == (2^64 * G) + 5 * G
        let combined = table.mul(&Scalar::from_u72(1, 5)).to_affine().unwrap();
        let hi = table.mul(&Scalar::from_u72(1, 0));
        let lo = table.mul(&Scalar::from_u64(5)).to_affine().unwrap();
        let sum = hi.add_affine(&lo).to_affine().unwrap();
        assert_eq!(combined, sum);
    }
}
