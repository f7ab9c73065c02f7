//! Prime-field arithmetic for secp256k1.
//!
//! Elements are four little-endian u64 limbs, kept fully reduced modulo
//! p = 2^256 - 2^32 - 977 at all times. All operations are variable-time:
//! this is a search engine, not a signing path, and there is no secret to
//! protect from side channels.

use std::ops::{Add, Mul, Sub};

/// p = 2^256 - 2^32 - 977, little-endian limbs.
const P: [u64; 4] = [
    0xFFFF_FFFE_FFFF_FC2F,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// 2^256 mod p. Folding the high half of a product back in multiplies by this.
const FOLD: u128 = 0x1_0000_03D1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FieldElement(pub(crate) [u64; 4]);

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement([0, 0, 0, 0]);
    pub const ONE: FieldElement = FieldElement([1, 0, 0, 0]);

    /// Construct from little-endian limbs known to be below p.
    pub(crate) const fn from_limbs(limbs: [u64; 4]) -> Self {
        FieldElement(limbs)
    }

    /// Parse a big-endian 32-byte value, reducing mod p.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for i in 0..4 {
            let mut limb = 0u64;
            for j in 0..8 {
                limb = (limb << 8) | bytes[(3 - i) * 8 + j] as u64;
            }
            limbs[i] = limb;
        }
        let mut fe = FieldElement(limbs);
        fe.reduce_once();
        fe
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for i in 0..4 {
            out[(3 - i) * 8..(3 - i) * 8 + 8].copy_from_slice(&self.0[i].to_be_bytes());
        }
        out
    }

    /// Copy the big-endian representation into a caller buffer.
    #[inline]
    pub fn write_be_bytes(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), 32);
        for i in 0..4 {
            out[(3 - i) * 8..(3 - i) * 8 + 8].copy_from_slice(&self.0[i].to_be_bytes());
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }

    #[inline]
    pub fn is_odd(&self) -> bool {
        self.0[0] & 1 == 1
    }

    #[inline]
    fn geq_p(&self) -> bool {
        for i in (0..4).rev() {
            if self.0[i] > P[i] {
                return true;
            }
            if self.0[i] < P[i] {
                return false;
            }
        }
        true
    }

    /// Subtract p once if the value is >= p. Inputs are always < 2p.
    #[inline]
    fn reduce_once(&mut self) {
        if self.geq_p() {
            let mut borrow = 0u64;
            for i in 0..4 {
                let (d, b1) = self.0[i].overflowing_sub(P[i]);
                let (d, b2) = d.overflowing_sub(borrow);
                self.0[i] = d;
                borrow = (b1 | b2) as u64;
            }
        }
    }

    #[inline]
    pub fn add_fe(&self, rhs: &FieldElement) -> FieldElement {
        let mut out = [0u64; 4];
        let mut carry = 0u128;
        for i in 0..4 {
            let s = self.0[i] as u128 + rhs.0[i] as u128 + carry;
            out[i] = s as u64;
            carry = s >> 64;
        }
        let mut fe = FieldElement(out);
        if carry != 0 {
            // Wrapped past 2^256: fold the bit back in (2^256 ≡ FOLD); the
            // wrapped value is small enough that the fold cannot carry out.
            let mut c = FOLD;
            for limb in fe.0.iter_mut() {
                let s = *limb as u128 + (c & 0xFFFF_FFFF_FFFF_FFFF);
                *limb = s as u64;
                c = (c >> 64) + (s >> 64);
            }
        }
        fe.reduce_once();
        fe
    }

    #[inline]
    pub fn sub_fe(&self, rhs: &FieldElement) -> FieldElement {
        let mut out = [0u64; 4];
        let mut borrow = 0u64;
        for i in 0..4 {
            let (d, b1) = self.0[i].overflowing_sub(rhs.0[i]);
            let (d, b2) = d.overflowing_sub(borrow);
            out[i] = d;
            borrow = (b1 | b2) as u64;
        }
        if borrow != 0 {
            let mut carry = 0u128;
            for (i, limb) in out.iter_mut().enumerate() {
                let s = *limb as u128 + P[i] as u128 + carry;
                *limb = s as u64;
                carry = s >> 64;
            }
        }
        FieldElement(out)
    }

    /// Schoolbook 4x4 multiply into eight limbs.
    #[inline]
    fn mul_wide(a: &[u64; 4], b: &[u64; 4]) -> [u64; 8] {
        let mut w = [0u64; 8];
        for i in 0..4 {
            let mut carry = 0u128;
            for j in 0..4 {
                let t = w[i + j] as u128 + a[i] as u128 * b[j] as u128 + carry;
                w[i + j] = t as u64;
                carry = t >> 64;
            }
            w[i + 4] = carry as u64;
        }
        w
    }

    /// Reduce a 512-bit product: fold the high 256 bits down twice via
    /// 2^256 ≡ 2^32 + 977, then a single conditional subtraction.
    #[inline]
    fn reduce_wide(w: &[u64; 8]) -> FieldElement {
        // First fold: t = lo + hi * FOLD, four limbs plus a small head.
        let mut t = [0u64; 4];
        let mut carry = 0u128;
        for i in 0..4 {
            let v = w[i] as u128 + w[i + 4] as u128 * FOLD + carry;
            t[i] = v as u64;
            carry = v >> 64;
        }
        let head = carry as u64;

        // Second fold: r = t + head * FOLD.
        let mut r = [0u64; 4];
        let mut carry = head as u128 * FOLD;
        for i in 0..4 {
            let v = t[i] as u128 + (carry & 0xFFFF_FFFF_FFFF_FFFF);
            r[i] = v as u64;
            carry = (carry >> 64) + (v >> 64);
        }
        if carry != 0 {
            // One last single-bit wrap.
            let mut c = FOLD;
            for limb in r.iter_mut() {
                let s = *limb as u128 + (c & 0xFFFF_FFFF_FFFF_FFFF);
                *limb = s as u64;
                c = (c >> 64) + (s >> 64);
            }
        }
        let mut fe = FieldElement(r);
        fe.reduce_once();
        fe
    }

    #[inline]
    pub fn mul_fe(&self, rhs: &FieldElement) -> FieldElement {
        Self::reduce_wide(&Self::mul_wide(&self.0, &rhs.0))
    }

    #[inline]
    pub fn square(&self) -> FieldElement {
        self.mul_fe(self)
    }

    /// Cheaper spelling of `a + a`.
    #[inline]
    pub fn double(&self) -> FieldElement {
        self.add_fe(self)
    }

    /// Multiplicative inverse via Fermat (a^(p-2)), variable time. The
    /// inverse of zero is zero; walk points never have Z = 0 and the batch
    /// conversion skips such slots explicitly.
    pub fn invert(&self) -> FieldElement {
        const P_MINUS_2: [u64; 4] = [
            0xFFFF_FFFE_FFFF_FC2D,
            0xFFFF_FFFF_FFFF_FFFF,
            0xFFFF_FFFF_FFFF_FFFF,
            0xFFFF_FFFF_FFFF_FFFF,
        ];
        self.pow_vartime(&P_MINUS_2)
    }

    fn pow_vartime(&self, exp: &[u64; 4]) -> FieldElement {
        let mut acc = FieldElement::ONE;
        let mut started = false;
        for limb in exp.iter().rev() {
            for bit in (0..64).rev() {
                if started {
                    acc = acc.square();
                }
                if (limb >> bit) & 1 == 1 {
                    if started {
                        acc = acc.mul_fe(self);
                    } else {
                        acc = *self;
                        started = true;
                    }
                }
            }
        }
        acc
    }
}

impl Add for FieldElement {
    type Output = FieldElement;
    #[inline]
    fn add(self, rhs: FieldElement) -> FieldElement {
        self.add_fe(&rhs)
    }
}

impl Sub for FieldElement {
    type Output = FieldElement;
    #[inline]
    fn sub(self, rhs: FieldElement) -> FieldElement {
        self.sub_fe(&rhs)
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;
    #[inline]
    fn mul(self, rhs: FieldElement) -> FieldElement {
        self.mul_fe(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(hex_str: &str) -> FieldElement {
        let bytes: [u8; 32] = hex::decode(hex_str).unwrap().try_into().unwrap();
        FieldElement::from_be_bytes(&bytes)
    }

    #[test]
    fn test_add_sub_roundtrip() {
        let a = fe("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
        let b = fe("483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8");
        assert_eq!(a + b - b, a);
        assert_eq!(a - a, FieldElement::ZERO);
        assert_eq!(a + FieldElement::ZERO, a);
    }

    #[test]
    fn test_minus_one_squares_to_one() {
        let minus_one = FieldElement::ZERO - FieldElement::ONE;
        assert_eq!(minus_one.square(), FieldElement::ONE);
        assert_eq!(minus_one + FieldElement::ONE, FieldElement::ZERO);
    }

    #[test]
    fn test_mul_distributes() {
        let a = fe("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
        let b = fe("483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8");
        let c = fe("f6f5431d25bbf7b12e8add9af5e3475c44a0a5b8f6f5431d25bbf7b12e8add9a");
        assert_eq!(a * (b + c), a * b + a * c);
        // (a+b)^2 = a^2 + 2ab + b^2
        let lhs = (a + b).square();
        let rhs = a.square() + (a * b).double() + b.square();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_invert() {
        let a = fe("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
        assert_eq!(a * a.invert(), FieldElement::ONE);
        assert_eq!(FieldElement::ONE.invert(), FieldElement::ONE);
        assert_eq!(FieldElement::ZERO.invert(), FieldElement::ZERO);
    }

    #[test]
    fn test_reduction_boundary() {
        // p itself parses to zero; p-1 survives and wraps on increment.
        let p = fe("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f");
        assert!(p.is_zero());
        let p_minus_1 = fe("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2e");
        assert_eq!(p_minus_1 + FieldElement::ONE, FieldElement::ZERO);
    }

    #[test]
    fn test_byte_roundtrip() {
        let a = fe("029bfcdb2dce28d959f2815b16f8179879be667ef9dcbbac55a06295ce870b07");
        let bytes = a.to_be_bytes();
        assert_eq!(FieldElement::from_be_bytes(&bytes), a);
        assert!(!a.is_zero());
    }

    #[test]
    fn test_parity() {
        assert!(FieldElement::ONE.is_odd());
        assert!(!FieldElement::ZERO.is_odd());
        assert!(!FieldElement::ONE.double().is_odd());
    }
}
