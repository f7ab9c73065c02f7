//! secp256k1 group elements.
//!
//! The walking frontier and batch buffers live in Jacobian (X, Y, Z)
//! coordinates, where (X, Y, Z) represents the affine point (X/Z^2, Y/Z^3)
//! and the point at infinity is encoded as Z = 0. Addition of a fixed
//! affine addend never needs a field inversion; batches of points are
//! converted to affine with a single inversion via Montgomery's trick.

use super::field::FieldElement;

/// Affine point. Never the point at infinity except as the zero sentinel
/// emitted by `batch_normalize` for a degenerate slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Affine {
    pub x: FieldElement,
    pub y: FieldElement,
}

#[derive(Clone, Copy, Debug)]
pub struct Jacobian {
    pub x: FieldElement,
    pub y: FieldElement,
    pub z: FieldElement,
}

impl Affine {
    /// The secp256k1 generator G.
    pub const GENERATOR: Affine = Affine {
        x: FieldElement::from_limbs([
            0x59F2_815B_16F8_1798,
            0x029B_FCDB_2DCE_28D9,
            0x55A0_6295_CE87_0B07,
            0x79BE_667E_F9DC_BBAC,
        ]),
        y: FieldElement::from_limbs([
            0x9C47_D08F_FB10_D4B8,
            0xFD17_B448_A685_5419,
            0x5DA4_FBFC_0E11_08A8,
            0x483A_DA77_26A3_C465,
        ]),
    };

    /// Serialize to the 33-byte compressed form: parity byte then x
    /// big-endian. Writes into the caller's buffer; the hot loop keeps one.
    #[inline]
    pub fn serialize_compressed_into(&self, out: &mut [u8; 33]) {
        out[0] = if self.y.is_odd() { 0x03 } else { 0x02 };
        self.x.write_be_bytes(&mut out[1..33]);
    }

    pub fn serialize_compressed(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        self.serialize_compressed_into(&mut out);
        out
    }

    /// y^2 == x^3 + 7, used by tests and the startup self-test.
    pub fn is_on_curve(&self) -> bool {
        let seven = FieldElement::from_limbs([7, 0, 0, 0]);
        self.y.square() == self.x.square() * self.x + seven
    }
}

impl Jacobian {
    pub const INFINITY: Jacobian = Jacobian {
        x: FieldElement::ONE,
        y: FieldElement::ONE,
        z: FieldElement::ZERO,
    };

    #[inline]
    pub fn from_affine(p: &Affine) -> Jacobian {
        Jacobian {
            x: p.x,
            y: p.y,
            z: FieldElement::ONE,
        }
    }

    #[inline]
    pub fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    /// Point doubling with the a = 0 shortcut.
    pub fn double(&self) -> Jacobian {
        if self.is_infinity() {
            return *self;
        }
        let a = self.x.square();
        let b = self.y.square();
        let c = b.square();
        let d = ((self.x + b).square() - a - c).double();
        let e = a + a + a;
        let f = e.square();
        let x3 = f - d - d;
        let y3 = e * (d - x3) - c.double().double().double();
        let z3 = (self.y * self.z).double();
        Jacobian { x: x3, y: y3, z: z3 }
    }

    /// Mixed addition of an affine point (Z2 = 1), variable time.
    ///
    /// The walk only hits the degenerate x1 == x2 branch if the frontier
    /// equals ±(the addend), which cannot happen for in-range seeds; the
    /// branch is still taken correctly when it does.
    pub fn add_affine(&self, q: &Affine) -> Jacobian {
        if self.is_infinity() {
            return Jacobian::from_affine(q);
        }
        let z1z1 = self.z.square();
        let u2 = q.x * z1z1;
        let s2 = q.y * z1z1 * self.z;
        if u2 == self.x {
            if s2 == self.y {
                return self.double();
            }
            return Jacobian::INFINITY;
        }
        let h = u2 - self.x;
        let r = s2 - self.y;
        let h2 = h.square();
        let h3 = h2 * h;
        let v = self.x * h2;
        let x3 = r.square() - h3 - v.double();
        let y3 = r * (v - x3) - self.y * h3;
        let z3 = self.z * h;
        Jacobian { x: x3, y: y3, z: z3 }
    }

    /// Convert a single point to affine with one inversion.
    pub fn to_affine(&self) -> Option<Affine> {
        if self.is_infinity() {
            return None;
        }
        let zinv = self.z.invert();
        let zinv2 = zinv.square();
        Some(Affine {
            x: self.x * zinv2,
            y: self.y * zinv2 * zinv,
        })
    }
}

/// Convert a batch of Jacobian points to affine with exactly one field
/// inversion (Montgomery's trick): accumulate prefix products of the Z
/// coordinates, invert the total once, then unwind multiplying back.
///
/// A slot with Z = 0 is skipped in the product chain and emitted as the
/// zero affine sentinel; such points cannot occur on a productive walk but
/// the branch keeps the routine total.
///
/// `scratch` must be at least as long as `points`; the worker reuses one
/// buffer across all batches so the steady state allocates nothing.
pub fn batch_normalize(points: &[Jacobian], out: &mut [Affine], scratch: &mut [FieldElement]) {
    let n = points.len();
    debug_assert!(out.len() >= n && scratch.len() >= n);

    let mut acc = FieldElement::ONE;
    for i in 0..n {
        if !points[i].z.is_zero() {
            acc = acc * points[i].z;
        }
        scratch[i] = acc;
    }

    let mut inv = acc.invert();
    for i in (0..n).rev() {
        let p = &points[i];
        if p.z.is_zero() {
            out[i] = Affine {
                x: FieldElement::ZERO,
                y: FieldElement::ZERO,
            };
            continue;
        }
        let zinv = if i == 0 { inv } else { inv * scratch[i - 1] };
        inv = inv * p.z;
        let zinv2 = zinv.square();
        out[i] = Affine {
            x: p.x * zinv2,
            y: p.y * zinv2 * zinv,
        };
    }
}

/// Allocating convenience wrapper, used by the table builder and tests.
pub fn batch_to_affine(points: &[Jacobian]) -> Vec<Affine> {
    let mut out = vec![
        Affine {
            x: FieldElement::ZERO,
            y: FieldElement::ZERO,
        };
        points.len()
    ];
    let mut scratch = vec![FieldElement::ZERO; points.len()];
    batch_normalize(points, &mut out, &mut scratch);
    out
}
