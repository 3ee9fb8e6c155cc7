//! Arithmetic in the scalar field of secp256k1
//!
//! Every [`Scalar`] is kept in canonical form `0 <= s < q`, where `q` is the
//! order of the prime subgroup. Each operation returns a freshly reduced
//! value, so scalars can be hashed into transcripts or written to the wire
//! with a fixed width without any further normalisation.

use crate::{Error, Result};
use k256::elliptic_curve::ff::PrimeField;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops;
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// Width of the canonical scalar encoding in bytes
pub const SCALAR_BYTES: usize = 32;

/// Width of the input accepted by [`Scalar::from_wide_bytes`]
pub const WIDE_SCALAR_BYTES: usize = 64;

/// Element of `Z_q`
#[derive(Clone, Copy, Default)]
pub struct Scalar(k256::Scalar);

impl Scalar {
    /// The additive identity
    pub fn zero() -> Self {
        Self(k256::Scalar::ZERO)
    }

    /// The multiplicative identity
    pub fn one() -> Self {
        Self(k256::Scalar::ONE)
    }

    /// Embed an unsigned integer. Values below `q` need no reduction.
    pub fn from_u64(n: u64) -> Self {
        Self(k256::Scalar::from(n))
    }

    /// Embed a signed integer, reducing negative values mod `q`
    pub fn from_i64(n: i64) -> Self {
        let magnitude = Self::from_u64(n.unsigned_abs());
        if n < 0 {
            magnitude.negate()
        } else {
            magnitude
        }
    }

    /// Sample a uniform scalar in `[0, q)` by rejection sampling
    ///
    /// 32 bytes are drawn from `rng` and interpreted as a big-endian integer;
    /// draws at or above `q` are discarded and redrawn.
    pub fn random<R: CryptoRngCore + ?Sized>(rng: &mut R) -> Self {
        loop {
            let mut repr = k256::FieldBytes::default();
            rng.fill_bytes(repr.as_mut_slice());
            if let Some(s) = Option::<k256::Scalar>::from(k256::Scalar::from_repr(repr)) {
                return Self(s);
            }
        }
    }

    /// Reduce a 512-bit big-endian integer mod `q`
    ///
    /// Used to map hash output onto the field with negligible bias.
    pub fn from_wide_bytes(bytes: &[u8; WIDE_SCALAR_BYTES]) -> Self {
        // 2^64 mod q, built without leaving the field
        let radix = Self::from_u64(u64::MAX).add(&Self::one());

        bytes.chunks_exact(8).fold(Self::zero(), |acc, chunk| {
            let mut limb = [0u8; 8];
            limb.copy_from_slice(chunk);
            Self::multiply_add(&acc, &radix, &Self::from_u64(u64::from_be_bytes(limb)))
        })
    }

    /// `self + other mod q`
    pub fn add(&self, other: &Self) -> Self {
        Self(self.0 + other.0)
    }

    /// `self - other mod q`
    pub fn subtract(&self, other: &Self) -> Self {
        Self(self.0 - other.0)
    }

    /// `-self mod q`
    pub fn negate(&self) -> Self {
        Self(-self.0)
    }

    /// `self * other mod q`
    pub fn multiply(&self, other: &Self) -> Self {
        Self(self.0 * other.0)
    }

    /// `x * y + z mod q`
    pub fn multiply_add(x: &Self, y: &Self, z: &Self) -> Self {
        Self(x.0 * y.0 + z.0)
    }

    /// Modular inverse
    ///
    /// # Panics
    ///
    /// Panics if `self` is zero. Callers must rule this out by construction.
    pub fn invert(&self) -> Self {
        match self.try_invert() {
            Some(inverse) => inverse,
            None => panic!("attempted to invert the zero scalar"),
        }
    }

    /// Modular inverse, or `None` for zero
    pub fn try_invert(&self) -> Option<Self> {
        Option::<k256::Scalar>::from(self.0.invert()).map(Self)
    }

    /// Whether this is the additive identity
    pub fn is_zero(&self) -> bool {
        bool::from(self.0.is_zero())
    }

    /// Fixed-width little-endian encoding
    pub fn to_bytes(&self) -> [u8; SCALAR_BYTES] {
        let mut out = [0u8; SCALAR_BYTES];
        out.copy_from_slice(self.0.to_bytes().as_slice());
        out.reverse();
        out
    }

    /// Decode a little-endian encoding, rejecting values `>= q`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut be: [u8; SCALAR_BYTES] = bytes.try_into().map_err(|_| {
            Error::Deserialization(format!(
                "scalar must be {} bytes, got {}",
                SCALAR_BYTES,
                bytes.len()
            ))
        })?;
        be.reverse();
        let decoded = k256::Scalar::from_repr(be.into());
        Option::<k256::Scalar>::from(decoded)
            .map(Self)
            .ok_or_else(|| Error::Deserialization("non-canonical scalar encoding".into()))
    }

    pub(crate) fn as_inner(&self) -> &k256::Scalar {
        &self.0
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for Scalar {}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Scalar([redacted])")
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0 = k256::Scalar::ZERO;
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        Self::from_u64(n)
    }
}

impl ops::Add for Scalar {
    type Output = Scalar;

    fn add(self, rhs: Scalar) -> Scalar {
        Scalar::add(&self, &rhs)
    }
}

impl ops::Sub for Scalar {
    type Output = Scalar;

    fn sub(self, rhs: Scalar) -> Scalar {
        self.subtract(&rhs)
    }
}

impl ops::Mul for Scalar {
    type Output = Scalar;

    fn mul(self, rhs: Scalar) -> Scalar {
        self.multiply(&rhs)
    }
}

impl ops::Neg for Scalar {
    type Output = Scalar;

    fn neg(self) -> Scalar {
        self.negate()
    }
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        Scalar::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    // q, big-endian
    const ORDER: [u8; 32] = [
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
        0x41, 0x41,
    ];

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::from_seed([7u8; 32])
    }

    #[test]
    fn test_inverse_of_nonzero() {
        let mut rng = rng();
        for _ in 0..32 {
            let a = Scalar::random(&mut rng);
            assert_eq!(a.invert().multiply(&a), Scalar::one());
        }
        assert_eq!(Scalar::from_u64(1).invert(), Scalar::one());
    }

    #[test]
    #[should_panic(expected = "zero scalar")]
    fn test_invert_zero_panics() {
        Scalar::zero().invert();
    }

    #[test]
    fn test_try_invert_zero() {
        assert!(Scalar::zero().try_invert().is_none());
    }

    #[test]
    fn test_multiply_add_matches_separate_ops() {
        let mut rng = rng();
        for _ in 0..32 {
            let a = Scalar::random(&mut rng);
            let b = Scalar::random(&mut rng);
            let c = Scalar::random(&mut rng);
            assert_eq!(Scalar::multiply_add(&a, &b, &c), a.multiply(&b).add(&c));
        }
    }

    #[test]
    fn test_negation() {
        let mut rng = rng();
        for _ in 0..32 {
            let a = Scalar::random(&mut rng);
            assert!(a.add(&a.negate()).is_zero());
            assert_eq!(a - a, Scalar::zero());
        }
        assert_eq!(Scalar::zero().negate(), Scalar::zero());
    }

    #[test]
    fn test_from_i64_reduces_negatives() {
        assert_eq!(Scalar::from_i64(-1).add(&Scalar::one()), Scalar::zero());
        assert_eq!(Scalar::from_i64(-5) + Scalar::from_u64(7), Scalar::from_u64(2));
        assert_eq!(Scalar::from_i64(i64::MIN).negate(), Scalar::from_u64(1 << 63));
    }

    #[test]
    fn test_canonical_bytes_round_trip() {
        let mut rng = rng();
        for _ in 0..32 {
            let a = Scalar::random(&mut rng);
            let bytes = a.to_bytes();
            assert_eq!(bytes.len(), SCALAR_BYTES);
            assert_eq!(Scalar::from_bytes(&bytes).unwrap(), a);
        }
    }

    #[test]
    fn test_encoding_is_little_endian_and_fixed_width() {
        let bytes = Scalar::from_u64(0x0102).to_bytes();
        assert_eq!(bytes[0], 0x02);
        assert_eq!(bytes[1], 0x01);
        assert!(bytes[2..].iter().all(|b| *b == 0));
        assert_eq!(Scalar::zero().to_bytes(), [0u8; SCALAR_BYTES]);
    }

    #[test]
    fn test_rejects_non_canonical_bytes() {
        let mut q_le = ORDER;
        q_le.reverse();
        assert!(Scalar::from_bytes(&q_le).is_err());
        assert!(Scalar::from_bytes(&[0xFF; SCALAR_BYTES]).is_err());
        assert!(Scalar::from_bytes(&[0u8; 31]).is_err());

        // q - 1 is the largest canonical value
        q_le[0] -= 1;
        assert_eq!(Scalar::from_bytes(&q_le).unwrap(), Scalar::from_i64(-1));
    }

    #[test]
    fn test_from_wide_bytes_reduces() {
        let mut wide = [0u8; WIDE_SCALAR_BYTES];
        wide[63] = 5;
        assert_eq!(Scalar::from_wide_bytes(&wide), Scalar::from_u64(5));

        let mut wide = [0u8; WIDE_SCALAR_BYTES];
        wide[32..].copy_from_slice(&ORDER);
        assert!(Scalar::from_wide_bytes(&wide).is_zero());

        // q * 2^256 + 3
        let mut wide = [0u8; WIDE_SCALAR_BYTES];
        wide[..32].copy_from_slice(&ORDER);
        wide[63] = 3;
        assert_eq!(Scalar::from_wide_bytes(&wide), Scalar::from_u64(3));
    }

    #[test]
    fn test_random_scalars_differ() {
        let mut rng = rng();
        let a = Scalar::random(&mut rng);
        let b = Scalar::random(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_serde_round_trip() {
        let a = Scalar::random(&mut rng());
        let json = serde_json::to_vec(&a).unwrap();
        let back: Scalar = serde_json::from_slice(&json).unwrap();
        assert_eq!(a, back);
    }
}
