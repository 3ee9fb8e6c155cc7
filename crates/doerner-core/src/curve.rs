//! Group elements and the group descriptor

use crate::{Error, Result, Scalar};
use k256::{
    elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint},
    AffinePoint, ProjectivePoint,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use subtle::{Choice, ConditionallySelectable};

/// Length of a compressed SEC1 point
pub const COMPRESSED_POINT_BYTES: usize = 33;

/// Elliptic curve groups the protocol can run over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Group {
    /// secp256k1, as used by Bitcoin and Ethereum
    Secp256k1,
}

impl Group {
    /// Canonical name, as absorbed into session transcripts
    pub fn name(&self) -> &'static str {
        match self {
            Group::Secp256k1 => "secp256k1",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Group {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "secp256k1" | "k256" => Ok(Group::Secp256k1),
            other => Err(Error::Setup(format!("unsupported group: {}", other))),
        }
    }
}

/// Element of the curve group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point(ProjectivePoint);

impl Point {
    /// The neutral element
    pub fn identity() -> Self {
        Self(ProjectivePoint::IDENTITY)
    }

    /// The standard generator `G`
    pub fn generator() -> Self {
        Self(ProjectivePoint::GENERATOR)
    }

    /// `s * G`
    pub fn act_on_base(s: &Scalar) -> Self {
        Self(ProjectivePoint::GENERATOR * s.as_inner())
    }

    /// `self + other`
    pub fn add(&self, other: &Point) -> Self {
        Self(self.0 + other.0)
    }

    /// `self - other`
    pub fn subtract(&self, other: &Point) -> Self {
        Self(self.0 - other.0)
    }

    /// `s * self`
    pub fn scale(&self, s: &Scalar) -> Self {
        Self(self.0 * s.as_inner())
    }

    /// `a` if `choice` is unset, `b` otherwise, in constant time
    pub(crate) fn select(a: &Point, b: &Point, choice: Choice) -> Self {
        Self(ProjectivePoint::conditional_select(&a.0, &b.0, choice))
    }

    /// Whether this is the neutral element
    pub fn is_identity(&self) -> bool {
        self.0 == ProjectivePoint::IDENTITY
    }

    /// The group this point belongs to
    pub fn group(&self) -> Group {
        Group::Secp256k1
    }

    /// Compressed SEC1 encoding (a single zero byte for the identity)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_affine().to_encoded_point(true).as_bytes().to_vec()
    }

    /// Decode the encoding produced by [`Point::to_bytes`]
    ///
    /// Points not on the curve and any other SEC1 form (uncompressed, hybrid)
    /// are rejected, so every point has exactly one accepted encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let encoded = k256::EncodedPoint::from_bytes(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))?;
        let affine_opt = AffinePoint::from_encoded_point(&encoded);
        let affine: AffinePoint = Option::<AffinePoint>::from(affine_opt)
            .ok_or_else(|| Error::Deserialization("point is not on the curve".into()))?;
        let point = Self(ProjectivePoint::from(affine));
        if point.to_bytes() != bytes {
            return Err(Error::Deserialization("non-canonical point encoding".into()));
        }
        Ok(point)
    }

    #[cfg(test)]
    pub(crate) fn to_uncompressed_bytes(&self) -> Vec<u8> {
        self.0.to_affine().to_encoded_point(false).as_bytes().to_vec()
    }
}

impl Serialize for Point {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        Point::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}
