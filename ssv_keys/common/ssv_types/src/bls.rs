use crate::util::strip_hex_prefix;
use bls12_381_plus::{G1Affine, G1Projective, Scalar};
use ff::Field;
use group::{Curve, Group};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// phase0.PublicKeyLength
pub const PUBLIC_KEY_LENGTH: usize = 48;
// Length of a serialized secret key
pub const SECRET_KEY_LENGTH: usize = 32;

/// A compressed BLS12-381 G1 public key, as used for validators and their shares.
///
/// Construction always goes through point decompression, so holding a value means the key is on
/// the curve, in the prime order subgroup and not the point at infinity.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BlsPublicKey(G1Affine);

impl BlsPublicKey {
    /// Deserialize a compressed point
    pub fn deserialize(bytes: &[u8]) -> Result<Self, String> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            format!(
                "Invalid public key length: expected {}, got {}",
                PUBLIC_KEY_LENGTH,
                bytes.len()
            )
        })?;
        let point = Option::<G1Affine>::from(G1Affine::from_compressed(&bytes))
            .ok_or_else(|| "Public key is not a valid curve point".to_string())?;
        Self::from_point(point)
    }

    pub(crate) fn from_point(point: G1Affine) -> Result<Self, String> {
        if bool::from(point.is_identity()) {
            return Err("Public key is the point at infinity".to_string());
        }
        Ok(Self(point))
    }

    /// Build a public key from a projective point, rejecting the identity
    pub fn from_projective(point: &G1Projective) -> Result<Self, String> {
        Self::from_point(point.to_affine())
    }

    pub fn serialize(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_compressed()
    }

    pub fn point(&self) -> G1Affine {
        self.0
    }

    /// 0x prefixed hex form used in documents and payloads
    pub fn as_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.serialize()))
    }
}

impl FromStr for BlsPublicKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s))
            .map_err(|e| format!("Public key is not valid hex: {}", e))?;
        Self::deserialize(&bytes)
    }
}

impl Display for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex_string())
    }
}

impl Debug for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsPublicKey({})", self.as_hex_string())
    }
}

/// A BLS12-381 secret scalar stored as 32 big-endian bytes.
///
/// The bytes are wiped when the key is dropped. The value is always canonical and non-zero.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_LENGTH]);

impl SecretKey {
    /// Deserialize a big-endian secret scalar
    pub fn deserialize(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(format!(
                "Invalid secret key length: expected {}, got {}",
                SECRET_KEY_LENGTH,
                bytes.len()
            ));
        }

        let mut le = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        le.copy_from_slice(bytes);
        le.reverse();
        let scalar = Option::<Scalar>::from(Scalar::from_le_bytes(&le))
            .ok_or_else(|| "Secret key is not a canonical scalar".to_string())?;
        Self::from_scalar(&scalar)
    }

    /// Wrap a scalar, rejecting zero
    pub fn from_scalar(scalar: &Scalar) -> Result<Self, String> {
        if bool::from(scalar.is_zero()) {
            return Err("Secret key is zero".to_string());
        }
        let mut bytes = scalar.to_le_bytes();
        bytes.reverse();
        Ok(Self(bytes))
    }

    pub fn to_scalar(&self) -> Scalar {
        // Canonical by construction, so the wide reduction is the identity
        let mut wide = Zeroizing::new([0u8; 64]);
        wide[..SECRET_KEY_LENGTH].copy_from_slice(&self.0);
        wide[..SECRET_KEY_LENGTH].reverse();
        Scalar::from_bytes_wide(&wide)
    }

    pub fn public_key(&self) -> BlsPublicKey {
        // Non-zero scalars never map to the identity in a prime order group
        BlsPublicKey((G1Projective::generator() * self.to_scalar()).to_affine())
    }

    pub fn serialize(&self) -> &[u8; SECRET_KEY_LENGTH] {
        &self.0
    }

    /// 0x prefixed hex form of the big-endian bytes
    pub fn to_hex_string(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.0)))
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Key material of a single validator, recovered from its keystore.
///
/// Owned by exactly one build operation and never serialized. The secret is wiped on drop.
pub struct ValidatorKeyMaterial {
    secret: SecretKey,
    public_key: BlsPublicKey,
}

impl ValidatorKeyMaterial {
    pub fn new(secret: SecretKey) -> Self {
        let public_key = secret.public_key();
        Self { secret, public_key }
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> &BlsPublicKey {
        &self.public_key
    }
}

impl Debug for ValidatorKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorKeyMaterial")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
