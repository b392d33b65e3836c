// Public-only BIP32 derivation library
// by LNP/BP Association (https://lnp-bp.org)
// Written in 2020-2023 by
//     Dr. Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the Apache-2.0 License
// along with this software.
// If not, see <https://opensource.org/licenses/Apache-2.0>.

use std::fmt::{self, Debug, Display, Formatter};

use bitcoin::hashes::hex::ToHex;
use secp256k1::{Scalar, Secp256k1, SecretKey, Verification};
use tracing::trace;

use crate::codec::{encode_u32_be, serialize_compressed, COMPRESSED_POINT_LEN};
use crate::digest::hmac_sha512;
use crate::{ChainCode, ExtendedKey, HARDENED_INDEX_BOUNDARY};

/// Errors during public child key derivation
#[derive(
    Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Error
)]
#[display(doc_comments)]
pub enum DeriveError {
    /// index {0} must be non-hardened; hardened derivation requires a
    /// private key
    HardenedIndexRejected(u32),

    /// invalid derived key: HMAC-SHA512 output is zero or not less than the
    /// curve order, or the child key is the point at infinity
    InvalidDerivedScalar,

    /// derivation exceeds the maximum depth of 255
    DepthOverflow,
}

/// Sum of the per-step derivation tweaks modulo the curve order.
///
/// Adding this value to the private key of the root gives the private key
/// matching the derived public key.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct TweakSum(Scalar);

impl Default for TweakSum {
    fn default() -> Self { TweakSum(Scalar::ZERO) }
}

impl TweakSum {
    /// Zero sum, as for the empty derivation path
    #[inline]
    pub fn zero() -> TweakSum { TweakSum::default() }

    /// Detects whether the sum is zero
    #[inline]
    pub fn is_zero(&self) -> bool { self.0 == Scalar::ZERO }

    /// Returns the sum as a scalar value
    #[inline]
    pub fn as_scalar(&self) -> &Scalar { &self.0 }

    /// Returns big-endian byte representation of the sum
    #[inline]
    pub fn to_be_bytes(&self) -> [u8; 32] { self.0.to_be_bytes() }

    /// Adds `tweak` to the sum modulo the curve order.
    #[must_use]
    pub fn add_tweak(self, tweak: &Scalar) -> TweakSum {
        match SecretKey::from_slice(&self.0.to_be_bytes()) {
            // only zero sum is not a valid secret key
            Err(_) => TweakSum(*tweak),
            Ok(sum) => sum
                .add_tweak(tweak)
                .map(Scalar::from)
                .map(TweakSum)
                .unwrap_or_default(),
        }
    }

    /// Computes child private key from the root private key. Returns `None`
    /// if the resulting key is zero.
    pub fn apply_to_secret(&self, secret: &SecretKey) -> Option<SecretKey> {
        secret.add_tweak(&self.0).ok()
    }
}

impl Debug for TweakSum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TweakSum({})", self.to_be_bytes().to_hex())
    }
}

impl Display for TweakSum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.to_be_bytes().to_hex()) }
}

/// Interprets `IL` as a tweak scalar; zero and values not less than the
/// curve order are rejected.
fn tweak(il: [u8; 32]) -> Result<Scalar, DeriveError> {
    if il == [0u8; 32] {
        return Err(DeriveError::InvalidDerivedScalar);
    }
    Scalar::from_be_bytes(il).map_err(|_| DeriveError::InvalidDerivedScalar)
}

/// Public parent key -> public child key derivation for a single unhardened
/// index.
///
/// Returns the child key together with the scalar `IL`, such that the child
/// public key is `parent + IL·G`.
pub fn derive_child<C: Verification>(
    secp: &Secp256k1<C>,
    parent: &ExtendedKey,
    index: u32,
) -> Result<(ExtendedKey, Scalar), DeriveError> {
    if index >= HARDENED_INDEX_BOUNDARY {
        return Err(DeriveError::HardenedIndexRejected(index));
    }
    let depth = parent.depth().checked_add(1).ok_or(DeriveError::DepthOverflow)?;

    let mut data = [0u8; COMPRESSED_POINT_LEN + 4];
    data[..COMPRESSED_POINT_LEN].copy_from_slice(&serialize_compressed(&parent.public_key()));
    data[COMPRESSED_POINT_LEN..].copy_from_slice(&encode_u32_be(index));

    let hmac = hmac_sha512(parent.chain_code().as_bytes(), &data);
    let mut il = [0u8; 32];
    let mut ir = [0u8; 32];
    il.copy_from_slice(&hmac[..32]);
    ir.copy_from_slice(&hmac[32..]);

    let tweak = tweak(il)?;
    let public_key = parent
        .public_key()
        .add_exp_tweak(secp, &tweak)
        .map_err(|_| DeriveError::InvalidDerivedScalar)?;

    trace!(depth, index, "derived public child key");
    Ok((ExtendedKey::child_of(parent, depth, index, ChainCode::from(ir), public_key), tweak))
}

/// Derives a key by applying [`derive_child`] for each of the `indexes` in
/// their order, starting from `root`.
///
/// Returns the final key and the sum of all derivation tweaks. The first
/// failing step aborts the whole derivation.
pub fn derive_chained<C: Verification>(
    secp: &Secp256k1<C>,
    indexes: impl IntoIterator<Item = u32>,
    root: &ExtendedKey,
) -> Result<(ExtendedKey, TweakSum), DeriveError> {
    indexes
        .into_iter()
        .try_fold((*root, TweakSum::zero()), |(key, sum), index| {
            let (child, tweak) = derive_child(secp, &key, index)?;
            Ok((child, sum.add_tweak(&tweak)))
        })
}

impl ExtendedKey {
    /// Derives public child key at the given unhardened index
    #[inline]
    pub fn derive_child<C: Verification>(
        &self,
        secp: &Secp256k1<C>,
        index: u32,
    ) -> Result<ExtendedKey, DeriveError> {
        derive_child(secp, self, index).map(|(child, _)| child)
    }

    /// Derives public key following a sequence of unhardened indexes
    #[inline]
    pub fn derive_path<C: Verification>(
        &self,
        secp: &Secp256k1<C>,
        indexes: impl IntoIterator<Item = u32>,
    ) -> Result<ExtendedKey, DeriveError> {
        derive_chained(secp, indexes, self).map(|(child, _)| child)
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use bitcoin::util::bip32::{ChildNumber, ExtendedPubKey};
    use secp256k1::constants::CURVE_ORDER;
    use secp256k1::{PublicKey, SECP256K1};

    use super::*;
    use crate::KeyVersion;

    // BIP32 test vector 1: m/0h, m/0h/1, m/0h/1/2h, m/0h/1/2h/2
    const XPUBS: [&str; 4] = [
        "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw",
        "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ",
        "xpub6D4BDPcP2GT577Vvch3R8wDkScZWzQzMMUm3PWbmWvVJrZwQY4VUNgqFJPMM3No2dFDFGTsxxpG5uJh7n7epu4trkrX7x7DogT5Uv6fcLW5",
        "xpub6FHa3pjLCk84BayeJxFW2SP4XRrFd1JYnxeLeU8EqN3vDfZmbqBqaGJAyiLjTAwm6ZLRQUMv1ZACTj37sR62cfN7fe5JnJ7dh8zL4fiyLHV",
    ];

    fn root() -> (SecretKey, ExtendedKey) {
        let secret = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let public_key = PublicKey::from_secret_key(SECP256K1, &secret);
        let chain_code = ChainCode::from([0x42; 32]);
        (secret, ExtendedKey::root(public_key, chain_code))
    }

    #[test]
    fn bip32_vector_unhardened_steps() {
        let parent = ExtendedKey::from_str(XPUBS[0]).unwrap();
        let child = parent.derive_child(SECP256K1, 1).unwrap();
        assert_eq!(child.to_string(), XPUBS[1]);

        let parent = ExtendedKey::from_str(XPUBS[2]).unwrap();
        let child = parent.derive_child(SECP256K1, 2).unwrap();
        assert_eq!(child.to_string(), XPUBS[3]);
        assert_eq!(child.version(), KeyVersion::XPUB);
    }

    #[test]
    fn matches_rust_bitcoin() {
        let path = [0u32, 1, 2, 2_000_000_000, 7];
        for s in XPUBS {
            let xkey = ExtendedKey::from_str(s).unwrap();
            let xpub = ExtendedPubKey::from_str(s).unwrap();
            let derived = xkey.derive_path(SECP256K1, path).unwrap();
            let children = path
                .iter()
                .map(|index| ChildNumber::Normal { index: *index })
                .collect::<Vec<_>>();
            let expected = xpub.derive_pub(SECP256K1, &children).unwrap();
            assert_eq!(derived.to_string(), expected.to_string());
            assert_eq!(derived.public_key(), expected.public_key);
        }
    }

    #[test]
    fn child_metadata() {
        let (_, root) = root();
        let (child, _) = derive_child(SECP256K1, &root, 5).unwrap();
        assert_eq!(child.depth(), 1);
        assert_eq!(child.child_index(), 5);
        assert_eq!(child.parent_fingerprint(), root.fingerprint());
        assert_eq!(child.version(), root.version());
        assert_ne!(child.chain_code(), root.chain_code());
        assert_ne!(child.public_key(), root.public_key());
    }

    #[test]
    fn depth_follows_path_length() {
        let (_, root) = root();
        for len in 0..8u32 {
            let (key, _) = derive_chained(SECP256K1, 0..len, &root).unwrap();
            assert_eq!(key.depth() as u32, len);
        }
        let (key, sum) = derive_chained(SECP256K1, Vec::new(), &root).unwrap();
        assert_eq!(key, root);
        assert!(sum.is_zero());
    }

    #[test]
    fn hardened_rejected() {
        let (_, root) = root();
        assert_eq!(
            derive_child(SECP256K1, &root, HARDENED_INDEX_BOUNDARY).map(|(key, _)| key),
            Err(DeriveError::HardenedIndexRejected(0x8000_0000))
        );
        assert_eq!(
            root.derive_child(SECP256K1, u32::MAX),
            Err(DeriveError::HardenedIndexRejected(u32::MAX))
        );
        assert!(derive_child(SECP256K1, &root, HARDENED_INDEX_BOUNDARY - 1).is_ok());
        assert_eq!(
            derive_chained(SECP256K1, [44, 0x8000_002C, 0], &root),
            Err(DeriveError::HardenedIndexRejected(0x8000_002C))
        );
    }

    #[test]
    fn chain_consistency() {
        let (_, root) = root();
        let (step1, tweak1) = derive_child(SECP256K1, &root, 3).unwrap();
        let (step2, tweak2) = derive_child(SECP256K1, &step1, 9).unwrap();
        let (chained, sum) = derive_chained(SECP256K1, [3, 9], &root).unwrap();
        assert_eq!(chained, step2);
        assert_eq!(sum, TweakSum::zero().add_tweak(&tweak1).add_tweak(&tweak2));
    }

    #[test]
    fn order_matters() {
        let (_, root) = root();
        let forward = root.derive_path(SECP256K1, [1, 2]).unwrap();
        let backward = root.derive_path(SECP256K1, [2, 1]).unwrap();
        assert_ne!(forward.public_key(), backward.public_key());
    }

    #[test]
    fn tweak_sum_gives_child_secret() {
        let (secret, root) = root();
        let (child, sum) = derive_chained(SECP256K1, [44, 60, 0, 0, 0], &root).unwrap();
        let child_secret = sum.apply_to_secret(&secret).unwrap();
        assert_eq!(PublicKey::from_secret_key(SECP256K1, &child_secret), child.public_key());
    }

    #[test]
    fn tweak_sum_wraps_modulo_order() {
        let one = Scalar::from_be_bytes({
            let mut bytes = [0u8; 32];
            bytes[31] = 1;
            bytes
        })
        .unwrap();
        // n - 1
        let minus_one = Scalar::from(SecretKey::from_slice(&one.to_be_bytes()).unwrap().negate());
        assert!(TweakSum::zero().add_tweak(&one).add_tweak(&minus_one).is_zero());
        assert_eq!(TweakSum::zero().add_tweak(&one).add_tweak(&one).to_be_bytes()[31], 2);
        assert_eq!(TweakSum::zero().add_tweak(&Scalar::ZERO), TweakSum::zero());
    }

    #[test]
    fn tweak_range() {
        let il = |bytes| tweak(bytes).map(|scalar| scalar.to_be_bytes());
        let mut below_order = CURVE_ORDER;
        below_order[31] -= 1;
        assert_eq!(il([0u8; 32]), Err(DeriveError::InvalidDerivedScalar));
        assert_eq!(il(CURVE_ORDER), Err(DeriveError::InvalidDerivedScalar));
        assert_eq!(il([0xFF; 32]), Err(DeriveError::InvalidDerivedScalar));
        assert_eq!(il(below_order), Ok(below_order));
        assert_eq!(il([0x01; 32]), Ok([0x01; 32]));
    }

    #[test]
    fn tweak_sum_formatting() {
        let mut bytes = [0u8; 32];
        bytes[31] = 0x2a;
        let sum = TweakSum::zero().add_tweak(&Scalar::from_be_bytes(bytes).unwrap());
        let hex = format!("{}2a", "00".repeat(31));
        assert_eq!(sum.to_string(), hex);
        assert_eq!(format!("{:?}", sum), format!("TweakSum({})", hex));
    }

    #[test]
    fn deterministic() {
        let (_, root) = root();
        let a = derive_chained(SECP256K1, [0, 1, 2], &root).unwrap();
        let b = derive_chained(SECP256K1, [0, 1, 2], &root).unwrap();
        assert_eq!(a, b);
    }
}
