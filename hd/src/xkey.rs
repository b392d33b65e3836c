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

use std::fmt::{self, Debug, Display, Formatter, LowerHex};
use std::str::FromStr;

use bitcoin::hashes::hex::{self, FromHex, ToHex};
use secp256k1::PublicKey;
#[cfg(feature = "serde")]
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::codec::{
    check_decode, check_encode, decode_point, encode_u32_be, serialize_compressed, CodecError,
    EXTENDED_KEY_LEN,
};
use crate::digest::hash160;

/// Magical version bytes for xpub: bitcoin mainnet public key
pub const VERSION_MAGIC_XPUB: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];
/// Magical version bytes for tpub: bitcoin testnet/regtest public key
pub const VERSION_MAGIC_TPUB: [u8; 4] = [0x04, 0x35, 0x87, 0xCF];

/// Structure holding 4 version bytes of an extended key. Version stores raw
/// bytes without their check or interpretation; it is copied unchanged from
/// a parent key to all of its descendants.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, From)]
pub struct KeyVersion(#[from] [u8; 4]);

impl KeyVersion {
    /// Version of the mainnet `xpub` keys
    pub const XPUB: KeyVersion = KeyVersion(VERSION_MAGIC_XPUB);

    /// Version of the testnet `tpub` keys
    pub const TPUB: KeyVersion = KeyVersion(VERSION_MAGIC_TPUB);

    /// Constructs [`KeyVersion`] from a fixed 4 bytes values
    pub const fn from_bytes(version_bytes: [u8; 4]) -> KeyVersion { KeyVersion(version_bytes) }

    /// Returns internal representation of version bytes
    pub const fn as_bytes(&self) -> &[u8; 4] { &self.0 }

    /// Converts into 4-byte array containing version byte values
    pub const fn to_bytes(self) -> [u8; 4] { self.0 }

    /// Detects network for the two well-known public key versions; returns
    /// `None` for any other version bytes.
    pub fn network_name(&self) -> Option<&'static str> {
        match self.0 {
            VERSION_MAGIC_XPUB => Some("mainnet"),
            VERSION_MAGIC_TPUB => Some("testnet"),
            _ => None,
        }
    }
}

impl Debug for KeyVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "KeyVersion({})", self.0.to_hex())
    }
}

impl Display for KeyVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.0.to_hex()) }
}

/// Key fingerprint: first four bytes of `hash160` of the compressed public
/// key.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, From)]
pub struct Fingerprint(#[from] [u8; 4]);

impl Fingerprint {
    /// Computes fingerprint of the given public key
    pub fn with(key: &PublicKey) -> Fingerprint {
        let mut fingerprint = [0u8; 4];
        fingerprint.copy_from_slice(&hash160(&serialize_compressed(key))[..4]);
        Fingerprint(fingerprint)
    }

    /// Returns internal byte representation
    pub const fn as_bytes(&self) -> &[u8; 4] { &self.0 }

    /// Converts into 4-byte array
    pub const fn to_bytes(self) -> [u8; 4] { self.0 }
}

impl Debug for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0.to_hex())
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.0.to_hex()) }
}

/// Chain code: 32 bytes of entropy combined with a child index to derive
/// child keys
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
pub struct ChainCode(#[from] [u8; 32]);

impl ChainCode {
    /// Constructs chain code from a byte slice; returns `None` if the slice
    /// length is not equal to 32.
    pub fn from_slice(slice: impl AsRef<[u8]>) -> Option<ChainCode> {
        if slice.as_ref().len() != 32 {
            return None;
        }
        let mut inner = [0u8; 32];
        inner.copy_from_slice(slice.as_ref());
        Some(Self(inner))
    }

    /// Returns internal byte representation
    pub const fn as_bytes(&self) -> &[u8; 32] { &self.0 }

    /// Converts into 32-byte array
    pub const fn to_bytes(self) -> [u8; 32] { self.0 }
}

impl Debug for ChainCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ChainCode({})", self.0.to_hex())
    }
}

impl Display for ChainCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { LowerHex::fmt(self, f) }
}

impl LowerHex for ChainCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}..{}", self.0[..4].to_hex(), self.0[28..].to_hex())
        } else {
            f.write_str(&self.0.to_hex())
        }
    }
}

impl FromStr for ChainCode {
    type Err = hex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vec = Vec::<u8>::from_hex(s)?;
        ChainCode::from_slice(&vec).ok_or(hex::Error::InvalidLength(32, vec.len()))
    }
}

/// Extended public key: secp256k1 public key with the metadata required for
/// BIP32 child key derivation.
///
/// The type is an immutable value. Root keys are constructed with
/// [`ExtendedKey::root`]; all other keys are produced by derivation or
/// parsed from their Base58 representation.
#[cfg_attr(feature = "serde", derive(SerializeDisplay, DeserializeFromStr))]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ExtendedKey {
    version: KeyVersion,
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_index: u32,
    chain_code: ChainCode,
    public_key: PublicKey,
}

impl ExtendedKey {
    /// Constructs synthetic root key with zero depth, child index, parent
    /// fingerprint and version bytes.
    #[inline]
    pub fn root(public_key: PublicKey, chain_code: ChainCode) -> ExtendedKey {
        ExtendedKey::root_with_version(public_key, chain_code, KeyVersion::default())
    }

    /// Constructs root key with zero depth, child index and parent
    /// fingerprint using the given version bytes.
    pub fn root_with_version(
        public_key: PublicKey,
        chain_code: ChainCode,
        version: KeyVersion,
    ) -> ExtendedKey {
        ExtendedKey {
            version,
            depth: 0,
            parent_fingerprint: Fingerprint::default(),
            child_index: 0,
            chain_code,
            public_key,
        }
    }

    pub(crate) fn child_of(
        parent: &ExtendedKey,
        depth: u8,
        child_index: u32,
        chain_code: ChainCode,
        public_key: PublicKey,
    ) -> ExtendedKey {
        ExtendedKey {
            version: parent.version,
            depth,
            parent_fingerprint: parent.fingerprint(),
            child_index,
            chain_code,
            public_key,
        }
    }

    /// Version bytes
    #[inline]
    pub fn version(&self) -> KeyVersion { self.version }

    /// Number of derivation steps from the root
    #[inline]
    pub fn depth(&self) -> u8 { self.depth }

    /// Fingerprint of the parent key; zero for the root
    #[inline]
    pub fn parent_fingerprint(&self) -> Fingerprint { self.parent_fingerprint }

    /// Index used to derive this key from its parent; zero for the root
    #[inline]
    pub fn child_index(&self) -> u32 { self.child_index }

    /// Chain code
    #[inline]
    pub fn chain_code(&self) -> ChainCode { self.chain_code }

    /// Public key
    #[inline]
    pub fn public_key(&self) -> PublicKey { self.public_key }

    /// Fingerprint of this key
    #[inline]
    pub fn fingerprint(&self) -> Fingerprint { Fingerprint::with(&self.public_key) }

    /// Full `hash160` identifier of this key
    #[inline]
    pub fn identifier(&self) -> [u8; 20] { hash160(&serialize_compressed(&self.public_key)) }

    /// Encodes key into 78-byte BIP32 serialization:
    /// `version || depth || parent fingerprint || child index || chain code ||
    /// compressed public key`.
    pub fn encode(&self) -> [u8; EXTENDED_KEY_LEN] {
        let mut data = [0u8; EXTENDED_KEY_LEN];
        data[0..4].copy_from_slice(self.version.as_bytes());
        data[4] = self.depth;
        data[5..9].copy_from_slice(self.parent_fingerprint.as_bytes());
        data[9..13].copy_from_slice(&encode_u32_be(self.child_index));
        data[13..45].copy_from_slice(self.chain_code.as_bytes());
        data[45..78].copy_from_slice(&serialize_compressed(&self.public_key));
        data
    }

    /// Decodes key from 78-byte BIP32 serialization. Version bytes are
    /// not checked.
    pub fn decode(data: &[u8]) -> Result<ExtendedKey, CodecError> {
        if data.len() != EXTENDED_KEY_LEN {
            return Err(CodecError::WrongLength(data.len()));
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&data[0..4]);
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&data[5..9]);
        let mut child_index = [0u8; 4];
        child_index.copy_from_slice(&data[9..13]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);
        Ok(ExtendedKey {
            version: KeyVersion(version),
            depth: data[4],
            parent_fingerprint: Fingerprint(parent_fingerprint),
            child_index: u32::from_be_bytes(child_index),
            chain_code: ChainCode(chain_code),
            public_key: decode_point(&data[45..])?,
        })
    }

    /// Encodes key with Base58Check
    #[inline]
    pub fn to_base58(&self) -> String { check_encode(&self.encode()) }

    /// Decodes key from Base58Check string
    pub fn from_base58(s: &str) -> Result<ExtendedKey, CodecError> {
        ExtendedKey::decode(&check_decode(s)?)
    }
}

impl Display for ExtendedKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.to_base58()) }
}

impl FromStr for ExtendedKey {
    type Err = CodecError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> { ExtendedKey::from_base58(s) }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use bitcoin::util::bip32::ExtendedPubKey;

    use super::*;

    // BIP32 test vector 1: m, m/0h, m/0h/1
    const XPUBS: [&str; 3] = [
        "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8",
        "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw",
        "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ",
    ];

    #[test]
    fn xpub_roundtrip() {
        for s in XPUBS {
            let xkey = ExtendedKey::from_str(s).unwrap();
            assert_eq!(xkey.to_string(), s);
            assert_eq!(xkey.version(), KeyVersion::XPUB);
            assert_eq!(xkey.version().network_name(), Some("mainnet"));
        }
    }

    #[test]
    fn matches_rust_bitcoin() {
        for s in XPUBS {
            let xkey = ExtendedKey::from_str(s).unwrap();
            let xpub = ExtendedPubKey::from_str(s).unwrap();
            assert_eq!(xkey.encode(), xpub.encode());
            assert_eq!(xkey.depth(), xpub.depth);
            assert_eq!(xkey.public_key(), xpub.public_key);
            assert_eq!(&xkey.chain_code().as_bytes()[..], &xpub.chain_code[..]);
            assert_eq!(&xkey.parent_fingerprint().as_bytes()[..], &xpub.parent_fingerprint[..]);
            assert_eq!(&xkey.fingerprint().as_bytes()[..], &xpub.fingerprint()[..]);
            assert_eq!(u32::from(xpub.child_number), xkey.child_index());
        }
    }

    #[test]
    fn parent_fingerprint_links() {
        let parent = ExtendedKey::from_str(XPUBS[1]).unwrap();
        let child = ExtendedKey::from_str(XPUBS[2]).unwrap();
        assert_eq!(child.parent_fingerprint(), parent.fingerprint());
        assert_eq!(child.depth(), parent.depth() + 1);
        assert_eq!(child.child_index(), 1);
    }

    #[test]
    fn root_layout() {
        let xkey = ExtendedKey::from_str(XPUBS[0]).unwrap();
        let root = ExtendedKey::root(xkey.public_key(), xkey.chain_code());
        let data = root.encode();
        assert_eq!(data[..13], [0u8; 13]);
        assert_eq!(data[13..45], xkey.chain_code().to_bytes());
        assert_eq!(data[45..], serialize_compressed(&xkey.public_key()));
        assert_eq!(root.version().network_name(), None);
        assert_eq!(ExtendedKey::from_str(&root.to_string()).unwrap(), root);
    }

    #[test]
    fn decode_errors() {
        assert_eq!(ExtendedKey::decode(&[0u8; 77]), Err(CodecError::WrongLength(77)));
        let mut data = ExtendedKey::from_str(XPUBS[0]).unwrap().encode();
        data[45] = 0x04;
        assert_eq!(ExtendedKey::decode(&data), Err(CodecError::InvalidPoint));
        data[45] = 0x05;
        assert_eq!(ExtendedKey::decode(&data), Err(CodecError::InvalidPoint));

        let corrupted = format!("{}9", &XPUBS[0][..XPUBS[0].len() - 1]);
        assert_eq!(ExtendedKey::from_str(&corrupted), Err(CodecError::Checksum));
        assert_eq!(ExtendedKey::from_str("1"), Err(CodecError::WrongLength(1)));
    }

    #[test]
    fn chain_code_hex() {
        let hex = "03aa287e23cbf70094f485a01b31614dfb3cbb02e095092f8967324e405cc8c7";
        let chain_code = ChainCode::from_str(hex).unwrap();
        assert_eq!(chain_code.to_string(), hex);
        assert_eq!(format!("{:#x}", chain_code), "03aa287e..405cc8c7");
        assert_eq!(ChainCode::from_str("03aa"), Err(hex::Error::InvalidLength(32, 2)));
        assert!(ChainCode::from_slice([0u8; 31]).is_none());
    }
}
