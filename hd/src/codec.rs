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

//! Byte-exact encodings: big-endian integers, SEC1 points and Base58Check.

use bitcoin::util::base58;
use secp256k1::PublicKey;

/// Length of SEC1 compressed public key serialization
pub const COMPRESSED_POINT_LEN: usize = 33;

/// Length of BIP32 extended key serialization (without checksum)
pub const EXTENDED_KEY_LEN: usize = 78;

/// Errors in curve point and extended key encodings
#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum CodecError {
    /// curve point coordinate does not fit into 32 bytes
    CoordinateOverflow,

    /// data do not represent a valid secp256k1 curve point
    InvalidPoint,

    /// extended key data must be 78 bytes long, while {0} bytes were
    /// provided
    WrongLength(usize),

    /// invalid Base58 encoding: {0}
    #[from]
    Base58(base58::Error),

    /// Base58Check checksum does not match the encoded data
    Checksum,
}

/// Encodes `value` as 4 big-endian bytes.
#[inline]
pub fn encode_u32_be(value: u32) -> [u8; 4] { value.to_be_bytes() }

/// Serializes public key into 33-byte SEC1 compressed form: `0x02` or `0x03`
/// prefix, depending on the parity of y coordinate, followed by big-endian x
/// coordinate.
#[inline]
pub fn serialize_compressed(point: &PublicKey) -> [u8; COMPRESSED_POINT_LEN] { point.serialize() }

/// Serializes point given by its raw big-endian coordinates into the SEC1
/// compressed form. Leading zero bytes in coordinates are allowed.
///
/// # Errors
///
/// [`CodecError::CoordinateOverflow`] if any of the coordinates does not fit
/// into 32 bytes.
pub fn serialize_compressed_xy(x: &[u8], y: &[u8]) -> Result<[u8; 33], CodecError> {
    let x = coordinate(x)?;
    let y = coordinate(y)?;
    let mut data = [0u8; COMPRESSED_POINT_LEN];
    data[0] = if y[31] & 1 == 1 { 0x03 } else { 0x02 };
    data[1..].copy_from_slice(&x);
    Ok(data)
}

fn coordinate(value: &[u8]) -> Result<[u8; 32], CodecError> {
    let start = value.iter().position(|byte| *byte != 0).unwrap_or(value.len());
    let value = &value[start..];
    if value.len() > 32 {
        return Err(CodecError::CoordinateOverflow);
    }
    let mut buf = [0u8; 32];
    buf[32 - value.len()..].copy_from_slice(value);
    Ok(buf)
}

/// Parses SEC1-encoded public key, either in 33-byte compressed or 65-byte
/// uncompressed form.
pub fn decode_point(data: &[u8]) -> Result<PublicKey, CodecError> {
    PublicKey::from_slice(data).map_err(|_| CodecError::InvalidPoint)
}

/// Appends first four bytes of [`double_hash`] to the payload and encodes the
/// result with Base58.
///
/// [`double_hash`]: crate::digest::double_hash
#[inline]
pub fn check_encode(payload: &[u8]) -> String { base58::check_encode_slice(payload) }

/// Decodes Base58Check string, verifies and strips its checksum.
pub fn check_decode(s: &str) -> Result<Vec<u8>, CodecError> {
    base58::from_check(s).map_err(|err| match err {
        base58::Error::BadChecksum(..) => CodecError::Checksum,
        base58::Error::TooShort(len) => CodecError::WrongLength(len),
        err => CodecError::Base58(err),
    })
}
