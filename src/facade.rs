// Public key derivation and signature verification library
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

//! Derivation of child public keys from textual inputs.

use bitcoin::hashes::hex::{FromHex, ToHex};
use hd::codec::{decode_point, serialize_compressed};
use hd::{derive_chained, parse_path, ChainCode, ExtendedKey, TweakSum};
use secp256k1::SECP256K1;
use tracing::debug;

use crate::{Argument, Error};

pub(crate) fn decode_hex(argument: Argument, s: &str) -> Result<Vec<u8>, Error> {
    Vec::<u8>::from_hex(s).map_err(|err| Error::Hex(argument, err))
}

pub(crate) fn non_empty(argument: Argument, s: &str) -> Result<(), Error> {
    if s.is_empty() {
        Err(Error::InvalidInput(argument))
    } else {
        Ok(())
    }
}

/// Derives extended public key for the `path` starting from a root made of
/// the public key and chain code.
///
/// Returns the derived key together with the sum of all derivation tweaks,
/// which gives the private key of the derived key when added to the private
/// key of the root.
///
/// The root is synthetic: it has zero depth, version, parent fingerprint and
/// child number.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if any of the arguments is an empty string; the
///   arguments are checked in their order;
/// - [`Error::Hex`] if the public key or chain code are not valid hex;
/// - [`Error::PublicKey`] if the public key is not a valid SEC1 point;
/// - [`Error::ChainCodeLength`] if the chain code is not 32 bytes long;
/// - [`Error::Path`] if the derivation path can't be parsed;
/// - [`Error::Derive`] for hardened indexes and invalid derivation results.
pub fn derive_with_tweak(
    hex_pubkey: &str,
    hex_chain_code: &str,
    path: &str,
) -> Result<(ExtendedKey, TweakSum), Error> {
    non_empty(Argument::PublicKey, hex_pubkey)?;
    non_empty(Argument::ChainCode, hex_chain_code)?;
    non_empty(Argument::Path, path)?;

    let public_key = decode_point(&decode_hex(Argument::PublicKey, hex_pubkey)?)?;
    let chain_code = decode_hex(Argument::ChainCode, hex_chain_code)?;
    let chain_code =
        ChainCode::from_slice(&chain_code).ok_or(Error::ChainCodeLength(chain_code.len()))?;
    let indexes = parse_path(path)?;

    let root = ExtendedKey::root(public_key, chain_code);
    let (key, tweak) = derive_chained(SECP256K1, indexes, &root)?;
    debug!(path, depth = key.depth(), "derived public key {}", key);
    Ok((key, tweak))
}

/// Derives extended public key for the `path` starting from a root made of
/// the public key and chain code. See [`derive_with_tweak`] for the details.
#[inline]
pub fn derive_extended_key(
    hex_pubkey: &str,
    hex_chain_code: &str,
    path: &str,
) -> Result<ExtendedKey, Error> {
    derive_with_tweak(hex_pubkey, hex_chain_code, path).map(|(key, _)| key)
}

/// Derives public key for the `path` starting from a root made of the public
/// key and chain code, returning its SEC1 compressed serialization as a
/// lowercase hex string.
///
/// The public key may be given in either compressed or uncompressed SEC1
/// form. See [`derive_with_tweak`] for the list of errors.
pub fn get_derived_pubkey(
    hex_pubkey: &str,
    hex_chain_code: &str,
    path: &str,
) -> Result<String, Error> {
    let key = derive_extended_key(hex_pubkey, hex_chain_code, path)?;
    Ok(serialize_compressed(&key.public_key()).to_hex())
}
