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

//! Hash functions used by BIP32 with fixed-size outputs.

use bitcoin::hashes::{hash160 as h160, sha256d, sha512, Hash, HashEngine, Hmac, HmacEngine};

/// `SHA256(SHA256(data))`, used for Base58Check checksums.
#[inline]
pub fn double_hash(data: &[u8]) -> [u8; 32] { sha256d::Hash::hash(data).into_inner() }

/// `RIPEMD160(SHA256(data))`; first four bytes of it applied to a compressed
/// public key give the key fingerprint.
#[inline]
pub fn hash160(data: &[u8]) -> [u8; 20] { h160::Hash::hash(data).into_inner() }

/// HMAC-SHA512 of `data` keyed with `key`.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut engine = HmacEngine::<sha512::Hash>::new(key);
    engine.input(data);
    Hmac::<sha512::Hash>::from_engine(engine).into_inner()
}
