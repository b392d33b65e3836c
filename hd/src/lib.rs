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

//! Library for hierarchical deterministic derivation of secp256k1 public
//! keys which never touches private key material.
//!
//! Implements BIP32 public parent key -> public child key derivation for
//! unhardened indexes, the BIP32 extended key serialization and a parser for
//! textual derivation paths.

// Coding conventions
#![recursion_limit = "256"]
#![deny(dead_code, missing_docs)]

#[macro_use]
extern crate amplify;

pub mod codec;
mod derive;
pub mod digest;
mod path;
mod xkey;

pub use codec::CodecError;
pub use derive::{derive_chained, derive_child, DeriveError, TweakSum};
pub use path::{parse_path, DerivationIndexes, PathError};
pub use xkey::{
    ChainCode, ExtendedKey, Fingerprint, KeyVersion, VERSION_MAGIC_TPUB, VERSION_MAGIC_XPUB,
};

/// Constant determining BIP32 boundary for u32 values after which index
/// is treated as hardened
pub const HARDENED_INDEX_BOUNDARY: u32 = 1 << 31;
