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

//! Derivation of secp256k1 child public keys from a public key and chain code
//! along a textual path, and verification of ECDSA signatures made with the
//! private keys of the derived keys.
//!
//! Only public derivation is performed, so hardened path segments are
//! rejected.

// Coding conventions
#![recursion_limit = "256"]
#![deny(dead_code, missing_docs)]

#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub extern crate xpub_hd as hd;

mod error;
pub mod facade;
pub mod verify;

pub use error::{Argument, Error};
pub use facade::{derive_extended_key, derive_with_tweak, get_derived_pubkey};
pub use verify::{check_signature, verify_derived_signature, SignatureCheck};
