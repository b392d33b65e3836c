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

//! Verification of ECDSA signatures against derived public keys.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, SECP256K1};
#[cfg(feature = "serde")]
use serde_with::{As, DisplayFromStr};
use tracing::debug;

use crate::facade::{decode_hex, non_empty};
use crate::{derive_extended_key, Argument, Error};

/// Outcome of a signature check against a derived key
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SignatureCheck {
    /// Whether the signature is a valid low-S ECDSA signature of the message
    /// made with the private key matching the derived public key
    pub valid: bool,

    /// Public key recovered from the signature, if the recovery succeeded
    #[cfg_attr(feature = "serde", serde(with = "As::<Option<DisplayFromStr>>"))]
    pub recovered_pubkey: Option<PublicKey>,
}

fn recovery_id(id: u8) -> Result<RecoveryId, Error> {
    let normalized = match id {
        0..=3 => id,
        27..=30 => id - 27,
        _ => return Err(Error::RecoveryId(id)),
    };
    RecoveryId::from_i32(normalized as i32).map_err(|_| Error::RecoveryId(id))
}

fn signature_component(argument: Argument, s: &str) -> Result<[u8; 32], Error> {
    non_empty(argument, s)?;
    let data = decode_hex(argument, s)?;
    if data.len() > 32 {
        return Err(Error::SignatureComponent(argument, data.len()));
    }
    let mut buf = [0u8; 32];
    buf[32 - data.len()..].copy_from_slice(&data);
    Ok(buf)
}

/// Checks recoverable `signature` of the `message` digest against the
/// `derived` public key.
///
/// The signature is valid only if the key recovered from it equals the
/// derived key and the signature passes standard ECDSA verification, which
/// rejects high-S signatures.
pub fn check_signature(
    derived: &PublicKey,
    message: &Message,
    signature: &RecoverableSignature,
) -> SignatureCheck {
    let recovered_pubkey = SECP256K1.recover_ecdsa(message, signature).ok();
    let valid = recovered_pubkey.as_ref() == Some(derived)
        && SECP256K1
            .verify_ecdsa(message, &signature.to_standard(), derived)
            .is_ok();
    SignatureCheck {
        valid,
        recovered_pubkey,
    }
}

/// Verifies that the signature given by its `r` and `s` components and the
/// recovery id was made for the 32-byte `message` digest with the private key
/// of the key derived from the public key and chain code along the `path`.
///
/// Signature components are big-endian hex numbers of up to 32 bytes. The
/// recovery id must be in range `0..=3`; values `27..=30` used by Ethereum
/// and Bitcoin message signing are reduced by 27.
///
/// A signature which is well-formed but doesn't match the derived key is not
/// an error: it gives [`SignatureCheck`] with `valid` set to `false`.
///
/// # Errors
///
/// All errors of [`crate::derive_with_tweak`] plus the errors in message and
/// signature encodings.
pub fn verify_derived_signature(
    hex_message: &str,
    hex_r: &str,
    hex_s: &str,
    recovery_id_byte: u8,
    hex_pubkey: &str,
    hex_chain_code: &str,
    path: &str,
) -> Result<SignatureCheck, Error> {
    let derived = derive_extended_key(hex_pubkey, hex_chain_code, path)?.public_key();

    non_empty(Argument::Message, hex_message)?;
    let digest = decode_hex(Argument::Message, hex_message)?;
    if digest.len() != 32 {
        return Err(Error::MessageLength(digest.len()));
    }
    let message = Message::from_slice(&digest).map_err(|_| Error::MessageLength(digest.len()))?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature_component(Argument::SignatureR, hex_r)?);
    compact[32..].copy_from_slice(&signature_component(Argument::SignatureS, hex_s)?);
    let signature = RecoverableSignature::from_compact(&compact, recovery_id(recovery_id_byte)?)
        .map_err(|_| Error::Signature)?;

    let check = check_signature(&derived, &message, &signature);
    debug!(path, valid = check.valid, "checked signature against derived key {}", derived);
    Ok(check)
}
