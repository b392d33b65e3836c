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

use bitcoin::hashes::hex;
use hd::{CodecError, DeriveError, PathError};

/// Names of the textual arguments accepted by the library operations
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum Argument {
    /// Public key of the root, hex-encoded
    #[display("public key")]
    PublicKey,

    /// Chain code of the root, hex-encoded
    #[display("chain code")]
    ChainCode,

    /// Derivation path
    #[display("derivation path")]
    Path,

    /// Message digest, hex-encoded
    #[display("message")]
    Message,

    /// `r` component of the signature, hex-encoded
    #[display("signature r")]
    SignatureR,

    /// `s` component of the signature, hex-encoded
    #[display("signature s")]
    SignatureS,
}

/// Errors of public key derivation and signature verification
#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum Error {
    /// {0} must be a non-empty string
    InvalidInput(Argument),

    /// {0} is not a valid hex string: {1}
    Hex(Argument, hex::Error),

    /// invalid public key: {0}
    #[from]
    PublicKey(CodecError),

    /// chain code must be 32 bytes long, while {0} bytes were provided
    ChainCodeLength(usize),

    /// message digest must be 32 bytes long, while {0} bytes were provided
    MessageLength(usize),

    /// {0} must not exceed 32 bytes, while {1} bytes were provided
    SignatureComponent(Argument, usize),

    /// signature data do not represent a valid ECDSA signature
    Signature,

    /// recovery id {0} is not supported; it must be in range 0..=3 or
    /// 27..=30
    RecoveryId(u8),

    /// invalid derivation path: {0}
    #[from]
    Path(PathError),

    /// unable to derive public key: {0}
    #[from]
    Derive(DeriveError),
}
