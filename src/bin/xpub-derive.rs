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

#[macro_use]
extern crate amplify;

use std::process::ExitCode;
use std::str::FromStr;

use bitcoin::hashes::hex::ToHex;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use serde_crate::Serialize;
use tracing_subscriber::EnvFilter;
use xpub_derive::hd::codec::serialize_compressed;
use xpub_derive::hd::{CodecError, DerivationIndexes, ExtendedKey, PathError};
use xpub_derive::{derive_extended_key, verify_derived_signature};

/// Command-line arguments
#[derive(Parser)]
#[derive(Clone, Eq, PartialEq, Debug)]
#[clap(
    author,
    version,
    name = "xpub-derive",
    about = "Command-line tool deriving child public keys from a public key and chain code"
)]
pub struct Args {
    /// Command to execute
    #[clap(subcommand)]
    pub command: Command,

    /// Increase verbosity of the log output; can be repeated up to three
    /// times. Without this flag `RUST_LOG` environment variable is used.
    #[clap(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Command to execute
#[derive(Subcommand)]
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Command {
    /// Derive child public key along unhardened derivation path
    Derive {
        /// Hex-encoded root public key, compressed or uncompressed
        pubkey: String,

        /// Hex-encoded 32-byte root chain code
        chain_code: String,

        /// Derivation path, like `m/0/1`
        path: String,

        /// Print derived key as Base58Check extended public key
        #[clap(long, conflicts_with = "yaml")]
        xpub: bool,

        /// Print full information about the derived key in YAML format
        #[clap(long)]
        yaml: bool,
    },

    /// Verify ECDSA signature against the derived public key.
    ///
    /// Exits with non-zero status if the signature is invalid.
    Verify {
        /// Hex-encoded 32-byte message digest
        message: String,

        /// Hex-encoded `r` component of the signature
        r: String,

        /// Hex-encoded `s` component of the signature
        s: String,

        /// Signature recovery id: 0 to 3, or 27 to 30
        recovery_id: u8,

        /// Hex-encoded root public key, compressed or uncompressed
        pubkey: String,

        /// Hex-encoded 32-byte root chain code
        chain_code: String,

        /// Derivation path, like `m/0/1`
        path: String,
    },

    /// Print information about Base58Check-encoded extended public key
    Info {
        /// Extended public key
        xkey: String,
    },
}

#[derive(Debug, Display, Error, From)]
#[display(inner)]
pub enum Error {
    #[from]
    Derivation(xpub_derive::Error),

    #[from]
    Encoding(CodecError),

    #[from]
    Path(PathError),

    #[from]
    Yaml(serde_yaml::Error),
}

/// Information about derived key printed with `--yaml` option
#[derive(Serialize)]
#[serde(crate = "serde_crate", rename_all = "camelCase")]
struct DerivedKey {
    path: DerivationIndexes,
    public_key: String,
    xpub: ExtendedKey,
    depth: u8,
    child_index: u32,
    parent_fingerprint: String,
    chain_code: String,
}

impl Args {
    pub fn exec(&self) -> Result<bool, Error> {
        match &self.command {
            Command::Derive {
                pubkey,
                chain_code,
                path,
                xpub,
                yaml,
            } => Self::derive(pubkey, chain_code, path, *xpub, *yaml),
            Command::Verify {
                message,
                r,
                s,
                recovery_id,
                pubkey,
                chain_code,
                path,
            } => Self::verify(message, r, s, *recovery_id, pubkey, chain_code, path),
            Command::Info { xkey } => Self::info(xkey),
        }
    }

    fn derive(
        pubkey: &str,
        chain_code: &str,
        path: &str,
        xpub: bool,
        yaml: bool,
    ) -> Result<bool, Error> {
        let key = derive_extended_key(pubkey, chain_code, path)?;
        let public_key = serialize_compressed(&key.public_key()).to_hex();
        if yaml {
            let info = DerivedKey {
                path: DerivationIndexes::from_str(path)?,
                public_key,
                xpub: key,
                depth: key.depth(),
                child_index: key.child_index(),
                parent_fingerprint: key.parent_fingerprint().to_string(),
                chain_code: key.chain_code().to_string(),
            };
            print!("{}", serde_yaml::to_string(&info)?);
        } else if xpub {
            println!("{}", key);
        } else {
            println!("{}", public_key);
        }
        Ok(true)
    }

    #[allow(clippy::too_many_arguments)]
    fn verify(
        message: &str,
        r: &str,
        s: &str,
        recovery_id: u8,
        pubkey: &str,
        chain_code: &str,
        path: &str,
    ) -> Result<bool, Error> {
        let check = verify_derived_signature(message, r, s, recovery_id, pubkey, chain_code, path)?;
        if check.valid {
            println!("{}", "valid".bright_green());
        } else {
            println!("{}", "invalid".bright_red());
        }
        match check.recovered_pubkey {
            Some(recovered) => println!(
                "{} {}",
                "Recovered key:".bright_white(),
                serialize_compressed(&recovered).to_hex()
            ),
            None => println!("{}", "Public key can't be recovered from the signature".yellow()),
        }
        Ok(check.valid)
    }

    fn info(xkey: &str) -> Result<bool, Error> {
        let key = ExtendedKey::from_str(xkey)?;
        let version = key.version();
        println!(
            "{:<24}{} ({})",
            "Version:".bright_white(),
            version,
            version.network_name().unwrap_or("unknown network")
        );
        println!("{:<24}{}", "Depth:".bright_white(), key.depth());
        println!("{:<24}{}", "Parent fingerprint:".bright_white(), key.parent_fingerprint());
        println!("{:<24}{}", "Child index:".bright_white(), key.child_index());
        println!("{:<24}{}", "Chain code:".bright_white(), key.chain_code());
        println!(
            "{:<24}{}",
            "Public key:".bright_white(),
            serialize_compressed(&key.public_key()).to_hex()
        );
        println!("{:<24}{}", "Fingerprint:".bright_white(), key.fingerprint());
        println!("{:<24}{}", "Identifier:".bright_white(), key.identifier().to_hex());
        Ok(true)
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match args.exec() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{}: {}\n", "Error".bright_red(), err);
            ExitCode::FAILURE
        }
    }
}
