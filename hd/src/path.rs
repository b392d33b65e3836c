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

use std::fmt::{self, Display, Formatter};
use std::num::IntErrorKind;
use std::ops::Deref;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Errors parsing textual derivation path
#[derive(Clone, PartialEq, Eq, Hash, Debug, Display, Error)]
#[display(doc_comments)]
pub enum PathError {
    /// derivation path segment `{0}` is not a decimal number
    InvalidPathSegment(String),

    /// derivation path segment `{0}` exceeds the maximum index value
    /// 4294967295
    OutOfRange(String),
}

/// Parses textual derivation path like `m/44'/60'/0'/0/0` into a sequence of
/// raw derivation indexes.
///
/// Empty segments and `m` segments are skipped. A single trailing apostrophe
/// is removed from each segment without setting the hardened bit: the path
/// `m/44'` produces index `44`. Indexes equal to or above 2^31 given as
/// plain numbers are parsed as is; it is up to the derivation to reject
/// them.
pub fn parse_path(path: &str) -> Result<Vec<u32>, PathError> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != "m")
        .map(parse_segment)
        .collect()
}

fn parse_segment(segment: &str) -> Result<u32, PathError> {
    let digits = segment.strip_suffix('\'').unwrap_or(segment);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(PathError::InvalidPathSegment(segment.to_owned()));
    }
    u32::from_str(digits).map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow => PathError::OutOfRange(segment.to_owned()),
        _ => PathError::InvalidPathSegment(segment.to_owned()),
    })
}

/// Sequence of raw derivation indexes parsed from a textual path
#[cfg_attr(feature = "serde", derive(SerializeDisplay, DeserializeFromStr))]
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct DerivationIndexes(Vec<u32>);

impl DerivationIndexes {
    /// Constructs empty sequence, matching the path `m`
    #[inline]
    pub fn new() -> DerivationIndexes { DerivationIndexes::default() }

    /// Converts into the inner vector of indexes
    #[inline]
    pub fn into_inner(self) -> Vec<u32> { self.0 }
}

impl Deref for DerivationIndexes {
    type Target = [u32];

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl From<Vec<u32>> for DerivationIndexes {
    fn from(indexes: Vec<u32>) -> Self { DerivationIndexes(indexes) }
}

impl From<DerivationIndexes> for Vec<u32> {
    fn from(indexes: DerivationIndexes) -> Self { indexes.0 }
}

impl FromStr for DerivationIndexes {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse_path(s).map(DerivationIndexes) }
}

impl Display for DerivationIndexes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in &self.0 {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}

impl IntoIterator for DerivationIndexes {
    type Item = u32;
    type IntoIter = std::vec::IntoIter<u32>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a DerivationIndexes {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter { self.0.iter().copied() }
}
