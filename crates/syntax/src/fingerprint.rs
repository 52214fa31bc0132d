//! Content fingerprints used as token cache keys.

use std::fmt;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a fingerprint of a `(language, text)` pair.
///
/// Hashes the UTF-16 code units of `"{language}:{text}"`. Distinct pairs may
/// collide; [`crate::TokenCache::lookup`] checks the stored key before
/// trusting a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u32);

impl Fingerprint {
	pub fn of(language: &str, text: &str) -> Self {
		let units = language.encode_utf16().chain(":".encode_utf16()).chain(text.encode_utf16());
		Self(fnv1a(units))
	}

	pub const fn from_raw(raw: u32) -> Self {
		Self(raw)
	}

	pub const fn get(self) -> u32 {
		self.0
	}
}

impl fmt::Display for Fingerprint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:08x}", self.0)
	}
}

fn fnv1a(units: impl IntoIterator<Item = u16>) -> u32 {
	units.into_iter().fold(FNV_OFFSET_BASIS, |hash, unit| (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME))
}
