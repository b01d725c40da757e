// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Wireless M-Bus link modes (EN 13757-4 Table 23) as a bitset, so a driver
//! can declare "I answer to T1 or C1" without a `Vec` allocation.

use bitflags::bitflags;

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct LinkModeSet: u32 {
		const S1  = 1 << 0;
		const S1M = 1 << 1;
		const S2  = 1 << 2;
		const T1  = 1 << 3;
		const T2  = 1 << 4;
		const C1  = 1 << 5;
		const C2  = 1 << 6;
		const N1A = 1 << 7;
		const N1B = 1 << 8;
		const N1C = 1 << 9;
		const N1D = 1 << 10;
		const N1E = 1 << 11;
		const N1F = 1 << 12;
		const N2A = 1 << 13;
		const N2B = 1 << 14;
		const N2C = 1 << 15;
		const N2D = 1 << 16;
		const N2E = 1 << 17;
		const N2F = 1 << 18;
	}
}

impl LinkModeSet {
	pub fn from_name(name: &str) -> Option<Self> {
		Some(match name {
			"S1" => Self::S1,
			"S1m" => Self::S1M,
			"S2" => Self::S2,
			"T1" => Self::T1,
			"T2" => Self::T2,
			"C1" => Self::C1,
			"C2" => Self::C2,
			"N1a" => Self::N1A,
			"N1b" => Self::N1B,
			"N1c" => Self::N1C,
			"N1d" => Self::N1D,
			"N1e" => Self::N1E,
			"N1f" => Self::N1F,
			"N2a" => Self::N2A,
			"N2b" => Self::N2B,
			"N2c" => Self::N2C,
			"N2d" => Self::N2D,
			"N2e" => Self::N2E,
			"N2f" => Self::N2F,
			_ => return None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn combines_modes() {
		let both = LinkModeSet::T1 | LinkModeSet::C1;
		assert!(both.contains(LinkModeSet::T1));
		assert!(both.contains(LinkModeSet::C1));
		assert!(!both.contains(LinkModeSet::S1));
	}

	#[test]
	fn from_name_covers_the_n_variants() {
		assert_eq!(LinkModeSet::from_name("N1f"), Some(LinkModeSet::N1F));
		assert_eq!(LinkModeSet::from_name("N2f"), Some(LinkModeSet::N2F));
		assert_eq!(LinkModeSet::from_name("N3a"), None);
	}
}
