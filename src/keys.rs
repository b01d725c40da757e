// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Per-meter key material. This is the only "configuration" the core crate
//! owns directly — loading it from a file or CLI flag is a front-end
//! concern, per the crate's scope.

#[derive(Debug, Clone, Default)]
pub struct MeterKeys {
	/// The AES-128 key used for mode 1/5/7 confidentiality.
	pub confidentiality_key: Option<[u8; 16]>,
	/// Mode 7's separate CMAC authentication key, when distinct from
	/// `confidentiality_key`.
	pub authentication_key: Option<[u8; 16]>,
	/// Telegrams for this meter come from a test/simulator feed rather than
	/// a live radio capture: no decryption is attempted, even if a key is
	/// configured, since simulated telegrams arrive already in plaintext.
	pub simulated: bool,
}

impl MeterKeys {
	pub fn none() -> Self {
		Self::default()
	}

	pub fn simulated() -> Self {
		Self { simulated: true, ..Self::default() }
	}

	pub fn with_confidentiality_key(key: [u8; 16]) -> Self {
		Self {
			confidentiality_key: Some(key),
			authentication_key: None,
			simulated: false,
		}
	}

	pub fn from_hex(hex_key: &str) -> Result<Self, hex::FromHexError> {
		let bytes = hex::decode(hex_key)?;
		let key: [u8; 16] = bytes
			.try_into()
			.map_err(|_| hex::FromHexError::InvalidStringLength)?;
		Ok(Self::with_confidentiality_key(key))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_short_keys() {
		assert!(MeterKeys::from_hex("00112233").is_err());
	}

	#[test]
	fn accepts_32_hex_chars() {
		let key = MeterKeys::from_hex("000102030405060708090a0b0c0d0e0f").unwrap();
		assert_eq!(key.confidentiality_key, Some([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]));
	}

	#[test]
	fn simulated_keys_carry_no_key_material() {
		let keys = MeterKeys::simulated();
		assert!(keys.simulated);
		assert!(keys.confidentiality_key.is_none());
	}
}
