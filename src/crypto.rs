// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Symmetric decryption for the TPL security modes this crate supports.
//! Grounded on the `energy2mqtt` OMS module's `decrypt_mode5`: IV
//! construction from the telegram's own address fields plus the access
//! number, and the same "plaintext must start with the 0x2F 0x2F idle
//! filler" sanity check used there to tell a correct key from a wrong one
//! without needing a MAC.

use aes::cipher::{BlockDecryptMut, KeyIvInit, StreamCipher};
use aes::Aes128;
use cmac::{Cmac, Mac};

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
	#[error("no key configured for this meter")]
	MissingKey,
	#[error("ciphertext length {0} is not a multiple of the AES block size")]
	NotBlockAligned(usize),
	#[error("decrypted plaintext does not start with the 0x2F 0x2F idle filler")]
	BadFiller,
	#[error("CMAC verification failed")]
	MacMismatch,
	#[error("mode 7 telegram carries no MAC to verify")]
	MissingMac,
}

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128Ctr = ctr::Ctr64BE<Aes128>;

/// Mode 5 / Kamstrup-C1 IV: the 8 DLL address bytes (manufacturer + id +
/// version + medium) followed by the access number repeated 8 times.
pub fn mode5_iv(manufacturer: u16, id: u32, version: u8, medium: u8, access_number: u8) -> [u8; 16] {
	let mut iv = [0u8; 16];
	iv[0..2].copy_from_slice(&manufacturer.to_le_bytes());
	iv[2..6].copy_from_slice(&id.to_le_bytes());
	iv[6] = version;
	iv[7] = medium;
	for b in &mut iv[8..16] {
		*b = access_number;
	}
	iv
}

/// AES-128-CBC, no padding, verifying the decrypted plaintext starts with
/// the `0x2F 0x2F` filler bytes EN 13757-4 mandates for unused space — the
/// cheap way to detect "wrong key" without a MAC, used by mode 5 meters
/// like Omnipower and Apator162.
pub fn cbc_decrypt(key: &[u8; 16], iv: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
	if !ciphertext.len().is_multiple_of_block() {
		return Err(CryptoError::NotBlockAligned(ciphertext.len()));
	}
	let mut buf = ciphertext.to_vec();
	let decryptor = Aes128CbcDec::new(key.into(), iv.into());
	decryptor
		.decrypt_padded_mut::<cipher::block_padding::NoPadding>(&mut buf)
		.map_err(|_| CryptoError::NotBlockAligned(ciphertext.len()))?;
	if buf.len() >= 2 && buf[0] == 0x2F && buf[1] == 0x2F {
		Ok(buf)
	} else {
		Err(CryptoError::BadFiller)
	}
}

/// Same construction, for the Kamstrup-C1 legacy devices (Supercom587 era)
/// that predate the formal mode-5 designation but use the same IV scheme.
pub fn kamstrup_c1_decrypt(key: &[u8; 16], iv: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
	cbc_decrypt(key, iv, ciphertext)
}

/// Mode 1: AES-CTR with a counter built from the ELL session number and
/// the DLL address, used by legacy Multical21/FlowIQ3100 telegrams.
pub fn ctr_decrypt_mode1(key: &[u8; 16], session_number: u32, address: &[u8; 8], ciphertext: &[u8]) -> Vec<u8> {
	let mut iv = [0u8; 16];
	iv[0..8].copy_from_slice(address);
	iv[8..12].copy_from_slice(&session_number.to_le_bytes());
	let mut buf = ciphertext.to_vec();
	let mut cipher = Aes128Ctr::new(key.into(), &iv.into());
	cipher.apply_keystream(&mut buf);
	buf
}

/// Mode 7: AES-CTR confidentiality plus a truncated CMAC-AES128
/// authentication tag computed over the AFL header and ciphertext. The tag
/// is verified before the plaintext is returned to the caller.
pub fn ctr_cmac_decrypt_mode7(
	conf_key: &[u8; 16],
	auth_key: &[u8; 16],
	iv: &[u8; 16],
	authenticated_header: &[u8],
	ciphertext: &[u8],
	expected_tag: &[u8],
) -> Result<Vec<u8>, CryptoError> {
	if expected_tag.is_empty() {
		return Err(CryptoError::MissingMac);
	}
	let mut mac = Cmac::<Aes128>::new_from_slice(auth_key).expect("key is 16 bytes");
	mac.update(authenticated_header);
	mac.update(ciphertext);
	let tag = mac.finalize().into_bytes();
	if tag[..expected_tag.len()] != *expected_tag {
		return Err(CryptoError::MacMismatch);
	}

	let mut buf = ciphertext.to_vec();
	let mut cipher = Aes128Ctr::new(conf_key.into(), iv.into());
	cipher.apply_keystream(&mut buf);
	Ok(buf)
}

trait BlockAligned {
	fn is_multiple_of_block(self) -> bool;
}

impl BlockAligned for usize {
	fn is_multiple_of_block(self) -> bool {
		self % 16 == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_non_block_aligned_ciphertext() {
		let key = [0u8; 16];
		let iv = [0u8; 16];
		let result = cbc_decrypt(&key, &iv, &[0u8; 15]);
		assert!(matches!(result, Err(CryptoError::NotBlockAligned(15))));
	}

	#[test]
	fn mode7_rejects_telegrams_with_no_mac_to_check() {
		let key = [0u8; 16];
		let iv = [0u8; 16];
		let result = ctr_cmac_decrypt_mode7(&key, &key, &iv, &[], &[0u8; 16], &[]);
		assert!(matches!(result, Err(CryptoError::MissingMac)));
	}

	#[test]
	fn mode7_rejects_wrong_mac() {
		let key = [0u8; 16];
		let iv = [0u8; 16];
		let result = ctr_cmac_decrypt_mode7(&key, &key, &iv, &[], &[0u8; 16], &[0xFF; 4]);
		assert!(matches!(result, Err(CryptoError::MacMismatch)));
	}

	#[test]
	fn mode5_iv_repeats_access_number() {
		let iv = mode5_iv(0x2C2D, 0x12345678, 0x1b, 0x06, 0x2a);
		assert_eq!(&iv[8..16], &[0x2a; 8]);
		assert_eq!(iv[6], 0x1b);
		assert_eq!(iv[7], 0x06);
	}
}
