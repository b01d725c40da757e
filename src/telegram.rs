// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! The telegram state machine: DLL -> (ELL?) -> (AFL?) -> TPL -> decrypt ->
//! APL, producing either an accepted `Telegram` or a `DecodeError` the
//! caller logs and drops. Grounded on `original_source`'s `wmbus.cc`
//! dispatch (layer-by-layer CI matching) and `meter_multical21.cc`'s
//! compact/long frame split.

use winnow::binary;
use winnow::error::ErrMode;
use winnow::prelude::*;
use winnow::Bytes;

use crate::crypto::{self, CryptoError};
use crate::error::{DecodeError, FrameError, LayerParseError};
use crate::format_cache::{self, FormatCache};
use crate::keys::MeterKeys;
use crate::parse::application_layer::{Frame, RecordMap};
use crate::parse::authentication_fragmentation_layer::AuthenticationFragmentationLayer;
use crate::parse::data_link_layer::DataLinkLayer;
use crate::parse::error::MBusError;
use crate::parse::extended_link_layer::{EllSecurityMode, ExtendedLinkLayer};
use crate::parse::transport_layer::header::{LongHeader, SecurityMode, ShortHeader, TPLHeader};

/// Which shape the application layer takes once the TPL header (if any)
/// has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
	/// Ordinary DIB/VIB record stream, inline.
	Long,
	/// 2-byte format signature + 2-byte data CRC, then data bytes only.
	Compact,
}

#[derive(Debug)]
pub struct Telegram {
	pub dll: DataLinkLayer,
	pub ell: Option<ExtendedLinkLayer>,
	pub afl: Option<AuthenticationFragmentationLayer>,
	pub tpl_header: TPLHeader,
	/// Present only when the APL arrived as a compact frame.
	pub format_signature: Option<u16>,
	pub records: RecordMap,
	/// The decrypted (if applicable) bytes handed to the DIB/VIB parser —
	/// kept around for drivers like Apator162 that read fixed byte offsets
	/// directly rather than through `records`.
	pub decrypted_apl: Vec<u8>,
	/// Whether this telegram was produced from test/simulator input rather
	/// than a live radio frame.
	pub is_simulated: bool,
	/// Whether a driver accepted and processed this telegram.
	pub handled: bool,
	/// One entry per consumed byte range, in parse order, for diagnostic
	/// output: `(offset, label)`.
	pub trace: Vec<(usize, String)>,
}

impl Telegram {
	/// BCD rendering of the DLL address field's identifier, zero-padded to
	/// 8 digits.
	pub fn id(&self) -> String {
		self.dll.id_string()
	}
}

/// Decodes one wM-Bus radio frame (the bytes after the length-prefix `L`
/// field `frame_detector::detect` strips off) using the process-wide
/// default format-signature cache.
pub fn decode_telegram(payload: &[u8], keys: &MeterKeys) -> Result<Telegram, DecodeError> {
	decode_telegram_with_cache(payload, keys, format_cache::default_cache())
}

/// Like `decode_telegram`, but never surfaces an `Err`: a malformed or
/// undecodable frame is logged at `warn!` and dropped, returning `None`.
/// Reader loops that want to keep running across noisy RF captures should
/// call this instead of matching on `decode_telegram`'s `Result` directly.
pub fn decode_or_log(payload: &[u8], keys: &MeterKeys) -> Option<Telegram> {
	match decode_telegram(payload, keys) {
		Ok(telegram) => Some(telegram),
		Err(err) => {
			log::warn!("dropping telegram: {err}");
			None
		}
	}
}

/// Same as `decode_telegram`, but against an explicit cache instance —
/// what tests, and callers juggling more than one process-wide cache,
/// should use.
pub fn decode_telegram_with_cache(
	payload: &[u8],
	keys: &MeterKeys,
	cache: &FormatCache,
) -> Result<Telegram, DecodeError> {
	if payload.len() < 10 {
		return Err(DecodeError::Frame(FrameError::TooShort));
	}

	let mut trace = Vec::new();
	let bytes = Bytes::new(payload);
	let mut input = &bytes;
	let total_len = input.len();
	let offset = |input: &&Bytes| total_len - input.len();

	let dll = DataLinkLayer::parse(&mut input).map_err(|e| layer_err("DLL", e))?;
	trace.push((
		0,
		format!(
			"DLL: control=0x{:02x} manufacturer={} id={}",
			dll.control,
			dll.manufacturer_code.as_deref().unwrap_or("?"),
			dll.id_string()
		),
	));

	let mut ci_field = dll.ci_field;
	let mut ell = None;
	let mut afl = None;

	loop {
		match ci_field {
			0x8A..=0x8F => {
				let pos = offset(&input);
				let layer = ExtendedLinkLayer::parse(ci_field, &mut input).map_err(|e| layer_err("ELL", e))?;
				trace.push((pos, "ELL".to_string()));
				ell = Some(layer);
				ci_field = next_ci(&mut input)?;
			}
			0x90 => {
				let pos = offset(&input);
				let layer = AuthenticationFragmentationLayer::parse(&mut input).map_err(|e| layer_err("AFL", e))?;
				trace.push((pos, "AFL".to_string()));
				afl = Some(layer);
				ci_field = next_ci(&mut input)?;
			}
			_ => break,
		}
	}

	let pos = offset(&input);
	let (tpl_header, frame_kind) = match ci_field {
		0x72 | 0x7C => (
			LongHeader::parse(&mut input).map_err(|e| layer_err("TPL", e))?,
			FrameKind::Long,
		),
		0x7A | 0x7D => (
			ShortHeader::parse(&mut input).map_err(|e| layer_err("TPL", e))?,
			FrameKind::Long,
		),
		// Kamstrup's headerless forms: no TPL header at all, straight into
		// the application layer.
		0x78 => (TPLHeader::None, FrameKind::Long),
		0x79 => (TPLHeader::None, FrameKind::Compact),
		other => return Err(DecodeError::Layer(LayerParseError::UnknownCI(other))),
	};
	trace.push((pos, format!("TPL: {}", tpl_summary(&tpl_header))));

	let plaintext: Vec<u8> = if keys.simulated {
		input.iter().copied().collect()
	} else {
		decrypt_apl(&dll, &ell, &afl, &tpl_header, keys, &input)?
	};
	trace.push((offset(&input), "APL (decrypted)".to_string()));

	let plaintext_bytes = Bytes::new(&plaintext);
	let mut apl_input = &plaintext_bytes;

	let (frame, format_signature) = match frame_kind {
		FrameKind::Long => {
			let (frame, template) =
				Frame::parse_with_template(&mut apl_input).map_err(|e| layer_err("APL", e))?;
			let signature = format_cache::compute_signature(&template);
			cache.store(signature, template);
			(frame, None)
		}
		FrameKind::Compact => {
			let signature = binary::le_u16
				.parse_next(&mut apl_input)
				.map_err(|e| layer_err("APL format signature", e))?;
			let data_crc = binary::le_u16
				.parse_next(&mut apl_input)
				.map_err(|e| layer_err("APL data CRC", e))?;
			let data: Vec<u8> = apl_input.iter().copied().collect();
			if format_cache::compute_signature(&data) != data_crc {
				log::debug!("compact frame data CRC mismatch for signature 0x{signature:04x}");
			}
			let Some(template) = cache.lookup(signature) else {
				return Err(DecodeError::UnknownFormatSignature(signature));
			};
			let frame = Frame::parse_compact(&template, &mut apl_input).map_err(|e| layer_err("APL", e))?;
			(frame, Some(signature))
		}
	};

	let records = RecordMap::from_frame(frame);

	Ok(Telegram {
		dll,
		ell,
		afl,
		tpl_header,
		format_signature,
		records,
		decrypted_apl: plaintext,
		is_simulated: keys.simulated,
		handled: false,
		trace,
	})
}

fn next_ci(input: &mut &Bytes) -> Result<u8, DecodeError> {
	binary::u8.parse_next(input).map_err(|e| layer_err("CI field", e))
}

fn security_mode_of(header: &TPLHeader) -> SecurityMode {
	match header {
		TPLHeader::None => SecurityMode::None,
		TPLHeader::Short(h) => h.configuration_field,
		TPLHeader::Long(h) => h.configuration_field,
	}
}

fn access_number_of(header: &TPLHeader) -> Option<u8> {
	match header {
		TPLHeader::None => None,
		TPLHeader::Short(h) => Some(h.access_number),
		TPLHeader::Long(h) => Some(h.access_number),
	}
}

fn tpl_summary(header: &TPLHeader) -> String {
	match header {
		TPLHeader::None => "no header".to_string(),
		TPLHeader::Short(h) => format!("short header, access_number={}", h.access_number),
		TPLHeader::Long(h) => format!("long header, id={}, access_number={}", h.identifier, h.access_number),
	}
}

/// Applies whichever decryption scheme (if any) this telegram's layers
/// call for, returning the plaintext application layer. ELL mode 1
/// (AES-CTR keyed off the ELL session number) takes priority over the TPL
/// security mode, since a telegram uses one or the other, never both.
fn decrypt_apl(
	dll: &DataLinkLayer,
	ell: &Option<ExtendedLinkLayer>,
	afl: &Option<AuthenticationFragmentationLayer>,
	tpl_header: &TPLHeader,
	keys: &MeterKeys,
	input: &&Bytes,
) -> Result<Vec<u8>, DecodeError> {
	let ciphertext: Vec<u8> = input.iter().copied().collect();

	if let Some(ell) = ell {
		if ell.security_mode == EllSecurityMode::AesCtr {
			let key = keys.confidentiality_key.ok_or(DecodeError::MissingKey)?;
			let session_number = ell.session_number.unwrap_or(0);
			let mut address = [0u8; 8];
			address[0..2].copy_from_slice(&dll.manufacturer.to_le_bytes());
			address[2..6].copy_from_slice(&dll.id.to_le_bytes());
			address[6] = dll.version;
			address[7] = dll.device_type_raw;
			return Ok(crypto::ctr_decrypt_mode1(&key, session_number, &address, &ciphertext));
		}
	}

	let access_number = access_number_of(tpl_header).unwrap_or(0);
	match security_mode_of(tpl_header) {
		SecurityMode::None => Ok(ciphertext),
		SecurityMode::AesCbcIv => {
			let key = keys.confidentiality_key.ok_or(DecodeError::MissingKey)?;
			let iv = crypto::mode5_iv(dll.manufacturer, dll.id, dll.version, dll.device_type_raw, access_number);
			Ok(crypto::cbc_decrypt(&key, &iv, &ciphertext)?)
		}
		SecurityMode::AesCtrCmac => {
			let conf_key = keys.confidentiality_key.ok_or(DecodeError::MissingKey)?;
			let auth_key = keys.authentication_key.unwrap_or(conf_key);
			// The AFL (CI 0x90) carries the MAC and message counter a mode 7
			// telegram must authenticate against; no AFL at all means no MAC
			// to check, so that's rejected the same as a mismatched one
			// rather than silently decrypting unauthenticated. Without a
			// captured real-world mode 7 telegram to validate against, the
			// IV construction reuses the mode 5 scheme with the TPL access
			// number standing in for the message counter's low byte —
			// recorded as an open decision rather than asserted fact.
			let afl = afl.as_ref().ok_or(CryptoError::MissingMac)?;
			let authenticated_header: Vec<u8> = afl.message_counter.map(|c| c.to_le_bytes().to_vec()).unwrap_or_default();
			let iv = crypto::mode5_iv(dll.manufacturer, dll.id, dll.version, dll.device_type_raw, access_number);
			Ok(crypto::ctr_cmac_decrypt_mode7(
				&conf_key,
				&auth_key,
				&iv,
				&authenticated_header,
				&ciphertext,
				&afl.mac,
			)?)
		}
		SecurityMode::Reserved(_) | SecurityMode::Unsupported(_) => Ok(ciphertext),
	}
}

fn layer_err(layer: &'static str, err: ErrMode<MBusError>) -> DecodeError {
	let source = match err {
		ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
		ErrMode::Incomplete(_) => MBusError {
			context: Vec::new(),
			cause: Some("incomplete input".to_string()),
		},
	};
	DecodeError::Layer(LayerParseError::Layer { layer, source })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_ci_is_dropped_not_panicked() {
		// A minimal DLL (C M M A A A A V Dev) followed by a CI field no
		// layer recognises.
		let mut payload = vec![0x44, 0x2d, 0x2c, 0x78, 0x56, 0x34, 0x12, 0x1b, 0x16];
		payload.push(0xFF);
		let result = decode_telegram(&payload, &MeterKeys::none());
		assert!(matches!(result, Err(DecodeError::Layer(LayerParseError::UnknownCI(0xFF)))));
	}

	#[test]
	fn too_short_payload_is_rejected() {
		let result = decode_telegram(&[0x44, 0x2d, 0x2c], &MeterKeys::none());
		assert!(matches!(result, Err(DecodeError::Frame(FrameError::TooShort))));
	}

	#[test]
	fn decode_or_log_drops_bad_frames_without_erroring() {
		assert!(decode_or_log(&[0x44, 0x2d, 0x2c], &MeterKeys::none()).is_none());
	}

	#[test]
	fn unencrypted_long_frame_decodes_and_caches_signature() {
		// DLL (C M M A A A A V Dev) + CI 0x72 (long TPL header) + a
		// minimal long TPL header (id, manufacturer, version, device type,
		// access number, status, configuration field = none) + one
		// unencrypted record (DIF 0x01, VIF 0x13, data 0x05).
		let mut payload = vec![0x44, 0x2d, 0x2c, 0x78, 0x56, 0x34, 0x12, 0x1b, 0x16, 0x72];
		payload.extend_from_slice(&[0x78, 0x56, 0x34, 0x12]); // identifier BCD
		payload.extend_from_slice(&[0x2d, 0x2c]); // manufacturer (KAM)
		payload.push(0x1b); // version
		payload.push(0x16); // device type (cold water)
		payload.push(0x00); // access number
		payload.push(0x00); // status
		payload.extend_from_slice(&[0x00, 0x00]); // configuration field: security mode none
		payload.extend_from_slice(&[0x01, 0x13, 0x05]); // one record

		let cache = FormatCache::new();
		let telegram = decode_telegram_with_cache(&payload, &MeterKeys::none(), &cache).unwrap();
		assert_eq!(telegram.records.len(), 1);
		assert!(telegram.format_signature.is_none());
		assert!(cache.lookup(format_cache::compute_signature(&[0x01, 0x13])).is_some());
	}

	#[test]
	fn simulated_meter_skips_decryption_even_with_encrypted_security_mode() {
		// Same long-frame layout as above, but the configuration field
		// declares AES-CBC-IV (mode 5) with no key supplied: a non-simulated
		// decode would fail with `MissingKey`, but a simulated meter treats
		// the bytes as already-plaintext.
		let mut payload = vec![0x44, 0x2d, 0x2c, 0x78, 0x56, 0x34, 0x12, 0x1b, 0x16, 0x72];
		payload.extend_from_slice(&[0x78, 0x56, 0x34, 0x12]);
		payload.extend_from_slice(&[0x2d, 0x2c]);
		payload.push(0x1b);
		payload.push(0x16);
		payload.push(0x00);
		payload.push(0x00);
		payload.extend_from_slice(&[0x00, 0x28]); // configuration field: security mode 5 (AES-CBC-IV)
		payload.extend_from_slice(&[0x01, 0x13, 0x05]);

		let telegram = decode_telegram(&payload, &MeterKeys::simulated()).unwrap();
		assert!(telegram.is_simulated);
		assert_eq!(telegram.records.len(), 1);
	}

	#[test]
	fn mode7_without_an_afl_is_rejected_rather_than_left_unauthenticated() {
		// Same long-frame layout again, but the configuration field declares
		// mode 7 (AES-CTR+CMAC) and no AFL (CI 0x90) precedes the TPL header,
		// so there is no MAC to check the ciphertext against.
		let mut payload = vec![0x44, 0x2d, 0x2c, 0x78, 0x56, 0x34, 0x12, 0x1b, 0x16, 0x72];
		payload.extend_from_slice(&[0x78, 0x56, 0x34, 0x12]);
		payload.extend_from_slice(&[0x2d, 0x2c]);
		payload.push(0x1b);
		payload.push(0x16);
		payload.push(0x00);
		payload.push(0x00);
		payload.extend_from_slice(&[0x00, 0x38]); // configuration field: security mode 7 (AES-CTR-CMAC)
		payload.extend_from_slice(&[0x01, 0x13, 0x05]);

		let keys = MeterKeys::with_confidentiality_key([0u8; 16]);
		let result = decode_telegram(&payload, &keys);
		assert!(matches!(result, Err(DecodeError::Crypto(CryptoError::MissingMac))));
	}
}
