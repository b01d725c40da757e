// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2
#![allow(dead_code)]

//! Extended Link Layer (EN 13757-4 §9), present when the DLL's CI field is
//! one of the ELL variants (`0x8A`..=`0x8F`). Carries the access number and,
//! for the encrypted variants, a session number that splits into an
//! encryption counter, a time field and a security-mode nibble — the
//! counter feeds straight into the mode 1 AES-CTR IV.

use winnow::binary;
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::Bytes;

use super::error::MBResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EllSecurityMode {
	None,
	AesCtr,
}

#[derive(Debug, Clone)]
pub struct ExtendedLinkLayer {
	pub communication_control: u8,
	pub access_number: u8,
	pub session_number: Option<u32>,
	pub security_mode: EllSecurityMode,
}

impl ExtendedLinkLayer {
	/// `ci_field` selects which of the several ELL encodings applies;
	/// `0x8A`/`0x8B` are the short forms (no session number), `0x8C`..=`0x8F`
	/// carry one.
	pub fn parse(ci_field: u8, input: &mut &Bytes) -> MBResult<Self> {
		let (communication_control, access_number) = (
			binary::u8.context(StrContext::Label("CC field")),
			binary::u8.context(StrContext::Label("ELL access number")),
		)
			.parse_next(input)?;

		let (session_number, security_mode) = if matches!(ci_field, 0x8C..=0x8F) {
			let raw = binary::le_u32
				.context(StrContext::Label("ELL session number"))
				.parse_next(input)?;
			let mode = if (raw >> 29) & 0x7 == 0 {
				EllSecurityMode::None
			} else {
				EllSecurityMode::AesCtr
			};
			(Some(raw & 0x01FF_FFFF), mode)
		} else {
			(None, EllSecurityMode::None)
		};

		Ok(Self {
			communication_control,
			access_number,
			session_number,
			security_mode,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use winnow::Bytes as WBytes;

	#[test]
	fn short_form_has_no_session_number() {
		let data = [0x20, 0x05];
		let bytes = WBytes::new(&data);
		let mut input = &bytes;
		let ell = ExtendedLinkLayer::parse(0x8A, &mut input).unwrap();
		assert_eq!(ell.access_number, 5);
		assert_eq!(ell.session_number, None);
	}
}
