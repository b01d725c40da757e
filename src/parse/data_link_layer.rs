// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2
#![allow(dead_code)]

//! The wM-Bus Data Link Layer (EN 13757-4 §6): control field, manufacturer,
//! address and CI field. This is the radio-frame counterpart to
//! `parse::link_layer`'s wired-M-Bus framing — distinct fields, but built
//! the same way, with `winnow` combinators over a `&Bytes` stream.

use winnow::binary;
use winnow::combinator::peek;
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::Bytes;

use super::error::MBResult;
use super::transport_layer::header::DeviceType;
use super::transport_layer::manufacturer::{device_name, unpack_manufacturer_code};
use super::types::number::parse_bcd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
	/// Frame Format A: length-prefixed, header CRC after the first block.
	A,
	/// Frame Format B: single CRC over the whole frame.
	B,
}

#[derive(Debug, Clone)]
pub struct DataLinkLayer {
	pub control: u8,
	pub manufacturer: u16,
	pub manufacturer_code: Option<String>,
	pub id: u32,
	pub version: u8,
	pub device_type: DeviceType,
	/// The device type byte as transmitted, before it's classified into
	/// `device_type` — mode 5/7 IV construction uses this raw "medium"
	/// byte directly, the way `energy2mqtt`'s `decrypt_mode5` does.
	pub device_type_raw: u8,
	pub device_name: Option<&'static str>,
	pub ci_field: u8,
}

impl DataLinkLayer {
	pub fn parse(input: &mut &Bytes) -> MBResult<Self> {
		let (control, manufacturer, (id, raw_id), version, device_type_raw, device_type, ci_field) = (
			binary::u8.context(StrContext::Label("C field")),
			binary::le_u16.context(StrContext::Label("M field")),
			parse_bcd(4)
				.try_map(i64_to_u32)
				.with_recognized()
				.context(StrContext::Label("A field identifier")),
			binary::u8.context(StrContext::Label("version")),
			peek(binary::u8).context(StrContext::Label("device type byte")),
			DeviceType::parse.context(StrContext::Label("device type")),
			binary::u8.context(StrContext::Label("CI field")),
		)
			.parse_next(input)?;

		Ok(Self {
			control,
			manufacturer_code: unpack_manufacturer_code(manufacturer).ok(),
			device_name: device_name(raw_id, manufacturer, version, device_type),
			manufacturer,
			id,
			version,
			device_type,
			device_type_raw,
			ci_field,
		})
	}

	/// The 8-digit decimal identifier EN 13757-4 §6.1 prints for the meter,
	/// zero-padded.
	pub fn id_string(&self) -> String {
		format!("{:08}", self.id)
	}
}

fn i64_to_u32(value: i64) -> Result<u32, std::num::TryFromIntError> {
	u32::try_from(value)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn id_is_zero_padded() {
		let dll = DataLinkLayer {
			control: 0x44,
			manufacturer: 0,
			manufacturer_code: None,
			id: 42,
			version: 0,
			device_type: DeviceType::Other,
			device_type_raw: 0x00,
			device_name: None,
			ci_field: 0x72,
		};
		assert_eq!(dll.id_string(), "00000042");
	}
}
