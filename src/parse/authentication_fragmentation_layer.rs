// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2
#![allow(dead_code)]

//! Authentication and Fragmentation Layer (EN 13757-7 §6), present when the
//! CI field is `0x90`. Carries a truncated CMAC tag over the rest of the
//! telegram plus a message counter, which mode 7 needs to verify before any
//! decryption is attempted.

use winnow::binary;
use winnow::combinator::repeat;
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::Bytes;

use super::error::MBResult;

#[derive(Debug, Clone)]
pub struct AuthenticationFragmentationLayer {
	pub fragmentation_control: u16,
	pub message_control: u8,
	pub message_counter: Option<u32>,
	pub mac: Vec<u8>,
}

impl AuthenticationFragmentationLayer {
	pub fn parse(input: &mut &Bytes) -> MBResult<Self> {
		let afll = binary::u8.context(StrContext::Label("AFL length")).parse_next(input)?;
		let start = input.len();
		let fragmentation_control = binary::le_u16
			.context(StrContext::Label("FCL field"))
			.parse_next(input)?;
		let message_control = binary::u8.context(StrContext::Label("MCL field")).parse_next(input)?;

		let has_counter = message_control & 0b0100_0000 != 0;
		let mac_len = match (message_control >> 4) & 0b11 {
			0 => 0,
			1 => 4,
			2 => 8,
			3 => 16,
			_ => unreachable!(),
		};

		let message_counter = if has_counter {
			Some(
				binary::le_u32
					.context(StrContext::Label("AFL message counter"))
					.parse_next(input)?,
			)
		} else {
			None
		};

		let mac: Vec<u8> = repeat(mac_len, binary::u8)
			.context(StrContext::Label("AFL MAC"))
			.parse_next(input)?;

		let consumed = start - input.len();
		if consumed > afll as usize {
			return Err(super::error::MBusError::assert(input, "AFL body longer than declared AFLL"));
		}

		Ok(Self {
			fragmentation_control,
			message_control,
			message_counter,
			mac,
		})
	}
}
