// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

use super::dib::DataInfoBlock;
use super::record::Record;
use super::vib::ValueInfoBlock;
use crate::parse::error::MBResult;
use winnow::binary;
use winnow::combinator::{alt, eof, repeat, repeat_till};
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::Bytes;

const IDLE_FILLER: u8 = 0x2F;

#[derive(Debug)]
pub struct Frame {
	pub records: Vec<Record>,
	pub more_data_follows: bool,
	pub manufacturer_specific: Vec<u8>,
}

impl Frame {
	pub fn parse(input: &mut &Bytes) -> MBResult<Self> {
		let (records, more_data_follows) = repeat_till(
			1..,
			(
				repeat::<_, _, (), _, _>(0.., IDLE_FILLER),
				Record::parse.context(StrContext::Label("frame record")),
			)
				.map(|(_, record)| record),
			alt((
				// The frame can simply end on a record boundary indicating no
				// more records
				eof.map(|_| false),
				// Or it can have one of the following bytes
				0x1F.map(|_| true),
				// Though it's not legal for this one to exist without some data after it
				0x0F.map(|_| false),
			)),
		)
		.parse_next(input)?;

		Ok(Self {
			records,
			more_data_follows,
			manufacturer_specific: input.iter().copied().collect(),
		})
	}

	/// Parses a compact frame's data bytes, guided by a DIB/VIB header
	/// template recovered from the format-signature cache: `template` holds
	/// only DIF(+DIFE)VIF(+VIFE) bytes with no data, one run per record, as
	/// cached from a previous long frame; `data` holds only the
	/// corresponding data bytes, in the same order.
	pub fn parse_compact(template: &[u8], data: &mut &Bytes) -> MBResult<Self> {
		let template_bytes = Bytes::new(template);
		let mut template_input = &template_bytes;
		let headers: Vec<(DataInfoBlock, ValueInfoBlock)> = repeat_till(
			0..,
			(
				repeat::<_, _, (), _, _>(0.., IDLE_FILLER),
				binary::bits::bits((DataInfoBlock::parse, ValueInfoBlock::parse))
					.context(StrContext::Label("compact frame header template entry")),
			)
				.map(|(_, pair)| pair),
			eof,
		)
		.map(|(headers, _)| headers)
		.parse_next(&mut template_input)?;

		let mut records = Vec::with_capacity(headers.len());
		for (dib, vib) in headers {
			records.push(Record::parse_value(dib, vib, data)?);
		}

		Ok(Self {
			records,
			more_data_follows: false,
			manufacturer_specific: data.iter().copied().collect(),
		})
	}

	/// Like `parse`, but additionally returns the raw DIB/VIB header bytes
	/// it consumed for each record (no data bytes), in encounter order —
	/// the byte sequence a later compact frame's format signature would
	/// need to resolve against the format-signature cache.
	pub fn parse_with_template(input: &mut &Bytes) -> MBResult<(Self, Vec<u8>)> {
		let mut template = Vec::new();
		let (records, more_data_follows) = repeat_till(
			1..,
			(
				repeat::<_, _, (), _, _>(0.., IDLE_FILLER),
				|i: &mut &Bytes| {
					let snapshot: Vec<u8> = i.iter().copied().collect();
					let (dib, vib) = binary::bits::bits((DataInfoBlock::parse, ValueInfoBlock::parse))
						.context(StrContext::Label("frame record header"))
						.parse_next(i)?;
					let consumed = snapshot.len() - i.len();
					template.extend_from_slice(&snapshot[..consumed]);
					Record::parse_value(dib, vib, i)
				},
			)
				.map(|(_, record)| record),
			alt((
				eof.map(|_| false),
				0x1F.map(|_| true),
				0x0F.map(|_| false),
			)),
		)
		.parse_next(input)?;

		Ok((
			Self {
				records,
				more_data_follows,
				manufacturer_specific: input.iter().copied().collect(),
			},
			template,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parse::types::DataType;

	/// DIF `0x01` (1-byte binary), VIF `0x13` (volume, m3 * 1e-3): the
	/// compact-frame branch must produce the same record as parsing the
	/// same DIB/VIB/data bytes inline, per the spec's compact/long
	/// equivalence invariant.
	#[test]
	fn compact_frame_matches_long_frame_for_same_record() {
		let template = [0x01u8, 0x13];

		let long_bytes = Bytes::new(&[0x01, 0x13, 0x05]);
		let mut long_input = &long_bytes;
		let long_frame = Frame::parse(&mut long_input).unwrap();

		let compact_bytes = Bytes::new(&[0x05]);
		let mut compact_input = &compact_bytes;
		let compact_frame = Frame::parse_compact(&template, &mut compact_input).unwrap();

		assert_eq!(long_frame.records.len(), 1);
		assert_eq!(compact_frame.records.len(), 1);
		assert!(matches!(long_frame.records[0].data, DataType::Signed(5)));
		assert!(matches!(compact_frame.records[0].data, DataType::Signed(5)));
	}

	#[test]
	fn template_capture_recovers_header_bytes_only() {
		let bytes = Bytes::new(&[0x01, 0x13, 0x05]);
		let mut input = &bytes;
		let (frame, template) = Frame::parse_with_template(&mut input).unwrap();
		assert_eq!(frame.records.len(), 1);
		assert_eq!(template, vec![0x01, 0x13]);
	}
}
