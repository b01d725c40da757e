// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Kamstrup Multical21 / FlowIQ3100 water meters (mode 1, AES-CTR).
//! Grounded on wmbusmeters' `meter_multical21.cc`: total/target volume at
//! storage 0/1, flow+external temperature, and a manufacturer-specific
//! status byte carrying the DRY/REVERSED/LEAK/BURST info codes plus four
//! 3-bit time-bands (`decodeTime`).

use super::{FieldDescriptor, FieldValue, MeterDriver};
use crate::link_mode::LinkModeSet;
use crate::parse::application_layer::RecordMap;
use crate::parse::types::DataType;
use crate::units::{Quantity, Unit};

/// `02FF20`'s VIFE byte: DIB `0x02` (2-byte binary) + VIF `0xFF`
/// (manufacturer-specific) is already how `find_manufacturer_specific`
/// identifies the record; `0x20` disambiguates it from any other `FF`
/// extension the telegram might carry.
const INFO_CODES_VIFE: u8 = 0x20;

/// Reads the `02FF20` info-codes word out of the parsed records rather than
/// the raw tail bytes: it sits wherever that record falls in the telegram,
/// not necessarily at the end.
fn info_codes_word(records: &RecordMap) -> Option<u16> {
	let record = records.find_manufacturer_specific(INFO_CODES_VIFE)?;
	match record.data {
		DataType::Signed(v) => Some(v as u16),
		DataType::Unsigned(v) => Some(v as u16),
		_ => None,
	}
}

/// `{0:"0 hours",1:"1-8 hours",2:"9-24 hours",3:"2-3 days",4:"4-7
/// days",5:"8-14 days",6:"15-21 days",7:"22-31 days"}`
const TIME_BANDS: [&str; 8] = [
	"0 hours",
	"1-8 hours",
	"9-24 hours",
	"2-3 days",
	"4-7 days",
	"8-14 days",
	"15-21 days",
	"22-31 days",
];

fn decode_time(band: u8) -> &'static str {
	TIME_BANDS[(band & 0b111) as usize]
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InfoCodes {
	pub dry: bool,
	pub reversed: bool,
	pub leak: bool,
	pub burst: bool,
	pub dry_time: u8,
	pub reversed_time: u8,
	pub leak_time: u8,
	pub burst_time: u8,
}

impl InfoCodes {
	/// Decodes the trailing manufacturer-specific info-codes word (VIF
	/// `0x02FF20`): four 1-bit flags followed by four 3-bit time-bands.
	fn from_word(word: u16) -> Self {
		Self {
			dry: word & 0b1 != 0,
			reversed: (word >> 1) & 0b1 != 0,
			leak: (word >> 2) & 0b1 != 0,
			burst: (word >> 3) & 0b1 != 0,
			dry_time: decode_time_band(word, 0),
			reversed_time: decode_time_band(word, 1),
			leak_time: decode_time_band(word, 2),
			burst_time: decode_time_band(word, 3),
		}
	}

	fn status_human_readable(self) -> String {
		let mut parts = Vec::new();
		if self.dry {
			parts.push(format!("DRY({}) ", decode_time(self.dry_time)));
		}
		if self.reversed {
			parts.push(format!("REVERSED({}) ", decode_time(self.reversed_time)));
		}
		if self.leak {
			parts.push(format!("LEAK({}) ", decode_time(self.leak_time)));
		}
		if self.burst {
			parts.push(format!("BURST({}) ", decode_time(self.burst_time)));
		}
		if parts.is_empty() {
			"OK".to_string()
		} else {
			parts.concat().trim_end().to_string()
		}
	}
}

fn decode_time_band(word: u16, index: u8) -> u8 {
	((word >> (4 + index * 3)) & 0b111) as u8
}

#[derive(Debug)]
pub struct Multical21 {
	pub model: &'static str,
	pub total_m3: Option<f64>,
	pub target_m3: Option<f64>,
	pub flow_temperature_c: Option<f64>,
	pub external_temperature_c: Option<f64>,
	pub info_codes: InfoCodes,
	status_text: String,
	fields: Vec<FieldDescriptor>,
}

impl Default for Multical21 {
	fn default() -> Self {
		Self {
			model: "multical21",
			total_m3: None,
			target_m3: None,
			flow_temperature_c: None,
			external_temperature_c: None,
			info_codes: InfoCodes::default(),
			status_text: String::new(),
			fields: Vec::new(),
		}
	}
}

impl Multical21 {
	/// FlowIQ3100 shares this struct and decode logic, distinguished only
	/// by the name it reports (selected by the registry on TPL version).
	pub fn with_model(model: &'static str) -> Self {
		Self { model, ..Self::default() }
	}
}

impl MeterDriver for Multical21 {
	fn driver_name(&self) -> &'static str {
		self.model
	}

	fn required_link_mode(&self) -> LinkModeSet {
		LinkModeSet::T1 | LinkModeSet::C1
	}

	fn process_content(&mut self, records: &RecordMap, _raw: &[u8]) {
		self.total_m3 = records.extract_f64_by_storage(Quantity::Volume, 0);
		self.target_m3 = records.extract_f64_by_storage(Quantity::Volume, 1);
		self.flow_temperature_c = records.extract_f64(Quantity::Temperature);
		self.external_temperature_c = records.extract_f64_by_storage(Quantity::Temperature, 1);
		self.info_codes = info_codes_word(records).map(InfoCodes::from_word).unwrap_or_default();

		self.fields.clear();
		if let Some(v) = self.total_m3 {
			self.fields.push(FieldDescriptor { name: "total", unit: Some(Unit::CubicMetre), value: FieldValue::Number(v) });
		}
		if let Some(v) = self.target_m3 {
			self.fields.push(FieldDescriptor { name: "target", unit: Some(Unit::CubicMetre), value: FieldValue::Number(v) });
		}
		if let Some(v) = self.flow_temperature_c {
			self.fields.push(FieldDescriptor {
				name: "flow_temperature",
				unit: Some(Unit::DegreesCelsius),
				value: FieldValue::Number(v),
			});
		}
		if let Some(v) = self.external_temperature_c {
			self.fields.push(FieldDescriptor {
				name: "external_temperature",
				unit: Some(Unit::DegreesCelsius),
				value: FieldValue::Number(v),
			});
		}
		self.status_text = self.info_codes.status_human_readable();
		self.fields.push(FieldDescriptor {
			name: "current_status",
			unit: None,
			value: FieldValue::Text(self.status_text.clone()),
		});
	}

	fn fields(&self) -> &[FieldDescriptor] {
		&self.fields
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parse::application_layer::{Frame, RecordMap};
	use winnow::Bytes;

	#[test]
	fn info_codes_are_read_from_the_02ff20_record_not_the_tail() {
		// 02 FF 20 (DIB binary(2), VIF manufacturer-specific, VIFE 0x20) data
		// 04 00 (leak bit set), followed by an unrelated 4-byte volume record
		// whose own trailing bytes must not be mistaken for the info-codes word.
		let payload = [0x02, 0xFF, 0x20, 0x04, 0x00, 0x04, 0x13, 0x78, 0x56, 0x34, 0x12];
		let bytes = Bytes::new(&payload);
		let mut input = &bytes;
		let frame = Frame::parse(&mut input).unwrap();
		let records = RecordMap::from_frame(frame);

		let word = info_codes_word(&records).unwrap();
		assert!(InfoCodes::from_word(word).leak);
		assert!(records.extract_f64(Quantity::Volume).is_some());
	}

	#[test]
	fn decodes_leak_bit_and_time_band() {
		let leak_flag: u16 = 0b0100; // bit 2
		let leak_time_band: u16 = 0b011; // "2-3 days", bits 10-12
		let word = leak_flag | (leak_time_band << 10);
		let codes = InfoCodes::from_word(word);
		assert!(codes.leak);
		assert_eq!(codes.status_human_readable(), "LEAK(2-3 days)");
	}

	#[test]
	fn all_clear_reports_ok() {
		let codes = InfoCodes::from_word(0);
		assert_eq!(codes.status_human_readable(), "OK");
	}
}
