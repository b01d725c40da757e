// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Techem MK Radio 3 water meter. Standard DIB/VIB volume record, no vendor
//! quirks beyond the usual mode 5 confidentiality.

use super::{FieldDescriptor, FieldValue, MeterDriver};
use crate::link_mode::LinkModeSet;
use crate::parse::application_layer::RecordMap;
use crate::units::{Quantity, Unit};

#[derive(Debug, Default)]
pub struct MkRadio3 {
	pub total_m3: Option<f64>,
	fields: Vec<FieldDescriptor>,
}

impl MeterDriver for MkRadio3 {
	fn driver_name(&self) -> &'static str {
		"mkradio3"
	}

	fn required_link_mode(&self) -> LinkModeSet {
		LinkModeSet::T1
	}

	fn process_content(&mut self, records: &RecordMap, _raw: &[u8]) {
		self.total_m3 = records.extract_f64(Quantity::Volume);

		self.fields.clear();
		if let Some(v) = self.total_m3 {
			self.fields.push(FieldDescriptor { name: "total", unit: Some(Unit::CubicMetre), value: FieldValue::Number(v) });
		}
	}

	fn fields(&self) -> &[FieldDescriptor] {
		&self.fields
	}
}
