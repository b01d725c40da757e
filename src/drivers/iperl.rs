// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Aquametro/Elster Iperl water meter. Standard DIB/VIB records, no vendor
//! quirks beyond needing mode 5 confidentiality — total volume plus the
//! max-flow record the meter reports alongside it.

use super::{FieldDescriptor, FieldValue, MeterDriver};
use crate::link_mode::LinkModeSet;
use crate::parse::application_layer::RecordMap;
use crate::units::{Quantity, Unit};

#[derive(Debug, Default)]
pub struct Iperl {
	pub total_m3: Option<f64>,
	pub max_flow_m3h: Option<f64>,
	fields: Vec<FieldDescriptor>,
}

impl MeterDriver for Iperl {
	fn driver_name(&self) -> &'static str {
		"iperl"
	}

	fn required_link_mode(&self) -> LinkModeSet {
		LinkModeSet::T1
	}

	fn process_content(&mut self, records: &RecordMap, _raw: &[u8]) {
		self.total_m3 = records.extract_f64(Quantity::Volume);
		self.max_flow_m3h = records.extract_f64(Quantity::Flow);

		self.fields.clear();
		if let Some(v) = self.total_m3 {
			self.fields.push(FieldDescriptor { name: "total", unit: Some(Unit::CubicMetre), value: FieldValue::Number(v) });
		}
		if let Some(v) = self.max_flow_m3h {
			self.fields.push(FieldDescriptor { name: "max_flow", unit: Some(Unit::CubicMetrePerHour), value: FieldValue::Number(v) });
		}
	}

	fn fields(&self) -> &[FieldDescriptor] {
		&self.fields
	}
}
