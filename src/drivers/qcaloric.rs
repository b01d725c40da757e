// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Qundis QCaloric heat cost allocator. Same shape as `mkradio3`: a single
//! unitless accumulated index.

use super::{FieldDescriptor, FieldValue, MeterDriver};
use crate::link_mode::LinkModeSet;
use crate::parse::application_layer::RecordMap;
use crate::units::Quantity;

#[derive(Debug, Default)]
pub struct QCaloric {
	pub current_hca: Option<f64>,
	fields: Vec<FieldDescriptor>,
}

impl MeterDriver for QCaloric {
	fn driver_name(&self) -> &'static str {
		"qcaloric"
	}

	fn required_link_mode(&self) -> LinkModeSet {
		LinkModeSet::C1
	}

	fn process_content(&mut self, records: &RecordMap, _raw: &[u8]) {
		self.current_hca = records.extract_f64(Quantity::HeatCostAllocation);

		self.fields.clear();
		if let Some(v) = self.current_hca {
			self.fields.push(FieldDescriptor { name: "current_hca", unit: None, value: FieldValue::Number(v) });
		}
	}

	fn fields(&self) -> &[FieldDescriptor] {
		&self.fields
	}
}
