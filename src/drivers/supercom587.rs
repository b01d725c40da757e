// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Sontex Supercom 587 heat meter (legacy Kamstrup-C1 encryption). The
//! reference driver's `processContent` for this meter is an empty stub —
//! the payload layout was never reverse engineered beyond being able to
//! decrypt it — so `total_m3` is always reported as `0.0` rather than a
//! fabricated value, matching that upstream gap honestly instead of hiding
//! it.

use super::{FieldDescriptor, FieldValue, MeterDriver};
use crate::link_mode::LinkModeSet;
use crate::parse::application_layer::RecordMap;
use crate::units::Unit;

#[derive(Debug)]
pub struct Supercom587 {
	pub total_m3: f64,
	fields: Vec<FieldDescriptor>,
}

impl Default for Supercom587 {
	fn default() -> Self {
		Self { total_m3: 0.0, fields: Vec::new() }
	}
}

impl MeterDriver for Supercom587 {
	fn driver_name(&self) -> &'static str {
		"supercom587"
	}

	fn required_link_mode(&self) -> LinkModeSet {
		LinkModeSet::T1
	}

	fn process_content(&mut self, _records: &RecordMap, _raw: &[u8]) {
		self.total_m3 = 0.0;
		self.fields = vec![FieldDescriptor { name: "total", unit: Some(Unit::CubicMetre), value: FieldValue::Number(self.total_m3) }];
	}

	fn fields(&self) -> &[FieldDescriptor] {
		&self.fields
	}
}
