// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Apator AMIplus electricity meter. Reports cumulative active energy plus
//! instantaneous power; standard DIB/VIB, no vendor-specific payload quirks.

use super::{FieldDescriptor, FieldValue, MeterDriver};
use crate::link_mode::LinkModeSet;
use crate::parse::application_layer::RecordMap;
use crate::units::{Quantity, Unit};

#[derive(Debug, Default)]
pub struct AmiPlus {
	pub total_kwh: Option<f64>,
	pub current_power_kw: Option<f64>,
	fields: Vec<FieldDescriptor>,
}

impl MeterDriver for AmiPlus {
	fn driver_name(&self) -> &'static str {
		"amiplus"
	}

	fn required_link_mode(&self) -> LinkModeSet {
		LinkModeSet::T1 | LinkModeSet::C1
	}

	fn process_content(&mut self, records: &RecordMap, _raw: &[u8]) {
		self.total_kwh = records.extract_f64(Quantity::Energy).map(|wh| wh / 1000.0);
		self.current_power_kw = records.extract_f64(Quantity::Power).map(|w| w / 1000.0);

		self.fields.clear();
		if let Some(v) = self.total_kwh {
			self.fields.push(FieldDescriptor {
				name: "total_energy_consumption",
				unit: Some(Unit::KilowattHour),
				value: FieldValue::Number(v),
			});
		}
		if let Some(v) = self.current_power_kw {
			self.fields.push(FieldDescriptor {
				name: "current_power_consumption",
				unit: Some(Unit::Kilowatt),
				value: FieldValue::Number(v),
			});
		}
	}

	fn fields(&self) -> &[FieldDescriptor] {
		&self.fields
	}
}
