// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Kamstrup Multical 302 heat meter. Like Multical21, exposes "this
//! period" and "last period" readings of the same quantity at storage 0/1,
//! plus flow/return temperatures.

use super::{FieldDescriptor, FieldValue, MeterDriver};
use crate::link_mode::LinkModeSet;
use crate::parse::application_layer::RecordMap;
use crate::units::{Quantity, Unit};

#[derive(Debug, Default)]
pub struct Multical302 {
	pub total_kwh: Option<f64>,
	pub target_kwh: Option<f64>,
	pub flow_temperature_c: Option<f64>,
	pub return_temperature_c: Option<f64>,
	fields: Vec<FieldDescriptor>,
}

impl MeterDriver for Multical302 {
	fn driver_name(&self) -> &'static str {
		"multical302"
	}

	fn required_link_mode(&self) -> LinkModeSet {
		LinkModeSet::C1
	}

	fn process_content(&mut self, records: &RecordMap, _raw: &[u8]) {
		self.total_kwh = records.extract_f64_by_storage(Quantity::Energy, 0).map(|wh| wh / 1000.0);
		self.target_kwh = records.extract_f64_by_storage(Quantity::Energy, 1).map(|wh| wh / 1000.0);
		self.flow_temperature_c = records.extract_f64(Quantity::Temperature);
		self.return_temperature_c = records.extract_f64_by_storage(Quantity::Temperature, 1);

		self.fields.clear();
		if let Some(v) = self.total_kwh {
			self.fields.push(FieldDescriptor {
				name: "total_energy_consumption",
				unit: Some(Unit::KilowattHour),
				value: FieldValue::Number(v),
			});
		}
		if let Some(v) = self.target_kwh {
			self.fields.push(FieldDescriptor {
				name: "target_energy_consumption",
				unit: Some(Unit::KilowattHour),
				value: FieldValue::Number(v),
			});
		}
		if let Some(v) = self.flow_temperature_c {
			self.fields.push(FieldDescriptor { name: "flow_temperature", unit: Some(Unit::DegreesCelsius), value: FieldValue::Number(v) });
		}
		if let Some(v) = self.return_temperature_c {
			self.fields.push(FieldDescriptor { name: "return_temperature", unit: Some(Unit::DegreesCelsius), value: FieldValue::Number(v) });
		}
	}

	fn fields(&self) -> &[FieldDescriptor] {
		&self.fields
	}
}
