// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2
#![allow(dead_code)]

//! Turns a parsed `Frame`'s flat `Vec<Record>` into a keyed map drivers can
//! query by quantity, the way `original_source`'s `MeterCommonImplementation`
//! keeps a `map<string,DVEntry>` keyed by the record's DIB+VIB header bytes.

use std::collections::BTreeMap;

use crate::parse::types::DataType;
use crate::units::Quantity;

use super::frame::Frame;
use super::record::Record;
use super::vib::ValueType;

#[derive(Debug)]
pub struct RecordMap {
	records: BTreeMap<String, Record>,
	order: Vec<String>,
}

impl RecordMap {
	pub fn from_frame(frame: Frame) -> Self {
		let mut records = BTreeMap::new();
		let mut order = Vec::new();
		for (i, record) in frame.records.into_iter().enumerate() {
			let mut key = record_key(&record);
			if records.contains_key(&key) {
				key = format!("{key}_{i}");
				log::debug!("duplicate record key, disambiguated as {key}");
			}
			order.push(key.clone());
			records.insert(key, record);
		}
		Self { records, order }
	}

	pub fn get(&self, key: &str) -> Option<&Record> {
		self.records.get(key)
	}

	/// Finds the first record (in parse order, lowest storage number
	/// first) whose VIF maps onto `quantity`.
	pub fn find(&self, quantity: Quantity) -> Option<&Record> {
		let mut candidates: Vec<&Record> = self
			.order
			.iter()
			.filter_map(|key| self.records.get(key))
			.filter(|record| quantity_of(&record.vib.value_type) == Some(quantity))
			.collect();
		candidates.sort_by_key(|record| record.dib.storage);
		candidates.into_iter().next()
	}

	pub fn extract_f64(&self, quantity: Quantity) -> Option<f64> {
		self.find(quantity).and_then(|record| raw_value_as_f64(record))
	}

	/// Like `find`, but selects the record at a specific DIB storage number
	/// rather than the lowest one — meters like Multical21 report "this
	/// month" at storage 0 and "last month" at storage 1 using the same VIF.
	pub fn find_by_storage(&self, quantity: Quantity, storage: u64) -> Option<&Record> {
		self.order
			.iter()
			.filter_map(|key| self.records.get(key))
			.find(|record| quantity_of(&record.vib.value_type) == Some(quantity) && record.dib.storage == storage)
	}

	pub fn extract_f64_by_storage(&self, quantity: Quantity, storage: u64) -> Option<f64> {
		self.find_by_storage(quantity, storage).and_then(raw_value_as_f64)
	}

	/// Finds a manufacturer-specific record (VIF `0xFF`) whose first VIFE
	/// byte is `vife` — how vendor extensions like Multical21's `02FF20`
	/// info-codes word are addressed, since they carry no VIF a `Quantity`
	/// maps onto.
	pub fn find_manufacturer_specific(&self, vife: u8) -> Option<&Record> {
		self.order
			.iter()
			.filter_map(|key| self.records.get(key))
			.find(|record| {
				matches!(record.vib.value_type, ValueType::ManufacturerSpecific)
					&& record.vib.extra_vifes.as_deref().and_then(|vifes| vifes.first()) == Some(&vife)
			})
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

fn record_key(record: &Record) -> String {
	format!(
		"{:?}_{}_{}_{}",
		std::mem::discriminant(&record.vib.value_type),
		record.dib.storage,
		record.dib.tariff,
		record.dib.device
	)
}

fn quantity_of(value_type: &ValueType) -> Option<Quantity> {
	Some(match value_type {
		ValueType::Volume(..) => Quantity::Volume,
		ValueType::VolumeFlow(..) => Quantity::Flow,
		ValueType::Energy(..) | ValueType::ReactiveEnergy(..) | ValueType::ApparentEnergy(..) => {
			Quantity::Energy
		}
		ValueType::Power(..) | ValueType::ReactivePower(..) | ValueType::ApparentPower(..) => {
			Quantity::Power
		}
		ValueType::FlowTemperature(..) | ValueType::ReturnTemperature(..) | ValueType::ExternalTemperature(..) => {
			Quantity::Temperature
		}
		ValueType::RelativeHumidity(..) => Quantity::RelativeHumidity,
		ValueType::Pressure(..) => Quantity::Pressure,
		ValueType::HCA => Quantity::HeatCostAllocation,
		ValueType::Mass(..) => Quantity::Mass,
		ValueType::MassFlow(..) => Quantity::MassFlow,
		ValueType::Frequency(..) => Quantity::Frequency,
		ValueType::Volts(..) => Quantity::Voltage,
		ValueType::Amperes(..) => Quantity::Current,
		_ => return None,
	})
}

fn exponent_of(value_type: &ValueType) -> i8 {
	match value_type {
		ValueType::Volume(_, e)
		| ValueType::Energy(_, e)
		| ValueType::Power(_, e)
		| ValueType::Mass(_, e)
		| ValueType::VolumeFlow(_, e)
		| ValueType::MassFlow(_, e)
		| ValueType::FlowTemperature(e)
		| ValueType::ReturnTemperature(e)
		| ValueType::ExternalTemperature(e)
		| ValueType::RelativeHumidity(e)
		| ValueType::Pressure(e)
		| ValueType::Frequency(e)
		| ValueType::Volts(e)
		| ValueType::Amperes(e)
		| ValueType::ReactiveEnergy(e)
		| ValueType::ApparentEnergy(e)
		| ValueType::ReactivePower(e)
		| ValueType::ApparentPower(e) => *e,
		_ => 0,
	}
}

fn raw_value_as_f64(record: &Record) -> Option<f64> {
	let mantissa = match &record.data {
		DataType::Signed(v) => *v as f64,
		DataType::Unsigned(v) => *v as f64,
		DataType::Real(v) => *v as f64,
		_ => return None,
	};
	let exponent = exponent_of(&record.vib.value_type);
	Some(mantissa * 10f64.powi(exponent as i32))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_frame_has_no_records() {
		let frame = Frame {
			records: Vec::new(),
			more_data_follows: false,
			manufacturer_specific: Vec::new(),
		};
		let map = RecordMap::from_frame(frame);
		assert!(map.is_empty());
	}
}
