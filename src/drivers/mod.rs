// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Meter drivers. `original_source`'s `Meter` interface hierarchy
//! (`Meter` → `WaterMeter`/`HeatMeter`/`ElectricityMeter`/`HeatCostMeter`,
//! via C++ virtual multiple inheritance) collapses here into one
//! `MeterDriver` trait plus a `FieldDescriptor` list each driver publishes —
//! callers discover what a driver can report by walking `fields()` rather
//! than calling a `hasTotalWaterConsumption()`-style probe per quantity.

pub mod amiplus;
pub mod apator162;
pub mod iperl;
pub mod mkradio3;
pub mod multical21;
pub mod multical302;
pub mod omnipower;
pub mod qcaloric;
pub mod registry;
pub mod supercom587;
pub mod vario451;

use crate::link_mode::LinkModeSet;
use crate::parse::application_layer::RecordMap;
use crate::units::Unit;

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
	pub name: &'static str,
	pub unit: Option<Unit>,
	pub value: FieldValue,
}

#[derive(Debug, Clone)]
pub enum FieldValue {
	Number(f64),
	Text(String),
}

pub trait MeterDriver {
	fn driver_name(&self) -> &'static str;
	fn required_link_mode(&self) -> LinkModeSet;
	/// Reads whatever quantities this driver understands out of the parsed
	/// application-layer records (already decrypted, if encryption applies)
	/// plus the raw post-DIB/VIB bytes, for drivers that need to fall back
	/// to fixed-offset extraction (Apator162).
	fn process_content(&mut self, records: &RecordMap, raw: &[u8]);
	fn fields(&self) -> &[FieldDescriptor];
}
