// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2
#![allow(dead_code)]

//! Quantities and their units, independent of how a VIF byte spelled them.
//! `crate::parse::application_layer::vib::ValueType` answers "what unit did
//! this record's VIF byte encode"; `Quantity` answers "what physical thing
//! is that", so drivers can ask for "the volume record" without caring
//! whether the telegram expressed it in m³, feet³ or litres.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
	Volume,
	Flow,
	Energy,
	Power,
	Temperature,
	RelativeHumidity,
	Pressure,
	HeatCostAllocation,
	Mass,
	MassFlow,
	Frequency,
	Voltage,
	Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
	CubicMetre,
	CubicFeet,
	Litre,
	CubicMetrePerHour,
	CubicMetrePerMinute,
	CubicMetrePerSecond,
	WattHour,
	KilowattHour,
	MegawattHour,
	Joule,
	Gigajoule,
	Megacalorie,
	Watt,
	Kilowatt,
	Megawatt,
	DegreesCelsius,
	Kelvin,
	Percent,
	Bar,
	Kilogram,
	Tonne,
	KilogramPerHour,
	Hertz,
	Volt,
	Ampere,
}

impl Unit {
	/// Factor to multiply a raw value in this unit by to get the quantity's
	/// canonical SI-ish unit (m³, Wh, W, °C, %, bar, kg, kg/h, Hz, V, A).
	fn factor_to_canonical(self) -> f64 {
		match self {
			Unit::CubicMetre => 1.0,
			Unit::CubicFeet => 0.0283_168_46,
			Unit::Litre => 0.001,
			Unit::CubicMetrePerHour => 1.0,
			Unit::CubicMetrePerMinute => 60.0,
			Unit::CubicMetrePerSecond => 3600.0,
			Unit::WattHour => 1.0,
			Unit::KilowattHour => 1000.0,
			Unit::MegawattHour => 1_000_000.0,
			Unit::Joule => 1.0 / 3_600.0,
			Unit::Gigajoule => 1_000_000_000.0 / 3_600.0,
			Unit::Megacalorie => 1.163,
			Unit::Watt => 1.0,
			Unit::Kilowatt => 1000.0,
			Unit::Megawatt => 1_000_000.0,
			Unit::DegreesCelsius => 1.0,
			Unit::Kelvin => 1.0,
			Unit::Percent => 1.0,
			Unit::Bar => 1.0,
			Unit::Kilogram => 1.0,
			Unit::Tonne => 1000.0,
			Unit::KilogramPerHour => 1.0,
			Unit::Hertz => 1.0,
			Unit::Volt => 1.0,
			Unit::Ampere => 1.0,
		}
	}

	pub fn quantity(self) -> Quantity {
		match self {
			Unit::CubicMetre | Unit::CubicFeet | Unit::Litre => Quantity::Volume,
			Unit::CubicMetrePerHour | Unit::CubicMetrePerMinute | Unit::CubicMetrePerSecond => {
				Quantity::Flow
			}
			Unit::WattHour | Unit::KilowattHour | Unit::MegawattHour | Unit::Joule | Unit::Gigajoule | Unit::Megacalorie => {
				Quantity::Energy
			}
			Unit::Watt | Unit::Kilowatt | Unit::Megawatt => Quantity::Power,
			Unit::DegreesCelsius | Unit::Kelvin => Quantity::Temperature,
			Unit::Percent => Quantity::RelativeHumidity,
			Unit::Bar => Quantity::Pressure,
			Unit::Kilogram | Unit::Tonne => Quantity::Mass,
			Unit::KilogramPerHour => Quantity::MassFlow,
			Unit::Hertz => Quantity::Frequency,
			Unit::Volt => Quantity::Voltage,
			Unit::Ampere => Quantity::Current,
		}
	}

	pub fn symbol(self) -> &'static str {
		match self {
			Unit::CubicMetre => "m3",
			Unit::CubicFeet => "feet3",
			Unit::Litre => "l",
			Unit::CubicMetrePerHour => "m3/h",
			Unit::CubicMetrePerMinute => "m3/min",
			Unit::CubicMetrePerSecond => "m3/s",
			Unit::WattHour => "Wh",
			Unit::KilowattHour => "kWh",
			Unit::MegawattHour => "MWh",
			Unit::Joule => "J",
			Unit::Gigajoule => "GJ",
			Unit::Megacalorie => "MCal",
			Unit::Watt => "W",
			Unit::Kilowatt => "kW",
			Unit::Megawatt => "MW",
			Unit::DegreesCelsius => "C",
			Unit::Kelvin => "K",
			Unit::Percent => "%RH",
			Unit::Bar => "bar",
			Unit::Kilogram => "kg",
			Unit::Tonne => "t",
			Unit::KilogramPerHour => "kg/h",
			Unit::Hertz => "Hz",
			Unit::Volt => "V",
			Unit::Ampere => "A",
		}
	}
}

/// Converts `value` expressed in `from` into the equivalent value in `to`.
/// Returns `None` if the two units don't belong to the same quantity.
pub fn convert(value: f64, from: Unit, to: Unit) -> Option<f64> {
	if from.quantity() != to.quantity() {
		return None;
	}
	let canonical = value * from.factor_to_canonical();
	Some(canonical / to.factor_to_canonical())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn litres_to_cubic_metres() {
		assert_eq!(convert(1000.0, Unit::Litre, Unit::CubicMetre), Some(1.0));
	}

	#[test]
	fn wh_to_kwh() {
		assert_eq!(convert(1000.0, Unit::WattHour, Unit::KilowattHour), Some(1.0));
	}

	#[test]
	fn mismatched_quantity_rejected() {
		assert_eq!(convert(1.0, Unit::Litre, Unit::Watt), None);
	}

	#[test]
	fn round_trip_is_involutive() {
		let v = 42.0;
		let back = convert(convert(v, Unit::CubicMetre, Unit::Litre).unwrap(), Unit::Litre, Unit::CubicMetre).unwrap();
		assert!((back - v).abs() < 1e-9);
	}
}
