// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Driver registry. Grounded on wmbusmeters' `LIST_OF_METERS` macro table
//! in `meters.h`, which pairs `(driver name, link mode, medium, type,
//! class)` tuples with a driver constructor; here that's a plain static
//! slice of `DriverEntry` plus three lookups (`to_driver`, `link_modes_for`,
//! `auto_detect`) instead of the X-macro/enum/vtable machinery the source
//! uses to avoid repeating the registration per meter.

use winnow::Bytes;

use super::{
	amiplus::AmiPlus, apator162::Apator162, iperl::Iperl, mkradio3::MkRadio3,
	multical21::Multical21, multical302::Multical302, omnipower::Omnipower, qcaloric::QCaloric,
	supercom587::Supercom587, vario451::Vario451, MeterDriver,
};
use crate::link_mode::LinkModeSet;
use crate::parse::transport_layer::header::DeviceType;
use crate::parse::transport_layer::manufacturer::pack_manufacturer;

const KAM: u16 = pack_manufacturer("KAM");
const APA: u16 = pack_manufacturer("APA");
const SON: u16 = pack_manufacturer("SON");
const TCH: u16 = pack_manufacturer("TCH");
const AMT: u16 = pack_manufacturer("AMT");
const ZRM: u16 = pack_manufacturer("ZRM");
const QDS: u16 = pack_manufacturer("QDS");

/// The broad utility category a driver reads, for `auto_detect`'s medium
/// cross-check. Coarser than `DeviceType`, which distinguishes e.g. hot vs
/// cold water meters that every driver in this table treats the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medium {
	Water,
	Heat,
	Electricity,
	HeatCostAllocation,
}

impl Medium {
	pub fn label(self) -> &'static str {
		match self {
			Self::Water => "water",
			Self::Heat => "heat",
			Self::Electricity => "electricity",
			Self::HeatCostAllocation => "heat_cost_allocation",
		}
	}
}

fn medium_of(device_type: &DeviceType) -> Option<Medium> {
	Some(match device_type {
		DeviceType::WaterMeter(_) | DeviceType::WaterDataLogger => Medium::Water,
		DeviceType::ThermalEnergyMeter(_) => Medium::Heat,
		DeviceType::ElectricityMeter => Medium::Electricity,
		DeviceType::HeatCostAllocator => Medium::HeatCostAllocation,
		_ => return None,
	})
}

#[derive(Debug, Clone, Copy)]
pub enum VersionMatch {
	Any,
	Exact(u8),
	OneOf(&'static [u8]),
}

impl VersionMatch {
	fn matches(self, version: u8) -> bool {
		match self {
			Self::Any => true,
			Self::Exact(v) => v == version,
			Self::OneOf(vs) => vs.contains(&version),
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub struct DriverEntry {
	pub name: &'static str,
	pub link_modes: LinkModeSet,
	pub medium: Medium,
	pub manufacturer: u16,
	pub version: VersionMatch,
}

/// One entry per driver in `drivers::mod`, manufacturer/version signatures
/// taken from wmbusmeters' per-meter source files.
pub static DRIVER_TABLE: &[DriverEntry] = &[
	DriverEntry { name: "multical21", link_modes: LinkModeSet::C1, medium: Medium::Water, manufacturer: KAM, version: VersionMatch::Exact(0x1b) },
	DriverEntry { name: "flowiq3100", link_modes: LinkModeSet::C1, medium: Medium::Water, manufacturer: KAM, version: VersionMatch::Exact(0x1d) },
	DriverEntry { name: "multical302", link_modes: LinkModeSet::C1, medium: Medium::Heat, manufacturer: KAM, version: VersionMatch::Exact(0x16) },
	DriverEntry { name: "omnipower", link_modes: LinkModeSet::C1, medium: Medium::Electricity, manufacturer: KAM, version: VersionMatch::Exact(0x0f) },
	DriverEntry { name: "apator162", link_modes: LinkModeSet::T1, medium: Medium::Water, manufacturer: APA, version: VersionMatch::Exact(0x05) },
	DriverEntry { name: "amiplus", link_modes: LinkModeSet::T1, medium: Medium::Electricity, manufacturer: APA, version: VersionMatch::Any },
	DriverEntry { name: "supercom587", link_modes: LinkModeSet::T1, medium: Medium::Water, manufacturer: SON, version: VersionMatch::Exact(0x0d) },
	DriverEntry { name: "vario451", link_modes: LinkModeSet::T1, medium: Medium::Heat, manufacturer: TCH, version: VersionMatch::OneOf(&[0x40, 0x43]) },
	DriverEntry { name: "iperl", link_modes: LinkModeSet::T1, medium: Medium::Water, manufacturer: AMT, version: VersionMatch::Any },
	DriverEntry { name: "mkradio3", link_modes: LinkModeSet::T1, medium: Medium::Water, manufacturer: ZRM, version: VersionMatch::Any },
	DriverEntry { name: "qcaloric", link_modes: LinkModeSet::C1, medium: Medium::HeatCostAllocation, manufacturer: QDS, version: VersionMatch::Any },
];

/// Constructs a fresh, empty driver instance by name, ready for
/// `process_content`.
pub fn to_driver(name: &str) -> Option<Box<dyn MeterDriver>> {
	Some(match name {
		"multical21" => Box::new(Multical21::default()),
		"flowiq3100" => Box::new(Multical21::with_model("flowiq3100")),
		"multical302" => Box::new(Multical302::default()),
		"omnipower" => Box::new(Omnipower::default()),
		"apator162" => Box::new(Apator162::default()),
		"amiplus" => Box::new(AmiPlus::default()),
		"supercom587" => Box::new(Supercom587::default()),
		"vario451" => Box::new(Vario451::default()),
		"iperl" => Box::new(Iperl::default()),
		"mkradio3" => Box::new(MkRadio3::default()),
		"qcaloric" => Box::new(QCaloric::default()),
		_ => return None,
	})
}

/// The link modes a named driver's meters are expected to transmit on.
pub fn link_modes_for(name: &str) -> Option<LinkModeSet> {
	DRIVER_TABLE.iter().find(|e| e.name == name).map(|e| e.link_modes)
}

/// All driver names whose `(manufacturer, medium, version)` signature
/// matches a telegram's header fields, for suggesting a driver when the
/// user hasn't picked one. `medium_byte` is the raw TPL/DLL device-type
/// byte.
pub fn auto_detect(manufacturer: u16, medium_byte: u8, version: u8) -> Vec<&'static str> {
	let byte = [medium_byte];
	let bytes = Bytes::new(&byte);
	let mut input = &bytes;
	let Ok(device_type) = DeviceType::parse(&mut input) else {
		return Vec::new();
	};
	let medium = medium_of(&device_type);

	DRIVER_TABLE
		.iter()
		.filter(|e| e.manufacturer == manufacturer && e.version.matches(version))
		.filter(|e| medium.map_or(true, |m| m == e.medium))
		.map(|e| e.name)
		.collect()
}

/// Looks up the driver for a meter by manufacturer code and TPL version
/// byte directly, without going through a medium check — the
/// `(manufacturer, version)` pair alone disambiguates every meter in this
/// table.
pub fn lookup(manufacturer: u16, version: u8) -> Option<Box<dyn MeterDriver>> {
	let entry = DRIVER_TABLE
		.iter()
		.find(|e| e.manufacturer == manufacturer && e.version.matches(version))?;
	to_driver(entry.name)
}

/// The medium category a named driver reads, for JSON rendering's
/// `"media"` field.
pub fn medium_for(name: &str) -> Option<Medium> {
	DRIVER_TABLE.iter().find(|e| e.name == name).map(|e| e.medium)
}

/// All driver names this registry can construct, for `--list-drivers`
/// style tooling.
pub const DRIVER_NAMES: &[&str] = &[
	"multical21",
	"flowiq3100",
	"multical302",
	"omnipower",
	"apator162",
	"amiplus",
	"supercom587",
	"vario451",
	"iperl",
	"mkradio3",
	"qcaloric",
];

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn finds_multical21_by_manufacturer_and_version() {
		let driver = lookup(KAM, 0x1b).expect("driver should be found");
		assert_eq!(driver.driver_name(), "multical21");
	}

	#[test]
	fn unknown_manufacturer_yields_none() {
		assert!(lookup(0xFFFF, 0x00).is_none());
	}

	#[test]
	fn to_driver_matches_table_names() {
		for entry in DRIVER_TABLE {
			assert!(to_driver(entry.name).is_some(), "missing constructor for {}", entry.name);
		}
	}

	#[test]
	fn link_modes_for_known_driver() {
		assert_eq!(link_modes_for("omnipower"), Some(LinkModeSet::C1));
		assert_eq!(link_modes_for("nonexistent"), None);
	}

	#[test]
	fn auto_detect_finds_multical21_for_cold_water() {
		let names = auto_detect(KAM, 0x16, 0x1b);
		assert!(names.contains(&"multical21"));
	}

	#[test]
	fn auto_detect_excludes_wrong_medium() {
		// version 0x1b belongs to multical21 (water), not a heat device.
		let names = auto_detect(KAM, 0x04, 0x1b);
		assert!(!names.contains(&"multical21"));
	}
}
