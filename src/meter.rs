// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Per-meter configuration and live state. `original_source`'s `Meter`
//! interface mixes static configuration (name, driver, key, shell hooks)
//! with live decoded state behind C++ virtual inheritance; here that's
//! split into `MeterInfo` (what the user configured) and `Meter` (what's
//! been decoded so far), with dispatch going through `MeterDriver` instead
//! of a vtable.

use crate::drivers::registry;
use crate::drivers::MeterDriver;
use crate::keys::MeterKeys;
use crate::telegram::Telegram;

/// One element of a meter's ID match list: either an exact decimal ID
/// string, or `*` to accept any ID for that driver — useful when scanning
/// for an as-yet-unidentified meter's real ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdMatch {
	Exact(String),
	Any,
}

impl IdMatch {
	pub fn parse(expr: &str) -> Self {
		if expr == "*" {
			Self::Any
		} else {
			Self::Exact(expr.to_string())
		}
	}

	pub fn matches(&self, id: &str) -> bool {
		match self {
			Self::Any => true,
			Self::Exact(expected) => expected == id,
		}
	}
}

/// Static, user-chosen configuration for one meter: one stanza of a
/// `wmbusmeters.conf`-style meter list.
#[derive(Debug, Clone)]
pub struct MeterInfo {
	pub name: String,
	pub driver_name: String,
	pub id_matches: Vec<IdMatch>,
	pub keys: MeterKeys,
	/// Shell commands run after each accepted telegram; invoked with the
	/// environment pairs `output::shell_env_pairs` produces.
	pub shell_hooks: Vec<String>,
	/// Arbitrary extra `key=value` fields merged into this meter's JSON
	/// output, for site-specific metadata the driver doesn't know about.
	pub extra_json_fields: Vec<(String, String)>,
	/// Field names to include in rendered output; empty means "every
	/// field the driver reports".
	pub selected_fields: Vec<String>,
}

impl MeterInfo {
	pub fn new(name: impl Into<String>, driver_name: impl Into<String>, id_match: &str) -> Self {
		Self {
			name: name.into(),
			driver_name: driver_name.into(),
			id_matches: vec![IdMatch::parse(id_match)],
			keys: MeterKeys::none(),
			shell_hooks: Vec::new(),
			extra_json_fields: Vec::new(),
			selected_fields: Vec::new(),
		}
	}

	pub fn matches_id(&self, id: &str) -> bool {
		self.id_matches.iter().any(|m| m.matches(id))
	}
}

/// A live meter instance: static configuration plus whatever the most
/// recently accepted telegram decoded into its driver.
pub struct Meter {
	pub info: MeterInfo,
	driver: Box<dyn MeterDriver>,
	pub last_telegram_id: Option<String>,
	pub update_count: u64,
}

impl Meter {
	/// Builds a live meter from its configuration, failing only if
	/// `info.driver_name` names no known driver.
	pub fn new(info: MeterInfo) -> Option<Self> {
		let driver = registry::to_driver(&info.driver_name)?;
		Some(Self { info, driver, last_telegram_id: None, update_count: 0 })
	}

	/// Whether `telegram` should be routed to this meter: the ID must
	/// match one of the configured expressions. A manufacturer/version
	/// mismatch against the configured driver is logged but does not
	/// reject the telegram — meters in the wild occasionally mislabel.
	pub fn accepts(&self, telegram: &Telegram) -> bool {
		if !self.info.matches_id(&telegram.id()) {
			return false;
		}

		let candidates = registry::auto_detect(telegram.dll.manufacturer, telegram.dll.device_type_raw, telegram.dll.version);
		if !candidates.is_empty() && !candidates.contains(&self.info.driver_name.as_str()) {
			log::warn!(
				"meter '{}' configured as driver '{}' but telegram from id {} looks like {:?}",
				self.info.name,
				self.info.driver_name,
				telegram.id(),
				candidates,
			);
		}
		true
	}

	/// Runs the driver over an accepted telegram's records, updating this
	/// meter's live field values.
	pub fn process(&mut self, telegram: &Telegram) {
		self.driver.process_content(&telegram.records, &telegram.decrypted_apl);
		self.last_telegram_id = Some(telegram.id());
		self.update_count += 1;
	}

	pub fn driver(&self) -> &dyn MeterDriver {
		self.driver.as_ref()
	}

	#[cfg(test)]
	pub fn driver_mut_for_test(&mut self) -> &mut dyn MeterDriver {
		self.driver.as_mut()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wildcard_matches_any_id() {
		let info = MeterInfo::new("kitchen", "multical21", "*");
		assert!(info.matches_id("12345678"));
		assert!(info.matches_id("00000000"));
	}

	#[test]
	fn exact_match_requires_equality() {
		let info = MeterInfo::new("kitchen", "multical21", "12345678");
		assert!(info.matches_id("12345678"));
		assert!(!info.matches_id("87654321"));
	}

	#[test]
	fn unknown_driver_name_fails_construction() {
		let info = MeterInfo::new("kitchen", "no-such-driver", "*");
		assert!(Meter::new(info).is_none());
	}
}
