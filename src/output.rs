// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Rendering a meter's latest decoded fields for display: tab-separated
//! human-readable, a raw field dump, and JSON. Grounded on
//! `original_source`'s `printer.cc`, generalised past its one hardcoded
//! water-meter layout onto any `MeterDriver`'s `fields()` list.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::drivers::FieldValue;
use crate::drivers::registry;
use crate::meter::Meter;

fn field_key(name: &str, unit: Option<crate::units::Unit>) -> String {
	match unit {
		Some(unit) => format!("{name}_{}", unit.symbol()),
		None => name.to_string(),
	}
}

fn format_value(value: &FieldValue) -> String {
	match value {
		FieldValue::Number(n) => format!("{n:.3}"),
		FieldValue::Text(t) => t.clone(),
	}
}

/// `name\tid\tfield=value\t...\ttimestamp`, the shape
/// `printMeterHumanReadable` produces for one meter family, generalised to
/// whatever fields the driver actually reports.
pub fn render_human_readable(meter: &Meter, timestamp: DateTime<Utc>) -> String {
	let mut parts = vec![meter.info.name.clone(), meter.last_telegram_id.clone().unwrap_or_default()];
	for field in meter.driver().fields() {
		parts.push(format!("{}={}", field.name, format_value(&field.value)));
	}
	parts.push(timestamp.to_rfc3339_opts(SecondsFormat::Secs, true));
	parts.join("\t")
}

/// `name=value` pairs for the selected fields (or every field the driver
/// reports, if `MeterInfo::selected_fields` is empty), `\t`-separated.
pub fn render_fields(meter: &Meter) -> String {
	let fields = meter.driver().fields();
	let selected = fields.iter().filter(|f| {
		meter.info.selected_fields.is_empty() || meter.info.selected_fields.iter().any(|s| s == f.name)
	});
	selected
		.map(|f| format!("{}={}", f.name, format_value(&f.value)))
		.collect::<Vec<_>>()
		.join("\t")
}

/// `{"media": ..., "meter": ..., "name": ..., "id": ..., "<field>_<unit>":
/// ..., "timestamp": "..."}`, following the key-per-field style
/// `printMeterJSON` used, plus whatever extra fields the meter's
/// configuration adds.
pub fn render_json(meter: &Meter, timestamp: DateTime<Utc>) -> String {
	let mut map = Map::new();
	let driver_name = meter.driver().driver_name();
	map.insert("media".to_string(), Value::String(registry::medium_for(driver_name).map_or("unknown", registry::Medium::label).to_string()));
	map.insert("meter".to_string(), Value::String(driver_name.to_string()));
	map.insert("name".to_string(), Value::String(meter.info.name.clone()));
	map.insert("id".to_string(), Value::String(meter.last_telegram_id.clone().unwrap_or_default()));

	for field in meter.driver().fields() {
		let key = field_key(field.name, field.unit);
		let value = match &field.value {
			FieldValue::Number(n) => Value::from(*n),
			FieldValue::Text(t) => Value::String(t.clone()),
		};
		map.insert(key, value);
	}
	for (k, v) in &meter.info.extra_json_fields {
		map.insert(k.clone(), Value::String(v.clone()));
	}
	map.insert("timestamp".to_string(), Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)));

	Value::Object(map).to_string()
}

/// Uppercase `METER_<FIELD>` environment variable pairs for the shell
/// hooks `MeterInfo::shell_hooks` lists.
pub fn shell_env_pairs(meter: &Meter) -> Vec<(String, String)> {
	let mut pairs = vec![
		("METER_NAME".to_string(), meter.info.name.clone()),
		("METER_ID".to_string(), meter.last_telegram_id.clone().unwrap_or_default()),
	];
	for field in meter.driver().fields() {
		pairs.push((format!("METER_{}", field.name.to_uppercase()), format_value(&field.value)));
	}
	pairs
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::meter::MeterInfo;
	use crate::parse::application_layer::{Frame, RecordMap};
	use chrono::TimeZone;

	fn processed_meter(driver_name: &str, id: &str) -> Meter {
		let info = MeterInfo::new("kitchen", driver_name, "*");
		let mut meter = Meter::new(info).unwrap();
		let frame = Frame { records: Vec::new(), more_data_follows: false, manufacturer_specific: Vec::new() };
		let records = RecordMap::from_frame(frame);
		meter.driver_mut_for_test().process_content(&records, &[]);
		meter.last_telegram_id = Some(id.to_string());
		meter
	}

	#[test]
	fn json_contains_media_meter_id_and_timestamp() {
		let meter = processed_meter("supercom587", "12345678");
		let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let json = render_json(&meter, ts);
		assert!(json.contains("\"media\":\"water\""));
		assert!(json.contains("\"meter\":\"supercom587\""));
		assert!(json.contains("\"id\":\"12345678\""));
		assert!(json.contains("\"timestamp\":\"2024-01-01T00:00:00Z\""));
	}

	#[test]
	fn shell_env_pairs_include_meter_name_and_id() {
		let meter = processed_meter("supercom587", "12345678");
		let pairs = shell_env_pairs(&meter);
		assert!(pairs.contains(&("METER_NAME".to_string(), "kitchen".to_string())));
		assert!(pairs.contains(&("METER_ID".to_string(), "12345678".to_string())));
	}
}
