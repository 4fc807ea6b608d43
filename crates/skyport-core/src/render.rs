//! Exposition-format rendering of one thermostat record.
//!
//! Each metric is one `# HELP` line followed by one sample line labelled
//! with the thermostat name. Which fields are exported, and how they are
//! described, is the [`THERMOSTAT_METRICS`] table.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde_json::Value;

use skyport_api::DeviceRecord;

pub const METRIC_PREFIX: &str = "home_thermostat_";

/// Label carrying the configured thermostat name on every sample.
pub const THERMOSTAT_LABEL: &str = "thermostat_name";

/// Gauge with the Unix time the snapshot was rendered.
pub const LAST_UPDATE_METRIC: &str = "home_thermostat_last_update_timestamp_seconds";

/// One exported device field.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    /// Vendor field name; also the metric name suffix.
    pub field: &'static str,
    pub help: &'static str,
}

impl MetricDef {
    const fn new(field: &'static str, help: &'static str) -> Self {
        Self { field, help }
    }
}

pub const THERMOSTAT_METRICS: &[MetricDef] = &[
    MetricDef::new(
        "setpointMinimum",
        "Minimum temperature threshold supported by the system in 0.1 degree Celsius",
    ),
    MetricDef::new("fan", "System fan (0: auto 1: on)"),
    MetricDef::new("humIndoor", "Current indoor humidity percentage"),
    MetricDef::new(
        "modeLimit",
        "Thermostat mode limits (0: none 1: all 2: heat only 3: cool only)",
    ),
    MetricDef::new(
        "tempOutdoor",
        "Current outdoor temperature. 0.1 degrees Celsius increments",
    ),
    MetricDef::new(
        "mode",
        "Thermostat mode (0: off 1: heat 2: cool 3: auto 4: emergency heat)",
    ),
    MetricDef::new(
        "setpointMaximum",
        "Maximum temperature threshold supported by the system in 0.1 degree Celsius",
    ),
    MetricDef::new(
        "coolSetpoint",
        "Cooling threshold for the \"Manual\" operating mode in 0.1 degree Celsius",
    ),
    MetricDef::new(
        "heatSetpoint",
        "Heating threshold for the \"Manual\" operating mode in 0.1 degree Celsius",
    ),
    MetricDef::new(
        "fanCirculateSpeed",
        "Speed at which fan should run when circulating on a schedule (0: low 1: medium 2: high)",
    ),
    MetricDef::new(
        "equipmentStatus",
        "HVAC equipment status (1: cool 2: overcool for dehum 3: heat 4: fan 5: idle)",
    ),
    MetricDef::new("humOutdoor", "Current outdoor humidity in percentage"),
    MetricDef::new(
        "tempIndoor",
        "Current indoor temperature. 0.1 degrees Celsius increments",
    ),
    MetricDef::new(
        "setpointDelta",
        "Minimum temperature delta in 0.1 degree Celsius increments",
    ),
    MetricDef::new(
        "equipmentCommunication",
        "Communication status between the thermostat and the HVAC equipment",
    ),
    MetricDef::new(
        "fanCirculate",
        "Run the fan on a schedule (0: off 1: always on 2: on a schedule)",
    ),
    MetricDef::new(
        "modeEmHeatAvailable",
        "Emergency heat is available as a system mode (0: not available 1: available)",
    ),
    MetricDef::new("geofencingEnabled", "Status of the geofencing feature"),
    MetricDef::new("scheduleEnabled", "Enable schedule operation"),
];

/// Render `record` for the thermostat called `thermostat`.
///
/// Fields missing from the record, or holding something other than a
/// number, boolean or numeric string, are left out.
pub fn render(thermostat: &str, record: &DeviceRecord, rendered_at: DateTime<Utc>) -> String {
    let label = escape_label_value(thermostat);
    let mut out = String::new();

    for def in THERMOSTAT_METRICS {
        let Some(value) = record.get(def.field).and_then(sample_value) else {
            continue;
        };
        let _ = writeln!(out, "# HELP {METRIC_PREFIX}{} {}", def.field, def.help);
        let _ = writeln!(
            out,
            "{METRIC_PREFIX}{}{{{THERMOSTAT_LABEL}=\"{label}\"}} {value}",
            def.field
        );
    }

    let _ = writeln!(
        out,
        "# HELP {LAST_UPDATE_METRIC} Unix time the thermostat data was last collected"
    );
    let _ = writeln!(
        out,
        "{LAST_UPDATE_METRIC}{{{THERMOSTAT_LABEL}=\"{label}\"}} {}",
        rendered_at.timestamp()
    );

    out
}

/// Sample value for a vendor field. Booleans become 0/1.
fn sample_value(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.trim().parse::<f64>().is_ok() => Some(s.trim().to_owned()),
        _ => None,
    }
}

/// Escape `\`, `"` and newlines inside a label value.
fn escape_label_value(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}
