// Wire types for the Skyport integrator API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `POST /v1/token` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenRequest<'a> {
    pub email: &'a str,
    pub integrator_token: &'a str,
}

/// `POST /v1/token` response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub access_token_expires_in: u64,
    #[serde(default)]
    #[allow(dead_code)]
    pub token_type: Option<String>,
}

/// One location from `GET /v1/devices`, carrying its thermostats.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Location {
    #[serde(default)]
    pub devices: Vec<DeviceSummary>,
}

/// A thermostat as listed under a location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
}

impl DeviceSummary {
    /// Case-insensitive name match, as the home app shows names with
    /// whatever casing the user typed.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// The full state of one thermostat at one instant.
///
/// Kept as a loose JSON object: the vendor adds fields between firmware
/// releases and the exporter only reads the ones it knows about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DeviceRecord(Map<String, Value>);

impl DeviceRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for DeviceRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
