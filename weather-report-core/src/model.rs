use serde::{Deserialize, Serialize};

/// Provider payload as decoded JSON, before any field is looked at.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation(pub serde_json::Value);

impl RawObservation {
    /// Walk a path of object keys and array indices.
    pub fn lookup(&self, path: &[PathSegment]) -> Option<&serde_json::Value> {
        path.iter().try_fold(&self.0, |node, seg| match seg {
            PathSegment::Key(key) => node.get(*key),
            PathSegment::Index(idx) => node.get(*idx),
        })
    }

    /// `null`, `false`, `0`, `""`, `[]` or `{}`: a body that carries no observation at all.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::Bool(b) => !b,
            serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
            serde_json::Value::String(s) => s.is_empty(),
            serde_json::Value::Array(a) => a.is_empty(),
            serde_json::Value::Object(o) => o.is_empty(),
        }
    }
}

impl From<serde_json::Value> for RawObservation {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PathSegment {
    Key(&'static str),
    Index(usize),
}

/// One normalized observation. Field order is the archive column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub timestamp: String,
    pub city: String,
    pub temperature_celsius: f64,
    pub feels_like_celsius: f64,
    pub humidity_percent: u8,
    pub weather_description: String,
    pub wind_speed_mps: f64,
}

impl WeatherRecord {
    /// Column names in archive order.
    pub const FIELDS: [&'static str; 7] = [
        "timestamp",
        "city",
        "temperature_celsius",
        "feels_like_celsius",
        "humidity_percent",
        "weather_description",
        "wind_speed_mps",
    ];
}
