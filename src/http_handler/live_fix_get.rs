use super::request_common::HTTPRequestType;
use super::response_common::SerdeJSONBodyHTTPResponseType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Remote source B: a small JSON endpoint returning only a current
/// latitude/longitude and a timestamp for the tracked object. No orbital
/// elements, lower fidelity, but independent of the catalog source.
#[derive(Debug)]
pub struct LiveFixRequest {}

impl HTTPRequestType for LiveFixRequest {
    type Response = LiveFixResponse;

    fn endpoint(&self) -> &'static str { "" }
}

#[derive(serde::Deserialize, Debug)]
pub struct LiveFixResponse {
    #[serde(deserialize_with = "lenient_f64")]
    latitude: f64,
    #[serde(deserialize_with = "lenient_f64")]
    longitude: f64,
    /// Unix timestamp in seconds.
    timestamp: i64,
}

impl SerdeJSONBodyHTTPResponseType for LiveFixResponse {}

impl LiveFixResponse {
    /// Returns the reported latitude in degrees.
    pub fn latitude(&self) -> f64 { self.latitude }

    /// Returns the reported longitude in degrees.
    pub fn longitude(&self) -> f64 { self.longitude }

    /// Returns the reported instant, clamped to the Unix-representable
    /// range by `chrono`.
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.timestamp, 0).unwrap_or_else(Utc::now)
    }
}

/// The endpoint encodes its floats as JSON strings; accept both forms.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(v) => Ok(v),
        NumberOrString::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}
