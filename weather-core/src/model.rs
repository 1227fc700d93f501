use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// A configured value as it was written in the config file or environment.
///
/// Typing is deferred to the validator, so a latitude of `"abc"` reaches it
/// and is reported as a field error instead of failing config parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Setting {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Setting {
    /// Numeric view: numbers as-is, text if it parses as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Setting::Integer(n) => Some(*n as f64),
            Setting::Float(f) => Some(*f),
            Setting::Text(s) => s.trim().parse().ok(),
            Setting::Bool(_) => None,
        }
    }

    /// Integral view. Floats and numeric text qualify only without a fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Setting::Integer(n) => Some(*n),
            Setting::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            Setting::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| f as i64)
                })
            }
            _ => None,
        }
    }

    /// Integer cast: fractions truncate toward zero (saturating), booleans
    /// count as 0/1, and text that is not a number counts as 0.
    pub fn to_integer(&self) -> i64 {
        match self {
            Setting::Integer(n) => *n,
            Setting::Float(f) => truncate(*f),
            Setting::Bool(b) => i64::from(*b),
            Setting::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(truncate))
                    .unwrap_or(0)
            }
        }
    }

    /// Boolean cast: zero, empty text, `"0"` and `"false"` are false,
    /// anything else is true.
    pub fn to_bool(&self) -> bool {
        match self {
            Setting::Bool(b) => *b,
            Setting::Integer(n) => *n != 0,
            Setting::Float(f) => *f != 0.0,
            Setting::Text(s) => {
                let s = s.trim();
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Setting::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Setting {
    fn from(value: &str) -> Self {
        Setting::Text(value.to_string())
    }
}

impl From<String> for Setting {
    fn from(value: String) -> Self {
        Setting::Text(value)
    }
}

impl From<i64> for Setting {
    fn from(value: i64) -> Self {
        Setting::Integer(value)
    }
}

impl From<f64> for Setting {
    fn from(value: f64) -> Self {
        Setting::Float(value)
    }
}

impl From<bool> for Setting {
    fn from(value: bool) -> Self {
        Setting::Bool(value)
    }
}

/// The six query settings after defaults are applied and `limit` is clamped,
/// ready to be handed to a [`crate::Validator`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDraft {
    pub lat: Option<Setting>,
    pub lon: Option<Setting>,
    pub lang: Setting,
    pub limit: Setting,
    pub hours: Setting,
    pub extra: Setting,
}

/// Validated parameters of a forecast request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameters {
    pub latitude: f64,
    pub longitude: f64,
    pub language: String,
    pub limit: i64,
    pub hours: bool,
    pub extra: bool,
}

impl QueryParameters {
    /// `application/x-www-form-urlencoded` query in provider order, booleans as `1`/`0`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("lat", &self.latitude.to_string())
            .append_pair("lon", &self.longitude.to_string())
            .append_pair("lang", &self.language)
            .append_pair("limit", &self.limit.to_string())
            .append_pair("hours", flag(self.hours))
            .append_pair("extra", flag(self.extra))
            .finish()
    }
}

/// NaN becomes 0; out-of-range values saturate.
fn truncate(f: f64) -> i64 {
    f.trunc() as i64
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Provider payload kept as the exact JSON text it arrived as.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProviderResponse(Box<RawValue>);

impl ProviderResponse {
    /// Checks that `body` is one JSON document; surrounding whitespace is dropped.
    pub fn from_json(body: String) -> Result<Self, serde_json::Error> {
        RawValue::from_string(body).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.get()
    }
}
