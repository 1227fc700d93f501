use std::{collections::BTreeMap, fmt::Debug};

use thiserror::Error;

use crate::model::{QueryDraft, QueryParameters, Setting};

/// Field-level failures keyed by query parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid query parameters: {}", summary(.errors))]
pub struct ValidationError {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

fn summary(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors
        .values()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns raw configured values into typed query parameters.
pub trait Validator: Send + Sync + Debug {
    fn check(&self, draft: &QueryDraft) -> Result<QueryParameters, ValidationError>;
}

/// Rules for the Yandex forecast query: coordinates in range, an `ll_CC`
/// locale and a positive integer limit. `hours` and `extra` are cast, never rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherValidator;

impl Validator for WeatherValidator {
    fn check(&self, draft: &QueryDraft) -> Result<QueryParameters, ValidationError> {
        let mut errors = ValidationError::default();

        let latitude = coordinate(&mut errors, "lat", draft.lat.as_ref(), 90.0);
        let longitude = coordinate(&mut errors, "lon", draft.lon.as_ref(), 180.0);
        let language = language(&mut errors, &draft.lang);
        let limit = limit(&mut errors, &draft.limit);
        let hours = draft.hours.to_bool();
        let extra = draft.extra.to_bool();

        match (latitude, longitude, language, limit) {
            (Some(latitude), Some(longitude), Some(language), Some(limit)) if errors.is_empty() => {
                Ok(QueryParameters { latitude, longitude, language, limit, hours, extra })
            }
            _ => Err(errors),
        }
    }
}

fn coordinate(
    errors: &mut ValidationError,
    field: &str,
    value: Option<&Setting>,
    bound: f64,
) -> Option<f64> {
    let Some(value) = value else {
        errors.add(field, format!("The {field} field is required."));
        return None;
    };

    match value.as_f64() {
        Some(n) if n.is_finite() && (-bound..=bound).contains(&n) => Some(n),
        Some(n) if n.is_finite() => {
            errors.add(field, format!("The {field} must be between -{bound} and {bound}."));
            None
        }
        _ => {
            errors.add(field, format!("The {field} must be a number."));
            None
        }
    }
}

fn language(errors: &mut ValidationError, value: &Setting) -> Option<String> {
    let Some(text) = value.as_text() else {
        errors.add("lang", "The lang must be a string.");
        return None;
    };

    if is_locale(text) {
        Some(text.to_string())
    } else {
        errors.add("lang", "The lang format is invalid.");
        None
    }
}

/// `ll_CC`: two lowercase letters, underscore, two uppercase letters.
fn is_locale(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 5
        && b[..2].iter().all(u8::is_ascii_lowercase)
        && b[2] == b'_'
        && b[3..].iter().all(u8::is_ascii_uppercase)
}

fn limit(errors: &mut ValidationError, value: &Setting) -> Option<i64> {
    match value.as_i64() {
        Some(n) if n >= 1 => Some(n),
        Some(_) => {
            errors.add("limit", "The limit must be at least 1.");
            None
        }
        None => {
            errors.add("limit", "The limit must be an integer.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QueryDraft {
        QueryDraft {
            lat: Some(Setting::Float(55.75)),
            lon: Some(Setting::Float(37.62)),
            lang: Setting::from("ru_RU"),
            limit: Setting::Integer(7),
            hours: Setting::Bool(true),
            extra: Setting::Bool(false),
        }
    }

    #[test]
    fn valid_draft_becomes_parameters() {
        let params = WeatherValidator.check(&draft()).unwrap();

        assert_eq!(params.latitude, 55.75);
        assert_eq!(params.longitude, 37.62);
        assert_eq!(params.language, "ru_RU");
        assert_eq!(params.limit, 7);
        assert!(params.hours);
        assert!(!params.extra);
    }

    #[test]
    fn text_values_are_coerced() {
        let d = QueryDraft {
            lat: Some(Setting::from("-33.86")),
            lon: Some(Setting::from("151.2")),
            limit: Setting::from("2"),
            hours: Setting::from("false"),
            extra: Setting::Integer(2),
            ..draft()
        };

        let params = WeatherValidator.check(&d).unwrap();
        assert_eq!(params.latitude, -33.86);
        assert_eq!(params.limit, 2);
        assert!(!params.hours);
        assert!(params.extra);
    }

    #[test]
    fn non_numeric_latitude_is_rejected() {
        let d = QueryDraft { lat: Some(Setting::from("north")), ..draft() };

        let err = WeatherValidator.check(&d).unwrap_err();
        assert_eq!(err.messages("lat"), ["The lat must be a number."]);
        assert_eq!(err.errors().len(), 1);
    }

    #[test]
    fn missing_coordinates_are_required() {
        let d = QueryDraft { lat: None, lon: None, ..draft() };

        let err = WeatherValidator.check(&d).unwrap_err();
        assert_eq!(err.messages("lat"), ["The lat field is required."]);
        assert_eq!(err.messages("lon"), ["The lon field is required."]);
    }

    #[test]
    fn out_of_range_longitude_is_rejected() {
        let d = QueryDraft { lon: Some(Setting::Float(181.0)), ..draft() };

        let err = WeatherValidator.check(&d).unwrap_err();
        assert_eq!(err.messages("lon"), ["The lon must be between -180 and 180."]);
    }

    #[test]
    fn non_finite_coordinates_are_not_numbers() {
        let d = QueryDraft { lat: Some(Setting::from("NaN")), ..draft() };

        let err = WeatherValidator.check(&d).unwrap_err();
        assert_eq!(err.messages("lat"), ["The lat must be a number."]);
    }

    #[test]
    fn language_must_look_like_a_locale() {
        for bad in ["ru", "RU_ru", "ru-RU", "ru_RUS"] {
            let d = QueryDraft { lang: Setting::from(bad), ..draft() };
            let err = WeatherValidator.check(&d).unwrap_err();
            assert_eq!(err.messages("lang"), ["The lang format is invalid."], "{bad}");
        }

        let d = QueryDraft { lang: Setting::Integer(1), ..draft() };
        let err = WeatherValidator.check(&d).unwrap_err();
        assert_eq!(err.messages("lang"), ["The lang must be a string."]);
    }

    #[test]
    fn uncast_fractional_limit_is_rejected() {
        let d = QueryDraft { limit: Setting::Float(2.5), ..draft() };

        let err = WeatherValidator.check(&d).unwrap_err();
        assert_eq!(err.messages("limit"), ["The limit must be an integer."]);
    }

    #[test]
    fn every_failing_field_is_reported() {
        let d = QueryDraft {
            lat: Some(Setting::from("x")),
            lon: Some(Setting::Bool(true)),
            lang: Setting::from("russian"),
            limit: Setting::Integer(0),
            hours: Setting::from("maybe"),
            ..draft()
        };

        let err = WeatherValidator.check(&d).unwrap_err();
        let fields: Vec<&str> = err.errors().keys().map(String::as_str).collect();
        assert_eq!(fields, ["lang", "lat", "limit", "lon"]);
        assert!(err.to_string().starts_with("invalid query parameters: "));
    }
}
