//! Turning OpenWeatherMap replies into typed results. Only the fields that
//! are displayed are read; everything else in the payload is ignored.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use sextant_core::{Alerts, CurrentWeather, ForecastEntry, Units, WeatherAlert};

use crate::error::{WeatherError, WeatherResult};

const FALLBACK_MESSAGE: &str = "Unable to retrieve weather data.";
/// The forecast endpoint reports every three hours; one in eight is one
/// entry per day.
const FORECAST_STRIDE: usize = 8;

/// `cod` is a number on some endpoints and a string on others.
fn cod_is(json: &Value, code: u16) -> bool {
    match json.get("cod") {
        Some(Value::String(s)) => s == &code.to_string(),
        Some(Value::Number(n)) => n.as_u64() == Some(code as u64),
        _ => false,
    }
}

/// Map the HTTP status and body to either the parsed JSON document or the
/// matching error.
fn checked_json(status: u16, body: &str, city: Option<&str>) -> WeatherResult<Value> {
    let json: Option<Value> = serde_json::from_str(body).ok();

    if let Some(city) = city {
        let not_found = status == 404 || json.as_ref().is_some_and(|j| cod_is(j, 404));
        if not_found {
            return Err(WeatherError::CityNotFound(city.to_string()));
        }
    }

    if status != 200 {
        let message = json
            .as_ref()
            .and_then(|j| j.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string();
        return Err(WeatherError::Api { status, message });
    }

    json.ok_or_else(|| WeatherError::InvalidResponse("body is not JSON".into()))
}

fn field<'a>(value: &'a Value, path: &[&str]) -> WeatherResult<&'a Value> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .ok_or_else(|| WeatherError::InvalidResponse(format!("missing field {}", path.join("."))))
}

fn number(value: &Value, path: &[&str]) -> WeatherResult<f64> {
    field(value, path)?
        .as_f64()
        .ok_or_else(|| WeatherError::InvalidResponse(format!("{} is not a number", path.join("."))))
}

fn text(value: &Value, path: &[&str]) -> WeatherResult<String> {
    field(value, path)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| WeatherError::InvalidResponse(format!("{} is not a string", path.join("."))))
}

/// `weather[0].description`
fn first_description(value: &Value) -> WeatherResult<String> {
    value
        .get("weather")
        .and_then(|w| w.get(0))
        .and_then(|w| w.get("description"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WeatherError::InvalidResponse("missing weather[0].description".into()))
}

pub fn parse_current(status: u16, body: &str, city: &str, units: Units) -> WeatherResult<CurrentWeather> {
    let json = checked_json(status, body, Some(city))?;
    Ok(CurrentWeather {
        city: city.to_string(),
        temperature: number(&json, &["main", "temp"])?,
        description: first_description(&json)?,
        units,
    })
}

/// One entry per day from the three-hourly forecast list.
pub fn parse_forecast(status: u16, body: &str, city: &str) -> WeatherResult<Vec<ForecastEntry>> {
    let json = checked_json(status, body, Some(city))?;
    let list = field(&json, &["list"])?
        .as_array()
        .ok_or_else(|| WeatherError::InvalidResponse("list is not an array".into()))?;

    list.iter()
        .step_by(FORECAST_STRIDE)
        .map(|entry| {
            let stamp = text(entry, &["dt_txt"])?;
            let day = stamp.split(' ').next().unwrap_or_default();
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|e| WeatherError::InvalidResponse(format!("bad dt_txt '{stamp}': {e}")))?;
            Ok(ForecastEntry {
                date,
                temperature: number(entry, &["main", "temp"])?,
                description: first_description(entry)?,
            })
        })
        .collect()
}

/// Alerts from a one-call reply; an absent or empty `alerts` list means
/// there are none.
pub fn parse_alerts(status: u16, body: &str) -> WeatherResult<Alerts> {
    let json = checked_json(status, body, None)?;
    let Some(list) = json.get("alerts").and_then(Value::as_array) else {
        return Ok(Alerts::None);
    };
    if list.is_empty() {
        return Ok(Alerts::None);
    }

    let timestamp = |alert: &Value, key: &str| -> WeatherResult<_> {
        let secs = field(alert, &[key])?
            .as_i64()
            .ok_or_else(|| WeatherError::InvalidResponse(format!("{key} is not a timestamp")))?;
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| WeatherError::InvalidResponse(format!("{key} out of range: {secs}")))
    };

    let alerts = list
        .iter()
        .map(|alert| {
            Ok(WeatherAlert {
                event: text(alert, &["event"])?,
                description: text(alert, &["description"])?,
                start: timestamp(alert, "start")?,
                end: timestamp(alert, "end")?,
            })
        })
        .collect::<WeatherResult<Vec<_>>>()?;
    Ok(Alerts::Active(alerts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_current() {
        let body = json!({
            "cod": 200,
            "main": {"temp": 21.456},
            "weather": [{"description": "light rain"}]
        })
        .to_string();
        let w = parse_current(200, &body, "Paris", Units::Metric).unwrap();
        assert_eq!(w.temperature, 21.456);
        assert_eq!(w.to_string(), "Temperature: 21.46°C\nDescription: light rain");
    }

    #[test]
    fn test_not_found_by_status_or_cod() {
        let body = r#"{"cod":"404","message":"city not found"}"#;
        assert!(matches!(
            parse_current(404, body, "Atlantis", Units::Metric),
            Err(WeatherError::CityNotFound(c)) if c == "Atlantis"
        ));
        assert!(matches!(
            parse_current(200, body, "Atlantis", Units::Metric),
            Err(WeatherError::CityNotFound(_))
        ));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"cod":401,"message":"Invalid API key"}"#;
        let err = parse_current(401, body, "Paris", Units::Metric).unwrap_err();
        assert!(matches!(err, WeatherError::Api { status: 401, .. }));
        assert_eq!(err.to_string(), "Invalid API key");

        let err = parse_current(502, "<html>bad gateway</html>", "Paris", Units::Metric).unwrap_err();
        assert_eq!(err.to_string(), "Unable to retrieve weather data.");
    }

    #[test]
    fn test_missing_fields() {
        let err = parse_current(200, r#"{"cod":200,"weather":[]}"#, "Paris", Units::Metric).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidResponse(m) if m.contains("main.temp")));
    }

    #[test]
    fn test_parse_forecast_takes_one_entry_per_day() {
        let list: Vec<Value> = (0..16)
            .map(|i| {
                json!({
                    "dt_txt": format!("2024-03-{:02} {:02}:00:00", 1 + i / 8, (i % 8) * 3),
                    "main": {"temp": i as f64},
                    "weather": [{"description": format!("slot {i}")}]
                })
            })
            .collect();
        let body = json!({"cod": "200", "list": list}).to_string();
        let days = parse_forecast(200, &body, "Oslo").unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(
            days[1].to_string(),
            "2024-03-02 - Temperature: 8.00°C, Description: slot 8"
        );
    }

    #[test]
    fn test_parse_alerts() {
        assert_eq!(parse_alerts(200, r#"{"lat":1.0}"#).unwrap(), Alerts::None);
        assert_eq!(parse_alerts(200, r#"{"alerts":[]}"#).unwrap(), Alerts::None);

        let body = json!({"alerts": [{
            "event": "Flood Warning",
            "description": "River levels rising",
            "start": 1_700_000_000,
            "end": 1_700_003_600
        }]})
        .to_string();
        let alerts = parse_alerts(200, &body).unwrap();
        assert_eq!(
            alerts.to_string(),
            "Alert: Flood Warning\nDescription: River levels rising\n\
             Start: 2023-11-14 22:13 UTC\nEnd: 2023-11-14 23:13 UTC"
        );
    }
}
