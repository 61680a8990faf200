//! Raw provider payload to [`WeatherRecord`]. No I/O happens here.

use chrono::NaiveDateTime;

use crate::{
    error::MalformedResponse,
    model::{PathSegment as P, RawObservation, WeatherRecord},
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TEMP: (&str, &[P]) = ("main.temp", &[P::Key("main"), P::Key("temp")]);
const FEELS_LIKE: (&str, &[P]) = ("main.feels_like", &[P::Key("main"), P::Key("feels_like")]);
const HUMIDITY: (&str, &[P]) = ("main.humidity", &[P::Key("main"), P::Key("humidity")]);
const DESCRIPTION: (&str, &[P]) = (
    "weather[0].description",
    &[P::Key("weather"), P::Index(0), P::Key("description")],
);
const WIND_SPEED: (&str, &[P]) = ("wind.speed", &[P::Key("wind"), P::Key("speed")]);

/// Build a record from a provider payload, if there is one.
///
/// An absent payload (the fetch already failed) yields `Ok(None)`. A payload
/// missing any required field yields [`MalformedResponse`]; what happens next
/// is the caller's [`MalformedPolicy`](crate::pipeline::MalformedPolicy).
pub fn transform(
    raw: Option<&RawObservation>,
    city: &str,
    captured_at: NaiveDateTime,
) -> Result<Option<WeatherRecord>, MalformedResponse> {
    raw.map(|raw| transform_observation(raw, city, captured_at))
        .transpose()
}

pub fn transform_observation(
    raw: &RawObservation,
    city: &str,
    captured_at: NaiveDateTime,
) -> Result<WeatherRecord, MalformedResponse> {
    Ok(WeatherRecord {
        timestamp: captured_at.format(TIMESTAMP_FORMAT).to_string(),
        city: city.to_string(),
        temperature_celsius: number(raw, TEMP)?,
        feels_like_celsius: number(raw, FEELS_LIKE)?,
        humidity_percent: percentage(raw, HUMIDITY)?,
        weather_description: text(raw, DESCRIPTION)?,
        wind_speed_mps: number(raw, WIND_SPEED)?,
    })
}

fn field<'a>(
    raw: &'a RawObservation,
    (name, path): (&'static str, &[P]),
) -> Result<&'a serde_json::Value, MalformedResponse> {
    raw.lookup(path)
        .filter(|v| !v.is_null())
        .ok_or(MalformedResponse::MissingField(name))
}

fn number(raw: &RawObservation, def: (&'static str, &[P])) -> Result<f64, MalformedResponse> {
    field(raw, def)?
        .as_f64()
        .ok_or(MalformedResponse::WrongType {
            field: def.0,
            expected: "a number",
        })
}

fn percentage(raw: &RawObservation, def: (&'static str, &[P])) -> Result<u8, MalformedResponse> {
    let value = field(raw, def)?;
    let wrong = MalformedResponse::WrongType {
        field: def.0,
        expected: "an integer percentage",
    };

    if let Some(n) = value.as_u64() {
        return u8::try_from(n).map_err(|_| wrong);
    }
    // some providers send 60.0
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && (0.0..=255.0).contains(&f) => Ok(f as u8),
        _ => Err(wrong),
    }
}

fn text(raw: &RawObservation, def: (&'static str, &[P])) -> Result<String, MalformedResponse> {
    field(raw, def)?
        .as_str()
        .map(str::to_owned)
        .ok_or(MalformedResponse::WrongType {
            field: def.0,
            expected: "a string",
        })
}
