//! Numeric fields written by older exports may hold `toFixed` strings
//! ("21.00") instead of JSON numbers. These deserializers accept both.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(v) => Ok(v),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {s:?}"))),
    }
}

pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = lenient_f64(deserializer)?;
    if v.fract() != 0.0 || !v.is_finite() {
        return Err(serde::de::Error::custom(format!("expected an integer, got {v}")));
    }
    Ok(v as i64)
}
