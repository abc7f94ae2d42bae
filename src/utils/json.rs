use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{Map, Value};

/// A single key of a PATCH body: absent, explicitly `null`, or a value.
#[derive(Debug, PartialEq)]
pub enum Patch<T> {
    Omitted,
    Null,
    Value(T),
}

pub fn patch_field<T: DeserializeOwned>(
    body: &Map<String, Value>,
    key: &str,
) -> Result<Patch<T>, String> {
    match body.get(key) {
        None => Ok(Patch::Omitted),
        Some(Value::Null) => Ok(Patch::Null),
        Some(value) => serde_json::from_value(value.clone())
            .map(Patch::Value)
            .map_err(|err| format!("invalid value for {key}: {err}")),
    }
}

/// Multipart text fields arrive as strings. JSON arrays and objects embedded
/// in a field are decoded; everything else stays a string and is coerced by
/// the lenient deserializers below.
pub fn multipart_text_value(raw: &str) -> Value {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
            return parsed;
        }
    }
    Value::String(raw.to_string())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Typed(T),
    Text(String),
}

pub fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Lenient<i32>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Lenient::Typed(value)) => Ok(Some(value)),
        Some(Lenient::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Lenient::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got {text:?}"))),
    }
}

pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Lenient<f64>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Lenient::Typed(value)) => Ok(Some(value)),
        Some(Lenient::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Lenient::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {text:?}"))),
    }
}

pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Lenient<bool>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Lenient::Typed(value)) => Ok(Some(value)),
        Some(Lenient::Text(text)) => match text.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "true" | "on" | "1" | "yes" => Ok(Some(true)),
            "false" | "off" | "0" | "no" => Ok(Some(false)),
            _ => Err(serde::de::Error::custom(format!(
                "expected a boolean, got {text:?}"
            ))),
        },
    }
}

/// Trims and drops empty strings so optional text columns store NULL.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
