//! Key casing between the API's client shape (camelCase) and the storage
//! shape (snake_case).
//!
//! Conversion is applied to object keys only, recursively through nested
//! objects and arrays. Values are never touched, so a string that happens to
//! look like `snake_case` stays as it is.

use serde_json::{Map, Value};

/// `created_at` -> `createdAt`. An underscore is dropped only when it is
/// followed by an ASCII lowercase letter and preceded by something, so
/// `line_2` and `_private` survive unchanged.
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_' && !out.is_empty() {
            if let Some(next) = chars.peek().copied() {
                if next.is_ascii_lowercase() {
                    chars.next();
                    out.push(next.to_ascii_uppercase());
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

/// `createdAt` -> `created_at`.
pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn to_client_shape(value: Value) -> Value {
    map_keys(value, &snake_to_camel)
}

pub fn to_storage_shape(value: Value) -> Value {
    map_keys(value, &camel_to_snake)
}

fn map_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(object) => {
            let mut mapped = Map::with_capacity(object.len());
            for (key, inner) in object {
                mapped.insert(convert(&key), map_keys(inner, convert));
            }
            Value::Object(mapped)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| map_keys(item, convert))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_single_keys() {
        assert_eq!(snake_to_camel("created_at"), "createdAt");
        assert_eq!(snake_to_camel("completion_percentage"), "completionPercentage");
        assert_eq!(camel_to_snake("durationMinutes"), "duration_minutes");
        assert_eq!(camel_to_snake("isPublic"), "is_public");
    }

    #[test]
    fn leaves_unconvertible_underscores_alone() {
        assert_eq!(snake_to_camel("line_2"), "line_2");
        assert_eq!(snake_to_camel("_private"), "_private");
        assert_eq!(camel_to_snake("line_2"), "line_2");
    }

    #[test]
    fn converts_nested_objects_and_arrays() {
        let row = json!({
            "team_id": "t-1",
            "instagram_links": ["https://instagram.com/p/abc"],
            "participants": [{ "personnel_id": "p-1", "display_name": null }],
            "location": { "place_id": "xyz", "lat_lng": [1.5, 2.5] }
        });

        let client = to_client_shape(row);
        assert_eq!(
            client,
            json!({
                "teamId": "t-1",
                "instagramLinks": ["https://instagram.com/p/abc"],
                "participants": [{ "personnelId": "p-1", "displayName": null }],
                "location": { "placeId": "xyz", "latLng": [1.5, 2.5] }
            })
        );
    }

    #[test]
    fn does_not_touch_string_values() {
        let value = to_client_shape(json!({ "status": "in_progress" }));
        assert_eq!(value, json!({ "status": "in_progress" }));
    }

    #[test]
    fn scalars_and_null_pass_through() {
        assert_eq!(to_client_shape(Value::Null), Value::Null);
        assert_eq!(to_storage_shape(json!(42)), json!(42));
        assert_eq!(to_storage_shape(json!("camelCase")), json!("camelCase"));
    }

    #[test]
    fn round_trips_in_both_directions() {
        let client = json!({
            "characterName": "Zelda",
            "todos": ["wig", "boots"],
            "nested": { "seriesName": "BotW", "imageUrl": null },
            "quantity": 2
        });
        assert_eq!(to_client_shape(to_storage_shape(client.clone())), client);

        let storage = json!({
            "character_name": "Zelda",
            "items": [{ "created_at": "2024-01-01", "is_public": true }]
        });
        assert_eq!(to_storage_shape(to_client_shape(storage.clone())), storage);
    }
}
