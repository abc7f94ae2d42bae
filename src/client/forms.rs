//! Form state for each resource kind's dialog.
//!
//! Numeric inputs are kept as the text the user typed and only parsed during
//! validation, so a half-typed value never loses what was entered.

use serde_json::{json, Map, Value};

use super::dialog::ResourceForm;
use crate::domain::{CostumeStatus, ResourceKind};

fn text(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Number(value)) => value.to_string(),
        _ => String::new(),
    }
}

fn optional_text(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn flag(item: &Value, key: &str, default: bool) -> bool {
    item.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Trimmed text, or `null` when blank.
fn nullable(value: &str) -> Value {
    match value.trim() {
        "" => Value::Null,
        trimmed => Value::String(trimmed.to_string()),
    }
}

fn require(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{label} is required"));
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(value: &str, label: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{label} must be a number"))
}

fn with_image(mut payload: Map<String, Value>, key: &str, url: &Option<String>) -> Value {
    payload.insert(
        key.to_string(),
        url.clone().map(Value::String).unwrap_or(Value::Null),
    );
    Value::Object(payload)
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentForm {
    pub name: String,
    pub category: String,
    pub description: String,
    pub quantity: String,
    pub available: bool,
    pub image_url: Option<String>,
}

impl ResourceForm for EquipmentForm {
    const KIND: ResourceKind = ResourceKind::Equipment;

    fn blank() -> Self {
        Self {
            name: String::new(),
            category: String::new(),
            description: String::new(),
            quantity: "1".into(),
            available: true,
            image_url: None,
        }
    }

    fn from_item(item: &Value) -> Self {
        let quantity = text(item, "quantity");
        Self {
            name: text(item, "name"),
            category: text(item, "category"),
            description: text(item, "description"),
            quantity: if quantity.is_empty() { "1".into() } else { quantity },
            available: flag(item, "available", true),
            image_url: optional_text(item, "imageUrl"),
        }
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.name, "Name")?;
        require(&self.category, "Category")?;
        let quantity: i64 = parse_number(&self.quantity, "Quantity")?;
        if quantity < 1 {
            return Err("Quantity must be at least 1".into());
        }
        Ok(())
    }

    fn to_payload(&self) -> Value {
        let payload = json!({
            "name": self.name.trim(),
            "category": self.category.trim(),
            "description": nullable(&self.description),
            "quantity": self.quantity.trim().parse::<i64>().unwrap_or(1),
            "available": self.available,
        });
        with_image(object(payload), "imageUrl", &self.image_url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropForm {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub image_url: Option<String>,
}

impl ResourceForm for PropForm {
    const KIND: ResourceKind = ResourceKind::Props;

    fn blank() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            available: true,
            image_url: None,
        }
    }

    fn from_item(item: &Value) -> Self {
        Self {
            name: text(item, "name"),
            description: text(item, "description"),
            available: flag(item, "available", true),
            image_url: optional_text(item, "imageUrl"),
        }
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.name, "Name")
    }

    fn to_payload(&self) -> Value {
        let payload = json!({
            "name": self.name.trim(),
            "description": nullable(&self.description),
            "available": self.available,
        });
        with_image(object(payload), "imageUrl", &self.image_url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonnelForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
    pub avatar_url: Option<String>,
}

impl ResourceForm for PersonnelForm {
    const KIND: ResourceKind = ResourceKind::Personnel;

    fn blank() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            notes: String::new(),
            avatar_url: None,
        }
    }

    fn from_item(item: &Value) -> Self {
        Self {
            name: text(item, "name"),
            email: text(item, "email"),
            phone: text(item, "phone"),
            notes: text(item, "notes"),
            avatar_url: optional_text(item, "avatarUrl"),
        }
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.name, "Name")?;
        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err("Email address looks invalid".into());
        }
        Ok(())
    }

    fn to_payload(&self) -> Value {
        let payload = json!({
            "name": self.name.trim(),
            "email": nullable(&self.email),
            "phone": nullable(&self.phone),
            "notes": nullable(&self.notes),
        });
        with_image(object(payload), "avatarUrl", &self.avatar_url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostumeForm {
    pub character_name: String,
    pub series_name: String,
    pub status: CostumeStatus,
    pub completion_percentage: String,
    pub notes: String,
    pub todos: Vec<String>,
    pub image_url: Option<String>,
}

impl ResourceForm for CostumeForm {
    const KIND: ResourceKind = ResourceKind::Costumes;

    fn blank() -> Self {
        Self {
            character_name: String::new(),
            series_name: String::new(),
            status: CostumeStatus::Planning,
            completion_percentage: "0".into(),
            notes: String::new(),
            todos: Vec::new(),
            image_url: None,
        }
    }

    fn from_item(item: &Value) -> Self {
        let percentage = text(item, "completionPercentage");
        Self {
            character_name: text(item, "characterName"),
            series_name: text(item, "seriesName"),
            status: text(item, "status")
                .parse()
                .unwrap_or(CostumeStatus::Planning),
            completion_percentage: if percentage.is_empty() {
                "0".into()
            } else {
                percentage
            },
            notes: text(item, "notes"),
            todos: item
                .get("todos")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            image_url: optional_text(item, "imageUrl"),
        }
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.character_name, "Character name")?;
        let percentage: i64 = parse_number(&self.completion_percentage, "Completion")?;
        if !(0..=100).contains(&percentage) {
            return Err("Completion must be between 0 and 100".into());
        }
        Ok(())
    }

    fn to_payload(&self) -> Value {
        let todos: Vec<&str> = self
            .todos
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .collect();
        let payload = json!({
            "characterName": self.character_name.trim(),
            "seriesName": nullable(&self.series_name),
            "status": self.status.as_str(),
            "completionPercentage": self.completion_percentage.trim().parse::<i64>().unwrap_or(0),
            "notes": nullable(&self.notes),
            "todos": todos,
        });
        with_image(object(payload), "imageUrl", &self.image_url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationForm {
    pub name: String,
    pub address: String,
    pub place_id: String,
    pub latitude: String,
    pub longitude: String,
    pub notes: String,
}

impl LocationForm {
    fn coordinates(&self) -> Result<Option<(f64, f64)>, String> {
        match (self.latitude.trim(), self.longitude.trim()) {
            ("", "") => Ok(None),
            ("", _) | (_, "") => Err("Latitude and longitude go together".into()),
            (lat, lng) => {
                let lat: f64 = parse_number(lat, "Latitude")?;
                let lng: f64 = parse_number(lng, "Longitude")?;
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    return Err("Coordinates are out of range".into());
                }
                Ok(Some((lat, lng)))
            }
        }
    }
}

impl ResourceForm for LocationForm {
    const KIND: ResourceKind = ResourceKind::Locations;

    fn blank() -> Self {
        Self {
            name: String::new(),
            address: String::new(),
            place_id: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            notes: String::new(),
        }
    }

    fn from_item(item: &Value) -> Self {
        Self {
            name: text(item, "name"),
            address: text(item, "address"),
            place_id: text(item, "placeId"),
            latitude: text(item, "latitude"),
            longitude: text(item, "longitude"),
            notes: text(item, "notes"),
        }
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.name, "Name")?;
        self.coordinates().map(|_| ())
    }

    fn to_payload(&self) -> Value {
        let (latitude, longitude) = match self.coordinates() {
            Ok(Some((lat, lng))) => (json!(lat), json!(lng)),
            _ => (Value::Null, Value::Null),
        };
        json!({
            "name": self.name.trim(),
            "address": nullable(&self.address),
            "placeId": nullable(&self.place_id),
            "latitude": latitude,
            "longitude": longitude,
            "notes": nullable(&self.notes),
        })
    }
}
