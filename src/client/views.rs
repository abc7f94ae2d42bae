//! Groupings of client-shape shoots for the board, calendar and map.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::domain::ShootStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct KanbanColumn {
    pub status: ShootStatus,
    pub shoots: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub shoot_id: String,
    pub title: String,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

fn date(shoot: &Value) -> Option<NaiveDate> {
    let raw = shoot.get("date")?.as_str()?;
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
}

fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn status(shoot: &Value) -> Option<ShootStatus> {
    text(shoot, "status")?.parse().ok()
}

/// Dated shoots first by date then time; undated ones keep their order at
/// the end.
fn schedule_order(a: &Value, b: &Value) -> Ordering {
    match (date(a), date(b)) {
        (Some(left), Some(right)) => left
            .cmp(&right)
            .then_with(|| text(a, "time").cmp(&text(b, "time"))),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One column per status in board order. Shoots with an unreadable status
/// are left out.
pub fn kanban(shoots: &[Value]) -> Vec<KanbanColumn> {
    ShootStatus::ORDERED
        .iter()
        .map(|&column| {
            let mut members: Vec<Value> = shoots
                .iter()
                .filter(|shoot| status(shoot) == Some(column))
                .cloned()
                .collect();
            members.sort_by(schedule_order);
            KanbanColumn {
                status: column,
                shoots: members,
            }
        })
        .collect()
}

/// Shoots of one month keyed by day of month.
pub fn calendar(shoots: &[Value], year: i32, month: u32) -> BTreeMap<u32, Vec<Value>> {
    let mut days: BTreeMap<u32, Vec<Value>> = BTreeMap::new();
    let mut dated: Vec<&Value> = shoots
        .iter()
        .filter(|shoot| matches!(date(shoot), Some(day) if day.year() == year && day.month() == month))
        .collect();
    dated.sort_by(|a, b| schedule_order(a, b));
    for shoot in dated {
        if let Some(day) = date(shoot) {
            days.entry(day.day()).or_default().push(shoot.clone());
        }
    }
    days
}

fn coordinate(location: &Value, key: &str) -> Option<f64> {
    match location.get(key)? {
        Value::Number(value) => value.as_f64(),
        Value::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}

/// Shoots whose location has coordinates.
pub fn map_points(shoots: &[Value], locations: &[Value]) -> Vec<MapPoint> {
    let located: HashMap<&str, (&Value, f64, f64)> = locations
        .iter()
        .filter_map(|location| {
            let id = text(location, "id")?;
            let latitude = coordinate(location, "latitude")?;
            let longitude = coordinate(location, "longitude")?;
            Some((id, (location, latitude, longitude)))
        })
        .collect();

    shoots
        .iter()
        .filter_map(|shoot| {
            let (location, latitude, longitude) = located.get(text(shoot, "locationId")?)?;
            Some(MapPoint {
                shoot_id: text(shoot, "id")?.to_string(),
                title: text(shoot, "title").unwrap_or_default().to_string(),
                location_name: text(location, "name").unwrap_or_default().to_string(),
                latitude: *latitude,
                longitude: *longitude,
            })
        })
        .collect()
}
