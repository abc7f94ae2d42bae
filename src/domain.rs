//! Vocabulary shared by the API and the client controllers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Team-wide resources that can be attached to any number of shoots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Personnel,
    Equipment,
    Props,
    Costumes,
    Locations,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Personnel,
        ResourceKind::Equipment,
        ResourceKind::Props,
        ResourceKind::Costumes,
        ResourceKind::Locations,
    ];

    /// Path segment under `/api`.
    pub const fn path(self) -> &'static str {
        match self {
            ResourceKind::Personnel => "personnel",
            ResourceKind::Equipment => "equipment",
            ResourceKind::Props => "props",
            ResourceKind::Costumes => "costumes",
            ResourceKind::Locations => "locations",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Personnel => "Personnel",
            ResourceKind::Equipment => "Equipment",
            ResourceKind::Props => "Prop",
            ResourceKind::Costumes => "Costume",
            ResourceKind::Locations => "Location",
        }
    }

    /// Client-shape key that holds the uploaded image, if the kind has one.
    pub const fn image_field(self) -> Option<&'static str> {
        match self {
            ResourceKind::Personnel => Some("avatarUrl"),
            ResourceKind::Equipment | ResourceKind::Props | ResourceKind::Costumes => {
                Some("imageUrl")
            }
            ResourceKind::Locations => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShootStatus {
    Idea,
    Planning,
    Scheduled,
    Completed,
}

impl ShootStatus {
    /// Board column order.
    pub const ORDERED: [ShootStatus; 4] = [
        ShootStatus::Idea,
        ShootStatus::Planning,
        ShootStatus::Scheduled,
        ShootStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShootStatus::Idea => "idea",
            ShootStatus::Planning => "planning",
            ShootStatus::Scheduled => "scheduled",
            ShootStatus::Completed => "completed",
        }
    }

    /// A shoot may lack a date only before it is scheduled.
    pub fn allows_missing_date(self) -> bool {
        matches!(self, ShootStatus::Idea | ShootStatus::Planning)
    }
}

impl FromStr for ShootStatus {
    type Err = String;

    /// Accepts the legacy `ready to shoot` spelling as `scheduled`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "idea" => Ok(ShootStatus::Idea),
            "planning" => Ok(ShootStatus::Planning),
            "scheduled" | "ready to shoot" => Ok(ShootStatus::Scheduled),
            "completed" => Ok(ShootStatus::Completed),
            _ => Err(format!("unknown shoot status: {value}")),
        }
    }
}

impl fmt::Display for ShootStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostumeStatus {
    Planning,
    InProgress,
    Completed,
}

impl CostumeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CostumeStatus::Planning => "planning",
            CostumeStatus::InProgress => "in-progress",
            CostumeStatus::Completed => "completed",
        }
    }
}

impl FromStr for CostumeStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "planning" => Ok(CostumeStatus::Planning),
            "in-progress" => Ok(CostumeStatus::InProgress),
            "completed" => Ok(CostumeStatus::Completed),
            _ => Err(format!("unknown costume status: {value}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceType {
    Image,
    Instagram,
}

impl ReferenceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceType::Image => "image",
            ReferenceType::Instagram => "instagram",
        }
    }
}

impl FromStr for ReferenceType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "image" => Ok(ReferenceType::Image),
            "instagram" => Ok(ReferenceType::Instagram),
            _ => Err(format!("reference type must be image or instagram, got {value}")),
        }
    }
}
