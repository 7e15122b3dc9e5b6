//! # Catalog Entities
//!
//! Reference data that seasons and tasks point at: the users who own plots
//! and tasks, the plots themselves, and the crop / variety catalog.
//!
//! These records carry no lifecycle logic. A `Season` refers to them by id
//! only, and factories accept them by reference without checking ownership.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AgriError;
use crate::identity::{CropId, PlotId, UserId, VarietyId};

// ── Users ────────────────────────────────────────────────────────────

/// Role of a user account. Ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "FARMER")]
    Farmer,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farmer => "FARMER",
            Self::Admin => "ADMIN",
        }
    }

    /// Parse a role name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self, AgriError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "FARMER" => Ok(Self::Farmer),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(AgriError::UnknownVariant {
                kind: "user role",
                value: name.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an account may act on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "INACTIVE")]
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, AgriError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            _ => Err(AgriError::UnknownVariant {
                kind: "user status",
                value: name.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A new active account with a fresh id.
    pub fn new(username: impl Into<String>, full_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            full_name: full_name.into(),
            email: None,
            role,
            status: UserStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// ── Land and crops ───────────────────────────────────────────────────

/// A parcel of land owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    pub id: PlotId,
    pub plot_name: String,
    pub area_m2: Option<Decimal>,
    pub soil_type: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Plot {
    pub fn new(plot_name: impl Into<String>, owner_id: UserId) -> Self {
        Self {
            id: PlotId::new(),
            plot_name: plot_name.into(),
            area_m2: None,
            soil_type: None,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

/// A crop species (e.g. rice, maize).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    pub id: CropId,
    pub crop_name: String,
    pub description: Option<String>,
}

impl Crop {
    pub fn new(crop_name: impl Into<String>) -> Self {
        Self {
            id: CropId::new(),
            crop_name: crop_name.into(),
            description: None,
        }
    }
}

/// A cultivar of a crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variety {
    pub id: VarietyId,
    pub crop_id: CropId,
    pub variety_name: String,
    pub description: Option<String>,
}

impl Variety {
    pub fn new(crop_id: CropId, variety_name: impl Into<String>) -> Self {
        Self {
            id: VarietyId::new(),
            crop_id,
            variety_name: variety_name.into(),
            description: None,
        }
    }
}
