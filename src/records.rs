use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Story,
    Incident,
    Complaint,
    Help,
}

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::Story,
        ReportType::Incident,
        ReportType::Complaint,
        ReportType::Help,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Story => "story",
            ReportType::Incident => "incident",
            ReportType::Complaint => "complaint",
            ReportType::Help => "help",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ReportType,
    pub content: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl Report {
    pub fn new(kind: ReportType, content: String, now: DateTime<Utc>) -> Self {
        Report {
            id: util::timestamp_id(&now),
            kind,
            content,
            created_at: util::to_iso(&now),
            name: None,
            email: None,
            contact: None,
        }
    }

    pub fn with_submitter(mut self, name: String, email: String, contact: String) -> Self {
        self.name = Some(name);
        self.email = Some(email);
        self.contact = Some(contact);
        self
    }
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertUser {
    pub name: String,
    pub email: String,
}

impl Default for AlertUser {
    fn default() -> Self {
        AlertUser {
            name: "User".into(),
            email: "user@example.com".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    #[serde(default = "GeoLocation::unnamed")]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for GeoLocation {
    fn default() -> Self {
        GeoLocation {
            name: "Vivekananda College, Puttur".into(),
            latitude: 12.7606,
            longitude: 75.2006,
        }
    }
}

impl GeoLocation {
    fn unnamed() -> String {
        "Current Location".into()
    }

    pub fn maps_url(&self) -> String {
        util::google_maps_url(self.latitude, self.longitude)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SosAlert {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub created_at: String,
    pub user: AlertUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

impl SosAlert {
    pub fn new(user: AlertUser, location: GeoLocation, now: DateTime<Utc>) -> Self {
        SosAlert {
            id: util::timestamp_id(&now),
            kind: "SOS Alert".into(),
            content: format!("SOS Alert triggered at {} ({}, {})",
                location.name, location.latitude, location.longitude),
            created_at: util::to_iso(&now),
            user,
            location: Some(location),
        }
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyStatus {
    Safe,
    Unsafe,
}

pub const SAFETY_TAGS: [&'static str; 6] = [
    "well-lit",
    "crowded",
    "cctv",
    "police-presence",
    "public-transport",
    "emergency-services",
];

pub fn is_known_tag(tag: &str) -> bool {
    SAFETY_TAGS.iter().any(|&t| t == tag)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub id: i64,
    pub location: String,
    pub status: SafetyStatus,
    pub tags: Vec<String>,
    pub comment: String,
    pub votes: i64,
    pub timestamp: String,
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub location: String,
    pub rating: u8,
    pub comment: String,
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone_number: String,
}


/// Records that can be scored per location.
pub trait Located {
    fn location(&self) -> &str;
}

impl Located for SafetyReport {
    fn location(&self) -> &str {
        &self.location
    }
}

impl Located for Rating {
    fn location(&self) -> &str {
        &self.location
    }
}
