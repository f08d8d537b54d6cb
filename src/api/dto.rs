//! Wire types for the signup service
//!
//! Request and response bodies exchanged with the activity endpoints.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============ Activities ============

/// Body of a single activity as the server sends it, keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ActivityDetails {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// An activity together with its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    pub participants: Vec<String>,
}

impl Activity {
    pub fn new(name: impl Into<String>, details: ActivityDetails) -> Self {
        Self {
            name: name.into(),
            description: details.description,
            schedule: details.schedule,
            max_participants: details.max_participants,
            participants: details.participants,
        }
    }

    /// Remaining capacity. Negative when the server has over-filled the roster.
    pub fn spots_left(&self) -> i64 {
        i64::from(self.max_participants) - self.participants.len() as i64
    }

    fn details(&self) -> ActivityDetails {
        ActivityDetails {
            description: self.description.clone(),
            schedule: self.schedule.clone(),
            max_participants: self.max_participants,
            participants: self.participants.clone(),
        }
    }
}

/// The activity collection in the order the server listed it.
///
/// `GET /activities` returns a JSON object keyed by activity name. A plain
/// `HashMap` would lose the server's ordering, so the object is decoded
/// entry by entry into a vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activities(Vec<Activity>);

impl Activities {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self(activities)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Activity> {
        self.0.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.0.iter().find(|a| a.name == name)
    }

    /// Activity names, in server order
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|a| a.name.clone()).collect()
    }

    pub fn into_inner(self) -> Vec<Activity> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Activities {
    type Item = &'a Activity;
    type IntoIter = std::slice::Iter<'a, Activity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for Activities {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ActivitiesVisitor;

        impl<'de> Visitor<'de> for ActivitiesVisitor {
            type Value = Activities;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of activity name to activity details")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut activities = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, details)) = map.next_entry::<String, ActivityDetails>()? {
                    activities.push(Activity::new(name, details));
                }
                Ok(Activities(activities))
            }
        }

        deserializer.deserialize_map(ActivitiesVisitor)
    }
}

impl Serialize for Activities {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for activity in &self.0 {
            map.serialize_entry(&activity.name, &activity.details())?;
        }
        map.end()
    }
}

// ============ Auth ============

/// `POST /auth/login` success body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub teacher_name: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /auth/verify` success body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VerifyResponse {
    pub teacher_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

// ============ Mutations ============

/// Success body of signup and unregister
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Pull the `detail` text out of an error body.
///
/// Only a string `detail` counts. Validation errors carry an array there,
/// which callers replace with their own fallback text.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")?
        .as_str()
        .map(|s| s.to_string())
}
