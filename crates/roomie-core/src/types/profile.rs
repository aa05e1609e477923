//! Profile summaries returned by the profile search API.

use serde::{Deserialize, Deserializer, Serialize};

/// Location block of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Free-form address.
    #[serde(default)]
    pub address: Option<String>,
}

/// A single search hit: the public part of a student's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    /// Account identity.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// College name.
    #[serde(default)]
    pub college_name: Option<String>,
    /// Location block.
    #[serde(default)]
    pub location: Option<Location>,
    /// Paying-guest accommodation name.
    #[serde(default)]
    pub pg_name: Option<String>,
    /// Branch of study.
    #[serde(default)]
    pub branch: Option<String>,
    /// Year of study; the backend sends either a number or a string.
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    /// Course.
    #[serde(default)]
    pub course: Option<String>,
    /// Photo reference (URL).
    #[serde(default)]
    pub profile_photo: Option<String>,
    /// Room has air conditioning.
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_air_conditioning: bool,
    /// Food is provided.
    #[serde(default, deserialize_with = "null_as_default")]
    pub food_available: bool,
}

impl ProfileSummary {
    /// Address line or `None` when the location is missing.
    pub fn address(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.address.as_deref())
    }
}

// documents from the backend carry explicit nulls as well as missing fields
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
