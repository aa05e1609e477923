//! Profile search filter record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Year of study, constrained to the four undergraduate years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudyYear {
    /// 1st year.
    #[serde(rename = "1")]
    First,
    /// 2nd year.
    #[serde(rename = "2")]
    Second,
    /// 3rd year.
    #[serde(rename = "3")]
    Third,
    /// 4th year.
    #[serde(rename = "4")]
    Fourth,
}

impl StudyYear {
    /// Query-string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "1",
            Self::Second => "2",
            Self::Third => "3",
            Self::Fourth => "4",
        }
    }
}

impl FromStr for StudyYear {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::First),
            "2" => Ok(Self::Second),
            "3" => Ok(Self::Third),
            "4" => Ok(Self::Fourth),
            other => Err(AppError::validation(format!(
                "Invalid year '{other}', expected 1-4"
            ))),
        }
    }
}

impl fmt::Display for StudyYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gender filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Other.
    Other,
}

impl Gender {
    /// Query-string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            other => Err(AppError::validation(format!(
                "Invalid gender '{other}', expected male, female or other"
            ))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the recognized filter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    /// City or area.
    Location,
    /// College name.
    CollegeName,
    /// Year of study.
    Year,
    /// Branch of study.
    Branch,
    /// Gender.
    Gender,
    /// Course.
    Course,
    /// Paying-guest accommodation name.
    PgName,
}

impl FilterKey {
    /// Every filter field, in serialization order.
    pub const ALL: [FilterKey; 7] = [
        Self::Location,
        Self::CollegeName,
        Self::Year,
        Self::Branch,
        Self::Gender,
        Self::Course,
        Self::PgName,
    ];

    /// Wire name used in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::CollegeName => "collegeName",
            Self::Year => "year",
            Self::Branch => "branch",
            Self::Gender => "gender",
            Self::Course => "course",
            Self::PgName => "pgName",
        }
    }
}

impl FromStr for FilterKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::validation(format!("Unknown filter field '{s}'")))
    }
}

/// The filter set driving a profile search. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// City or area.
    #[serde(default)]
    pub location: String,
    /// College name.
    #[serde(default)]
    pub college_name: String,
    /// Year of study.
    #[serde(default)]
    pub year: Option<StudyYear>,
    /// Branch of study.
    #[serde(default)]
    pub branch: String,
    /// Gender.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Course.
    #[serde(default)]
    pub course: String,
    /// Paying-guest accommodation name.
    #[serde(default)]
    pub pg_name: String,
}

impl SearchFilters {
    /// Set one field from its textual value. An empty value clears it.
    pub fn set(&mut self, key: FilterKey, value: &str) -> Result<(), AppError> {
        match key {
            FilterKey::Location => self.location = value.to_string(),
            FilterKey::CollegeName => self.college_name = value.to_string(),
            FilterKey::Branch => self.branch = value.to_string(),
            FilterKey::Course => self.course = value.to_string(),
            FilterKey::PgName => self.pg_name = value.to_string(),
            FilterKey::Year => {
                self.year = if value.trim().is_empty() {
                    None
                } else {
                    Some(value.parse()?)
                }
            }
            FilterKey::Gender => {
                self.gender = if value.trim().is_empty() {
                    None
                } else {
                    Some(value.parse()?)
                }
            }
        }
        Ok(())
    }

    /// Copy with every free-text field lower-cased, as sent to the API.
    pub fn normalized(&self) -> Self {
        Self {
            location: self.location.to_lowercase(),
            college_name: self.college_name.to_lowercase(),
            year: self.year,
            branch: self.branch.to_lowercase(),
            gender: self.gender,
            course: self.course.to_lowercase(),
            pg_name: self.pg_name.to_lowercase(),
        }
    }

    /// Non-empty normalized fields as `(name, value)` query pairs.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let n = self.normalized();
        FilterKey::ALL
            .into_iter()
            .filter_map(|key| {
                let value = match key {
                    FilterKey::Location => n.location.clone(),
                    FilterKey::CollegeName => n.college_name.clone(),
                    FilterKey::Year => n.year.map(|y| y.as_str().to_string()).unwrap_or_default(),
                    FilterKey::Branch => n.branch.clone(),
                    FilterKey::Gender => n.gender.map(|g| g.as_str().to_string()).unwrap_or_default(),
                    FilterKey::Course => n.course.clone(),
                    FilterKey::PgName => n.pg_name.clone(),
                };
                (!value.is_empty()).then_some((key.as_str(), value))
            })
            .collect()
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}
