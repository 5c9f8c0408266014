//! Submission record and its fixed enumerations.
//!
//! Enum values serialize to the exact strings the survey form posts, so the
//! wire format and the stored format agree without a translation table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cultural region of the respondent's family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Canadian,
    #[serde(rename = "Pacific Islander")]
    PacificIslander,
    #[serde(rename = "Western European")]
    WesternEuropean,
    British,
    #[serde(rename = "Central American")]
    CentralAmerican,
    #[serde(rename = "South American")]
    SouthAmerican,
    Caribbean,
    #[serde(rename = "Eastern European")]
    EasternEuropean,
    #[serde(rename = "Northern European")]
    NorthernEuropean,
    #[serde(rename = "East Asian")]
    EastAsian,
    African,
    #[serde(rename = "South Asian")]
    SouthAsian,
    #[serde(rename = "Middle Eastern")]
    MiddleEastern,
    Other,
}

impl Region {
    pub const ALL: [Region; 14] = [
        Region::Canadian,
        Region::PacificIslander,
        Region::WesternEuropean,
        Region::British,
        Region::CentralAmerican,
        Region::SouthAmerican,
        Region::Caribbean,
        Region::EasternEuropean,
        Region::NorthernEuropean,
        Region::EastAsian,
        Region::African,
        Region::SouthAsian,
        Region::MiddleEastern,
        Region::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Canadian => "Canadian",
            Region::PacificIslander => "Pacific Islander",
            Region::WesternEuropean => "Western European",
            Region::British => "British",
            Region::CentralAmerican => "Central American",
            Region::SouthAmerican => "South American",
            Region::Caribbean => "Caribbean",
            Region::EasternEuropean => "Eastern European",
            Region::NorthernEuropean => "Northern European",
            Region::EastAsian => "East Asian",
            Region::African => "African",
            Region::SouthAsian => "South Asian",
            Region::MiddleEastern => "Middle Eastern",
            Region::Other => "Other",
        }
    }
}

/// Gender of the firstborn child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Respondent age bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "18-25")]
    From18To25,
    #[serde(rename = "26-30")]
    From26To30,
    #[serde(rename = "31-35")]
    From31To35,
    #[serde(rename = "35+")]
    Over35,
}

impl AgeRange {
    pub const ALL: [AgeRange; 4] = [
        AgeRange::From18To25,
        AgeRange::From26To30,
        AgeRange::From31To35,
        AgeRange::Over35,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRange::From18To25 => "18-25",
            AgeRange::From26To30 => "26-30",
            AgeRange::From31To35 => "31-35",
            AgeRange::Over35 => "35+",
        }
    }
}

/// Returned when a string is not one of an enumeration's values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! str_enum_impls {
    ($ty:ty) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownVariant(s.to_owned()))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum_impls!(Region);
str_enum_impls!(Gender);
str_enum_impls!(AgeRange);

/// Request metadata captured alongside a submission.
///
/// Never taken from the submitted body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A validated submission that has not been stored yet.
///
/// Only [`crate::validation::validate`] builds one from user input, so every
/// value here already satisfies the field constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub region: Region,
    pub family_size: u8,
    pub firstborn_gender: Gender,
    pub attitude_score: f64,
    pub firstborn_education: f64,
    pub laterborn_education: f64,
    pub age_range: AgeRange,
    pub notes: String,
    pub contact_email: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewSubmission {
    /// Attach the store-generated identifier and timestamp.
    pub fn into_stored(self, id: impl Into<String>, timestamp: DateTime<Utc>) -> Submission {
        Submission {
            id: id.into(),
            region: self.region,
            family_size: self.family_size,
            firstborn_gender: self.firstborn_gender,
            attitude_score: self.attitude_score,
            firstborn_education: self.firstborn_education,
            laterborn_education: self.laterborn_education,
            age_range: self.age_range,
            notes: self.notes,
            contact_email: self.contact_email,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            timestamp,
        }
    }
}

/// A stored submission as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub region: Region,
    pub family_size: u8,
    pub firstborn_gender: Gender,
    pub attitude_score: f64,
    pub firstborn_education: f64,
    pub laterborn_education: f64,
    pub age_range: AgeRange,
    pub notes: String,
    pub contact_email: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Submission {
    /// Firstborn minus laterborn years of education.
    pub fn education_difference(&self) -> f64 {
        self.firstborn_education - self.laterborn_education
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_round_trips_through_str() {
        for region in Region::ALL {
            assert_eq!(region.as_str().parse::<Region>().unwrap(), region);
        }
        assert!("Atlantis".parse::<Region>().is_err());
    }

    #[test]
    fn serde_uses_form_values() {
        assert_eq!(
            serde_json::to_string(&Region::PacificIslander).unwrap(),
            "\"Pacific Islander\""
        );
        assert_eq!(serde_json::to_string(&AgeRange::Over35).unwrap(), "\"35+\"");
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
    }

    #[test]
    fn enum_parsing_is_case_sensitive() {
        assert!("Male".parse::<Gender>().is_err());
        assert!("british".parse::<Region>().is_err());
    }
}
