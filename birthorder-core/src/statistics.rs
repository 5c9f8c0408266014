//! Summary statistics over stored submissions.
//!
//! Every backend reduces its records to per-(region, gender) [`GroupAggregate`]s
//! and calls [`recombine`]. Group means are re-weighted by group size, so the
//! result equals a single pass over the raw records whether the grouping ran
//! in process or inside a database.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::submission::{Gender, Region, Submission};

/// Count and means for one (region, gender) group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupAggregate {
    pub region: Region,
    pub gender: Gender,
    pub count: u64,
    pub mean_family_size: f64,
    pub mean_attitude_score: f64,
    pub mean_education_difference: f64,
}

/// Submissions in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCount {
    pub region: Region,
    pub count: u64,
}

/// Submissions per firstborn gender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderDistribution {
    pub male: u64,
    pub female: u64,
}

impl GenderDistribution {
    fn add(&mut self, gender: Gender, count: u64) {
        match gender {
            Gender::Male => self.male += count,
            Gender::Female => self.female += count,
        }
    }
}

/// Aggregate view of all submissions.
///
/// Means are kept at full precision; the serialized form renders them with the
/// dashboard's fixed decimal places.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_submissions: u64,
    #[serde(serialize_with = "two_places")]
    pub average_family_size: f64,
    #[serde(serialize_with = "three_places")]
    pub average_attitude_score: f64,
    #[serde(serialize_with = "two_places")]
    pub average_education_difference: f64,
    /// Sorted by count, largest first
    pub regions: Vec<RegionCount>,
    pub gender_distribution: GenderDistribution,
}

/// Result of aggregation; an empty collection is not a zero-valued result.
#[derive(Debug, Clone, PartialEq)]
pub enum StatisticsOutcome {
    NoData,
    Computed(Statistics),
}

impl StatisticsOutcome {
    pub fn statistics(&self) -> Option<&Statistics> {
        match self {
            Self::NoData => None,
            Self::Computed(stats) => Some(stats),
        }
    }
}

/// Render a mean with a fixed number of decimals.
pub fn format_fixed(value: f64, places: usize) -> String {
    format!("{:.*}", places, value)
}

fn two_places<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_fixed(*value, 2))
}

fn three_places<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_fixed(*value, 3))
}

#[derive(Default)]
struct GroupSums {
    count: u64,
    family_size: f64,
    attitude_score: f64,
    education_difference: f64,
}

/// Group raw records by (region, gender), as a `GROUP BY` would.
pub fn group(records: &[Submission]) -> Vec<GroupAggregate> {
    let mut sums: BTreeMap<(Region, Gender), GroupSums> = BTreeMap::new();
    for record in records {
        let entry = sums
            .entry((record.region, record.firstborn_gender))
            .or_default();
        entry.count += 1;
        entry.family_size += f64::from(record.family_size);
        entry.attitude_score += record.attitude_score;
        entry.education_difference += record.education_difference();
    }

    sums.into_iter()
        .map(|((region, gender), s)| {
            let n = s.count as f64;
            GroupAggregate {
                region,
                gender,
                count: s.count,
                mean_family_size: s.family_size / n,
                mean_attitude_score: s.attitude_score / n,
                mean_education_difference: s.education_difference / n,
            }
        })
        .collect()
}

/// Combine group aggregates into global statistics.
///
/// Each group mean is multiplied back by its count before summing; averaging
/// group means directly would over-weight small groups.
pub fn recombine(groups: &[GroupAggregate]) -> StatisticsOutcome {
    let total: u64 = groups.iter().map(|g| g.count).sum();
    if total == 0 {
        return StatisticsOutcome::NoData;
    }

    let mut family_size = 0.0;
    let mut attitude_score = 0.0;
    let mut education_difference = 0.0;
    let mut regions: BTreeMap<Region, u64> = BTreeMap::new();
    let mut genders = GenderDistribution::default();

    for g in groups.iter().filter(|g| g.count > 0) {
        let weight = g.count as f64;
        family_size += g.mean_family_size * weight;
        attitude_score += g.mean_attitude_score * weight;
        education_difference += g.mean_education_difference * weight;
        *regions.entry(g.region).or_default() += g.count;
        genders.add(g.gender, g.count);
    }

    let mut regions: Vec<RegionCount> = regions
        .into_iter()
        .map(|(region, count)| RegionCount { region, count })
        .collect();
    // BTreeMap order breaks ties by region
    regions.sort_by(|a, b| b.count.cmp(&a.count));

    let n = total as f64;
    StatisticsOutcome::Computed(Statistics {
        total_submissions: total,
        average_family_size: family_size / n,
        average_attitude_score: attitude_score / n,
        average_education_difference: education_difference / n,
        regions,
        gender_distribution: genders,
    })
}

/// Compute statistics over every record.
pub fn compute_statistics(records: &[Submission]) -> StatisticsOutcome {
    recombine(&group(records))
}
