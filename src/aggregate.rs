//! Linear-scan statistics over bucket contents.
//!
//! Location matching is case-insensitive. An empty match yields `None`
//! ("no score"), never zero. Nothing is rounded here.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::records::{Located, Rating, Report, ReportType, SafetyReport, SafetyStatus};


fn same_location(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn matching<'a, T: Located + 'a>(records: &'a [T], location: &'a str) -> impl Iterator<Item = &'a T> + 'a {
    records.iter().filter(move |r| same_location(r.location(), location))
}

pub fn average_score(ratings: &[Rating], location: &str) -> Option<f64> {
    let (sum, count) = matching(ratings, location)
        .fold((0u64, 0u64), |(sum, count), r| (sum + u64::from(r.rating), count + 1));

    if count == 0 {
        None
    }
    else {
        Some(sum as f64 / count as f64)
    }
}

pub fn safety_ratio(reports: &[SafetyReport], location: &str) -> Option<f64> {
    let (safe, total) = matching(reports, location)
        .fold((0u64, 0u64), |(safe, total), r| {
            (safe + (r.status == SafetyStatus::Safe) as u64, total + 1)
        });

    if total == 0 {
        None
    }
    else {
        Some(safe as f64 / total as f64)
    }
}

/// Percentage form of [`safety_ratio`], as shown next to each location.
pub fn safety_score(reports: &[SafetyReport], location: &str) -> Option<f64> {
    safety_ratio(reports, location).map(|ratio| ratio * 100.0)
}

/// Distinct locations in first-seen order, compared exactly.
pub fn distinct_locations<T: Located>(records: &[T]) -> Vec<String> {
    let mut seen = HashSet::new();
    records.iter()
        .map(|r| r.location())
        .filter(|loc| seen.insert(*loc))
        .map(|loc| loc.to_owned())
        .collect()
}


#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationAverage {
    pub location: String,
    pub average: Option<f64>,
}

pub fn location_averages(ratings: &[Rating]) -> Vec<LocationAverage> {
    distinct_locations(ratings)
        .into_iter()
        .map(|location| LocationAverage {
            average: average_score(ratings, &location),
            location,
        })
        .collect()
}


#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TypeCounts {
    pub total: usize,
    pub by_type: BTreeMap<&'static str, usize>,
}

pub fn count_by_type<'a, I>(reports: I) -> TypeCounts where
    I: IntoIterator<Item = &'a Report> {

    let mut counts = TypeCounts::default();
    for kind in ReportType::ALL.iter() {
        counts.by_type.insert(kind.as_str(), 0);
    }

    for report in reports {
        *counts.by_type.entry(report.kind.as_str()).or_insert(0) += 1;
        counts.total += 1;
    }

    counts
}
