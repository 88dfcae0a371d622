//! Per-step output for the reporting collaborator: species counts and the
//! CSV / JSON records the runner prints.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::StepSummary;
use crate::species::Species;
use crate::world::StepLedger;

/// Live members per species. Every species is present, zero counts
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Census {
    counts: BTreeMap<Species, usize>,
}

impl Census {
    pub fn new() -> Self {
        Self {
            counts: Species::all().map(|species| (species, 0)).collect(),
        }
    }

    pub fn add(&mut self, species: Species) {
        *self.counts.entry(species).or_insert(0) += 1;
    }

    pub fn count(&self, species: Species) -> usize {
        self.counts.get(&species).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of species with at least one live member.
    pub fn living_species(&self) -> usize {
        self.counts.values().filter(|count| **count > 0).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Species, usize)> + '_ {
        self.counts.iter().map(|(species, count)| (*species, *count))
    }
}

impl Default for Census {
    fn default() -> Self {
        Self::new()
    }
}

pub fn csv_header() -> String {
    let mut columns = vec!["step".to_string(), "time".to_string(), "weather".to_string()];
    columns.extend(Species::all().map(|species| species.label().to_string()));
    columns.join(",")
}

pub fn csv_row(summary: &StepSummary) -> String {
    let mut columns = vec![
        summary.step.to_string(),
        summary.phase.label().to_string(),
        summary.weather.label().to_string(),
    ];
    columns.extend(
        Species::all().map(|species| summary.census.count(species).to_string()),
    );
    columns.join(",")
}

/// One line of JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord<'a> {
    pub step: u64,
    pub day: u64,
    pub time: &'static str,
    pub weather: &'static str,
    pub census: &'a Census,
    pub ledger: &'a StepLedger,
}

impl<'a> StepRecord<'a> {
    pub fn from_summary(summary: &'a StepSummary) -> Self {
        Self {
            step: summary.step,
            day: summary.day,
            time: summary.phase.label(),
            weather: summary.weather.label(),
            census: &summary.census,
            ledger: &summary.ledger,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
