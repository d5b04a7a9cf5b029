//! Data models for the mortality dashboard.
//!
//! This module contains the typed records produced by the preparation
//! pipeline, the per-panel payload rows returned by the aggregations,
//! and the assembled dashboard document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label used when a record's division code has no match in the division table.
pub const UNKNOWN_DIVISION: &str = "Desconocido";

/// Label used when a record's cause code has no match in the cause table.
pub const UNKNOWN_CAUSE: &str = "Causa desconocida";

/// Label used for a blank sex or age-group cell.
pub const UNKNOWN_CATEGORY: &str = "Sin dato";

/// A mortality row as read from the source table, before any join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathRow {
    pub year: i32,
    pub department_code: u32,
    pub municipality_code: u32,
    pub cause_code: String,
    pub sex: String,
    pub age_group: String,
    pub month: u8,
}

/// Mortality rows handed to preparation, with the size of the source table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MortalityRows {
    pub rows: Vec<DeathRow>,
    /// Data rows in the source table, including rows of other years.
    pub source_rows: usize,
}

impl From<Vec<DeathRow>> for MortalityRows {
    fn from(rows: Vec<DeathRow>) -> Self {
        let source_rows = rows.len();
        Self { rows, source_rows }
    }
}

/// One entry of the administrative-division reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionEntry {
    pub department_code: u32,
    pub municipality_code: u32,
    pub department: String,
    pub municipality: String,
}

/// One entry of the cause-of-death reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CauseEntry {
    /// Four-character cause code.
    pub code: String,
    pub description: String,
}

/// A mortality record with division names and cause description resolved.
///
/// `department`, `municipality` and `cause_description` are never empty
/// placeholders for "missing": unresolved joins carry [`UNKNOWN_DIVISION`]
/// or [`UNKNOWN_CAUSE`]. Blank `sex` and `age_group` cells carry
/// [`UNKNOWN_CATEGORY`], so they still form a group of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MortalityRecord {
    pub year: i32,
    pub department_code: u32,
    pub municipality_code: u32,
    pub cause_code: String,
    pub sex: String,
    pub age_group: String,
    pub month: u8,
    pub department: String,
    pub municipality: String,
    pub cause_description: String,
}

/// Format a department code the way boundary datasets key their regions.
pub fn department_geo_id(code: u32) -> String {
    format!("{:02}", code)
}

/// Counters collected while preparing the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationStats {
    /// Rows read from the mortality table (all years).
    pub source_rows: usize,
    /// Rows kept after the year filter.
    pub year_rows: usize,
    /// Kept rows whose division key had no match.
    pub unresolved_divisions: usize,
    /// Kept rows whose cause code had no match.
    pub unresolved_causes: usize,
}

/// The single denormalized dataset every aggregation reads from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedTable {
    pub year: i32,
    pub records: Vec<MortalityRecord>,
    pub stats: PreparationStats,
}

impl PreparedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Deaths per department (choropleth map).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentCount {
    pub code: u32,
    /// Zero-padded code matching the boundary dataset.
    pub geo_id: String,
    pub department: String,
    pub count: usize,
}

/// Deaths per month (trend line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    pub month: u8,
    pub count: usize,
}

/// Deaths per municipality (city rankings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalityCount {
    pub municipality: String,
    pub count: usize,
}

/// Deaths per cause (causes table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseCount {
    pub code: String,
    pub description: String,
    pub count: usize,
}

/// Deaths per age-group bucket (histogram).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeGroupCount {
    pub age_group: String,
    pub count: usize,
}

/// Deaths per sex within one department (stacked bars).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SexDepartmentBreakdown {
    pub department: String,
    pub by_sex: BTreeMap<String, usize>,
    pub total: usize,
}

/// The seven widget payloads of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panels {
    pub deaths_by_department: Vec<DepartmentCount>,
    pub deaths_by_month: Vec<MonthCount>,
    pub violent_cities: Vec<MunicipalityCount>,
    pub least_deaths_cities: Vec<MunicipalityCount>,
    pub top_causes: Vec<CauseCount>,
    pub age_distribution: Vec<AgeGroupCount>,
    pub sex_by_department: Vec<SexDepartmentBreakdown>,
}

impl Panels {
    /// Returns true when every panel is empty.
    pub fn is_empty(&self) -> bool {
        self.deaths_by_department.is_empty()
            && self.deaths_by_month.is_empty()
            && self.violent_cities.is_empty()
            && self.least_deaths_cities.is_empty()
            && self.top_causes.is_empty()
            && self.age_distribution.is_empty()
            && self.sex_by_department.is_empty()
    }
}

/// Metadata about the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetadata {
    /// Dashboard title.
    pub title: String,
    /// Reporting year the records were filtered to.
    pub year: i32,
    /// Path of the mortality table.
    pub mortality_source: String,
    /// Path of the cause table.
    pub causes_source: String,
    /// Path of the division table.
    pub divisions_source: String,
    /// Preparation counters.
    pub stats: PreparationStats,
    /// Boundary dataset the map panel is drawn against.
    pub boundary_url: String,
    /// Date and time the dashboard was generated.
    pub generated_at: DateTime<Utc>,
    /// Time spent loading, preparing and aggregating, in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub panels: Panels,
}
