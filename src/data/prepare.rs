//! Year filter, reference joins and unknown-label substitution.

use crate::models::{
    CauseEntry, DeathRow, DivisionEntry, MortalityRecord, MortalityRows, PreparationStats,
    PreparedTable, UNKNOWN_CATEGORY, UNKNOWN_CAUSE, UNKNOWN_DIVISION,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Division names keyed by (department code, municipality code).
#[derive(Debug, Default)]
pub struct DivisionLookup {
    entries: HashMap<(u32, u32), DivisionEntry>,
}

impl DivisionLookup {
    /// Build the lookup. The first entry for a key wins so that a join
    /// never yields more than one match per record.
    pub fn new(entries: Vec<DivisionEntry>) -> Self {
        let mut map = HashMap::with_capacity(entries.len());
        let mut duplicates = 0usize;

        for entry in entries {
            let key = (entry.department_code, entry.municipality_code);
            if map.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            map.insert(key, entry);
        }

        if duplicates > 0 {
            debug!("Ignored {} duplicate division entries", duplicates);
        }

        Self { entries: map }
    }

    pub fn get(&self, department_code: u32, municipality_code: u32) -> Option<&DivisionEntry> {
        self.entries.get(&(department_code, municipality_code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cause descriptions keyed by the exact cause code.
#[derive(Debug, Default)]
pub struct CauseLookup {
    entries: HashMap<String, String>,
}

impl CauseLookup {
    /// Build the lookup; first entry for a code wins. Rows without a
    /// code are ignored.
    pub fn new(entries: Vec<CauseEntry>) -> Self {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries.into_iter().filter(|e| !e.code.is_empty()) {
            map.entry(entry.code).or_insert(entry.description);
        }
        Self { entries: map }
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A mortality row after both left joins, before unknown-label substitution.
#[derive(Debug, Clone)]
struct JoinedRow {
    row: DeathRow,
    department: Option<String>,
    municipality: Option<String>,
    cause_description: Option<String>,
}

/// Keep only the rows of the given year.
pub fn filter_year(rows: Vec<DeathRow>, year: i32) -> Vec<DeathRow> {
    rows.into_iter().filter(|row| row.year == year).collect()
}

/// A blank reference cell resolves nothing.
fn non_blank(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn join_divisions(rows: Vec<DeathRow>, divisions: &DivisionLookup) -> Vec<JoinedRow> {
    rows.into_iter()
        .map(|row| {
            let division = divisions.get(row.department_code, row.municipality_code);
            JoinedRow {
                department: division.and_then(|d| non_blank(&d.department)),
                municipality: division.and_then(|d| non_blank(&d.municipality)),
                cause_description: None,
                row,
            }
        })
        .collect()
}

fn join_causes(rows: &mut [JoinedRow], causes: &CauseLookup) {
    for joined in rows.iter_mut() {
        joined.cause_description = causes.get(&joined.row.cause_code).and_then(non_blank);
    }
}

fn or_unknown(value: String) -> String {
    if value.is_empty() {
        UNKNOWN_CATEGORY.to_string()
    } else {
        value
    }
}

fn fill_unknown(joined: JoinedRow) -> MortalityRecord {
    let JoinedRow {
        row,
        department,
        municipality,
        cause_description,
    } = joined;

    MortalityRecord {
        year: row.year,
        department_code: row.department_code,
        municipality_code: row.municipality_code,
        cause_code: row.cause_code,
        sex: or_unknown(row.sex),
        age_group: or_unknown(row.age_group),
        month: row.month,
        department: department.unwrap_or_else(|| UNKNOWN_DIVISION.to_string()),
        municipality: municipality.unwrap_or_else(|| UNKNOWN_DIVISION.to_string()),
        cause_description: cause_description.unwrap_or_else(|| UNKNOWN_CAUSE.to_string()),
    }
}

/// Build the prepared table for one reporting year.
///
/// Filters to `year`, left-joins division names and cause descriptions,
/// then substitutes the unknown labels for every unresolved field, blank
/// reference names included. Rows are never dropped by a join.
pub fn prepare(
    deaths: impl Into<MortalityRows>,
    divisions: &DivisionLookup,
    causes: &CauseLookup,
    year: i32,
) -> PreparedTable {
    let MortalityRows { rows, source_rows } = deaths.into();

    let kept = filter_year(rows, year);
    let year_rows = kept.len();
    if kept.is_empty() {
        warn!("No mortality records found for year {}", year);
    }

    let mut joined = join_divisions(kept, divisions);
    join_causes(&mut joined, causes);

    let unresolved_divisions = joined
        .iter()
        .filter(|j| j.department.is_none() || j.municipality.is_none())
        .count();
    let unresolved_causes = joined
        .iter()
        .filter(|j| j.cause_description.is_none())
        .count();

    let records: Vec<MortalityRecord> = joined.into_iter().map(fill_unknown).collect();

    let stats = PreparationStats {
        source_rows,
        year_rows,
        unresolved_divisions,
        unresolved_causes,
    };

    info!(
        "Prepared {} records for {} ({} read, {} without division, {} without cause)",
        records.len(),
        year,
        source_rows,
        unresolved_divisions,
        unresolved_causes
    );

    PreparedTable {
        year,
        records,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn death(year: i32, department_code: u32, municipality_code: u32, cause: &str) -> DeathRow {
        DeathRow {
            year,
            department_code,
            municipality_code,
            cause_code: cause.to_string(),
            sex: "1".to_string(),
            age_group: "20".to_string(),
            month: 1,
        }
    }

    fn division(
        department_code: u32,
        municipality_code: u32,
        department: &str,
        municipality: &str,
    ) -> DivisionEntry {
        DivisionEntry {
            department_code,
            municipality_code,
            department: department.to_string(),
            municipality: municipality.to_string(),
        }
    }

    fn cause(code: &str, description: &str) -> CauseEntry {
        CauseEntry {
            code: code.to_string(),
            description: description.to_string(),
        }
    }

    fn lookups() -> (DivisionLookup, CauseLookup) {
        let divisions = DivisionLookup::new(vec![
            division(5, 1, "ANTIOQUIA", "MEDELLÍN"),
            division(11, 1, "BOGOTÁ, D.C.", "BOGOTÁ, D.C."),
        ]);
        let causes = CauseLookup::new(vec![
            cause("X954", "Agresión con disparo de otras armas de fuego"),
            cause("I219", "Infarto agudo del miocardio"),
        ]);
        (divisions, causes)
    }

    #[test]
    fn test_filter_year() {
        let rows = vec![
            death(2019, 5, 1, "X954"),
            death(2018, 5, 1, "X954"),
            death(2019, 11, 1, "I219"),
        ];
        let filtered = filter_year(rows, 2019);

        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.year == 2019));
    }

    #[test]
    fn test_filter_year_is_idempotent() {
        let rows = vec![
            death(2019, 5, 1, "X954"),
            death(2020, 5, 1, "X954"),
            death(2019, 11, 1, "I219"),
        ];
        let once = filter_year(rows, 2019);
        let twice = filter_year(once.clone(), 2019);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_prepare_resolves_joins() {
        let (divisions, causes) = lookups();
        let table = prepare(vec![death(2019, 5, 1, "X954")], &divisions, &causes, 2019);

        assert_eq!(table.len(), 1);
        let record = &table.records[0];
        assert_eq!(record.department, "ANTIOQUIA");
        assert_eq!(record.municipality, "MEDELLÍN");
        assert_eq!(record.cause_description, "Agresión con disparo de otras armas de fuego");
        assert_eq!(table.stats.unresolved_divisions, 0);
        assert_eq!(table.stats.unresolved_causes, 0);
    }

    #[test]
    fn test_unresolved_department_gets_unknown_label() {
        let (divisions, causes) = lookups();
        let table = prepare(vec![death(2019, 99, 1, "I219")], &divisions, &causes, 2019);

        let record = &table.records[0];
        assert_eq!(record.department, UNKNOWN_DIVISION);
        assert_eq!(record.municipality, UNKNOWN_DIVISION);
        assert_eq!(record.department, "Desconocido");
        assert_eq!(table.stats.unresolved_divisions, 1);
    }

    #[test]
    fn test_unresolved_cause_gets_unknown_label() {
        let (divisions, causes) = lookups();
        // Three-character codes do not match the four-character table.
        let table = prepare(vec![death(2019, 5, 1, "X95")], &divisions, &causes, 2019);

        assert_eq!(table.records[0].cause_description, "Causa desconocida");
        assert_eq!(table.stats.unresolved_causes, 1);
    }

    #[test]
    fn test_every_record_has_labels() {
        let (divisions, causes) = lookups();
        let rows = vec![
            death(2019, 5, 1, "X954"),
            death(2019, 5, 2, "ZZZZ"),
            death(2019, 11, 1, ""),
            death(2019, 70, 400, "I219"),
        ];
        let table = prepare(rows, &divisions, &causes, 2019);

        assert_eq!(table.len(), 4);
        for record in &table.records {
            assert!(!record.department.is_empty());
            assert!(!record.municipality.is_empty());
            assert!(!record.cause_description.is_empty());
        }
    }

    #[test]
    fn test_blank_reference_names_get_unknown_labels() {
        let divisions = DivisionLookup::new(vec![
            division(5, 1, "ANTIOQUIA", ""),
            division(11, 1, "", "BOGOTÁ, D.C."),
        ]);
        let causes = CauseLookup::new(vec![cause("I219", "")]);
        let rows = vec![death(2019, 5, 1, "I219"), death(2019, 11, 1, "I219")];

        let table = prepare(rows, &divisions, &causes, 2019);

        assert_eq!(table.records[0].department, "ANTIOQUIA");
        assert_eq!(table.records[0].municipality, UNKNOWN_DIVISION);
        assert_eq!(table.records[0].cause_description, UNKNOWN_CAUSE);
        assert_eq!(table.records[1].department, UNKNOWN_DIVISION);
        assert_eq!(table.records[1].municipality, "BOGOTÁ, D.C.");
        assert_eq!(table.stats.unresolved_divisions, 2);
        assert_eq!(table.stats.unresolved_causes, 2);
    }

    #[test]
    fn test_blank_categories_are_labelled() {
        let (divisions, causes) = lookups();
        let mut row = death(2019, 5, 1, "");
        row.sex = String::new();
        row.age_group = String::new();

        let table = prepare(vec![row], &divisions, &causes, 2019);
        let record = &table.records[0];

        assert_eq!(record.sex, UNKNOWN_CATEGORY);
        assert_eq!(record.age_group, UNKNOWN_CATEGORY);
        assert_eq!(record.cause_code, "");
        assert_eq!(record.cause_description, UNKNOWN_CAUSE);
    }

    #[test]
    fn test_blank_cause_code_never_matches() {
        let causes = CauseLookup::new(vec![cause("", "Sin código"), cause("I219", "Infarto")]);
        assert_eq!(causes.len(), 1);
        assert_eq!(causes.get(""), None);
    }

    #[test]
    fn test_source_rows_counted_from_whole_table() {
        let (divisions, causes) = lookups();
        let deaths = MortalityRows {
            rows: vec![death(2019, 5, 1, "X954")],
            source_rows: 40,
        };
        let table = prepare(deaths, &divisions, &causes, 2019);

        assert_eq!(table.stats.source_rows, 40);
        assert_eq!(table.stats.year_rows, 1);
    }

    #[test]
    fn test_duplicate_lookup_keys_do_not_multiply_rows() {
        let divisions = DivisionLookup::new(vec![
            division(5, 1, "ANTIOQUIA", "MEDELLÍN"),
            division(5, 1, "ANTIOQUIA", "MEDELLIN (DUP)"),
        ]);
        let causes = CauseLookup::new(vec![cause("I219", "first"), cause("I219", "second")]);
        assert_eq!(divisions.len(), 1);
        assert_eq!(causes.len(), 1);

        let table = prepare(vec![death(2019, 5, 1, "I219")], &divisions, &causes, 2019);
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].municipality, "MEDELLÍN");
        assert_eq!(table.records[0].cause_description, "first");
    }

    #[test]
    fn test_missing_year_yields_empty_table() {
        let (divisions, causes) = lookups();
        let table = prepare(vec![death(2018, 5, 1, "X954")], &divisions, &causes, 2019);

        assert!(table.is_empty());
        assert_eq!(table.year, 2019);
        assert_eq!(table.stats.source_rows, 1);
        assert_eq!(table.stats.year_rows, 0);
    }
}
