//! Grouped counts over the prepared table.
//!
//! Every function here is pure: it reads the prepared table and returns a
//! freshly computed payload for one dashboard panel. Rankings use a stable
//! sort, so equal counts keep the order in which their group first appears
//! in the table.

use crate::models::{
    department_geo_id, AgeGroupCount, CauseCount, DepartmentCount, MonthCount, MortalityRecord,
    MunicipalityCount, PreparedTable, SexDepartmentBreakdown,
};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Cause-code prefixes counted as assault and firearm deaths.
pub const VIOLENT_CAUSE_PREFIXES: [&str; 8] =
    ["X95", "X96", "X97", "X98", "X99", "Y00", "Y01", "Y02"];

/// Count records per key, in first-seen key order.
fn count_by<'a, K, I, F>(records: I, key: F) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = &'a MortalityRecord>,
    F: Fn(&MortalityRecord) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();

    for record in records {
        let k = key(record);
        match index.get(&k) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(k.clone(), counts.len());
                counts.push((k, 1));
            }
        }
    }

    counts
}

/// Returns true if the cause code falls in the assault/firearm range.
pub fn is_violent_cause(code: &str) -> bool {
    VIOLENT_CAUSE_PREFIXES
        .iter()
        .any(|prefix| code.starts_with(prefix))
}

/// Deaths per department, for the choropleth map.
pub fn deaths_by_department(table: &PreparedTable) -> Vec<DepartmentCount> {
    count_by(&table.records, |r| (r.department_code, r.department.clone()))
        .into_iter()
        .map(|((code, department), count)| DepartmentCount {
            code,
            geo_id: department_geo_id(code),
            department,
            count,
        })
        .collect()
}

/// Deaths per month, ascending by month.
pub fn deaths_by_month(table: &PreparedTable) -> Vec<MonthCount> {
    let mut months: Vec<MonthCount> = count_by(&table.records, |r| r.month)
        .into_iter()
        .map(|(month, count)| MonthCount { month, count })
        .collect();

    months.sort_by_key(|m| m.month);
    months
}

/// Municipalities with the most assault/firearm deaths.
pub fn violent_cities(table: &PreparedTable, limit: usize) -> Vec<MunicipalityCount> {
    let violent = table
        .records
        .iter()
        .filter(|r| is_violent_cause(&r.cause_code));

    let mut cities = municipality_counts(violent);
    cities.sort_by_key(|c| Reverse(c.count));
    cities.truncate(limit);
    cities
}

/// Municipalities with the fewest deaths overall.
pub fn least_deaths_cities(table: &PreparedTable, limit: usize) -> Vec<MunicipalityCount> {
    let mut cities = municipality_counts(&table.records);
    cities.sort_by_key(|c| c.count);
    cities.truncate(limit);
    cities
}

fn municipality_counts<'a, I>(records: I) -> Vec<MunicipalityCount>
where
    I: IntoIterator<Item = &'a MortalityRecord>,
{
    count_by(records, |r| r.municipality.clone())
        .into_iter()
        .map(|(municipality, count)| MunicipalityCount {
            municipality,
            count,
        })
        .collect()
}

/// Most frequent (code, description) pairs.
pub fn top_causes(table: &PreparedTable, limit: usize) -> Vec<CauseCount> {
    let mut causes: Vec<CauseCount> = count_by(&table.records, |r| {
        (r.cause_code.clone(), r.cause_description.clone())
    })
    .into_iter()
    .map(|((code, description), count)| CauseCount {
        code,
        description,
        count,
    })
    .collect();

    causes.sort_by_key(|c| Reverse(c.count));
    causes.truncate(limit);
    causes
}

/// Deaths per age-group bucket, in first-seen order.
pub fn age_distribution(table: &PreparedTable) -> Vec<AgeGroupCount> {
    count_by(&table.records, |r| r.age_group.clone())
        .into_iter()
        .map(|(age_group, count)| AgeGroupCount { age_group, count })
        .collect()
}

/// Deaths per sex within each department, for stacked bars.
pub fn sex_by_department(table: &PreparedTable) -> Vec<SexDepartmentBreakdown> {
    let mut breakdowns: Vec<SexDepartmentBreakdown> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for ((department, sex), count) in
        count_by(&table.records, |r| (r.department.clone(), r.sex.clone()))
    {
        let i = *index.entry(department.clone()).or_insert_with(|| {
            breakdowns.push(SexDepartmentBreakdown {
                department,
                by_sex: BTreeMap::new(),
                total: 0,
            });
            breakdowns.len() - 1
        });

        let breakdown = &mut breakdowns[i];
        *breakdown.by_sex.entry(sex).or_default() += count;
        breakdown.total += count;
    }

    breakdowns
}
