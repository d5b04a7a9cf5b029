//! Markdown and JSON dashboard rendering.
//!
//! Each panel becomes one Markdown section with a table; JSON output is
//! the serialized dashboard, one payload per panel.

use crate::models::{
    AgeGroupCount, CauseCount, Dashboard, DashboardMetadata, DepartmentCount, MonthCount,
    MunicipalityCount, Panels, SexDepartmentBreakdown,
};
use anyhow::Result;
use std::cmp::Reverse;
use std::collections::BTreeSet;

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

const NO_RECORDS: &str = "_No records for this panel._\n\n";

/// Section titles and anchors, in render order.
const SECTIONS: [(&str, &str); 8] = [
    ("Metadata", "metadata"),
    ("Deaths by Department", "deaths-by-department"),
    ("Deaths by Month", "deaths-by-month"),
    ("Cities with Most Homicides", "cities-with-most-homicides"),
    ("Cities with Fewest Deaths", "cities-with-fewest-deaths"),
    ("Leading Causes of Death", "leading-causes-of-death"),
    ("Age Distribution", "age-distribution"),
    ("Deaths by Sex and Department", "deaths-by-sex-and-department"),
];

/// Generate a complete Markdown dashboard.
pub fn generate_markdown_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();
    let panels = &dashboard.panels;

    output.push_str(&format!(
        "# {} ({})\n\n",
        dashboard.metadata.title, dashboard.metadata.year
    ));

    output.push_str(&generate_table_of_contents());
    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_department_section(
        &panels.deaths_by_department,
        &dashboard.metadata.boundary_url,
    ));
    output.push_str(&generate_month_section(&panels.deaths_by_month));
    output.push_str(&generate_city_section(
        SECTIONS[3].0,
        "Homicides",
        &panels.violent_cities,
    ));
    output.push_str(&generate_city_section(
        SECTIONS[4].0,
        "Deaths",
        &panels.least_deaths_cities,
    ));
    output.push_str(&generate_causes_section(&panels.top_causes));
    output.push_str(&generate_age_section(&panels.age_distribution));
    output.push_str(&generate_sex_department_section(&panels.sex_by_department));
    output.push_str(&generate_footer());

    output
}

fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for (title, anchor) in SECTIONS {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor));
    }
    toc.push('\n');

    toc
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();
    let stats = &metadata.stats;

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Reporting Year:** {}\n", metadata.year));
    section.push_str(&format!(
        "- **Mortality Table:** `{}`\n",
        metadata.mortality_source
    ));
    section.push_str(&format!("- **Cause Table:** `{}`\n", metadata.causes_source));
    section.push_str(&format!(
        "- **Division Table:** `{}`\n",
        metadata.divisions_source
    ));
    section.push_str(&format!("- **Rows Read:** {}\n", stats.source_rows));
    section.push_str(&format!("- **Records for Year:** {}\n", stats.year_rows));
    if stats.unresolved_divisions > 0 {
        section.push_str(&format!(
            "- **Records without Division:** {}\n",
            stats.unresolved_divisions
        ));
    }
    if stats.unresolved_causes > 0 {
        section.push_str(&format!(
            "- **Records without Cause Description:** {}\n",
            stats.unresolved_causes
        ));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_department_section(rows: &[DepartmentCount], boundary_url: &str) -> String {
    let mut section = format!("## {}\n\n", SECTIONS[1].0);

    if rows.is_empty() {
        section.push_str(NO_RECORDS);
        return section;
    }

    section.push_str(&format!("Region boundaries: <{}>\n\n", boundary_url));
    section.push_str("| Code | Department | Deaths |\n");
    section.push_str("|:---:|:---|---:|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            row.geo_id,
            escape_cell(&row.department),
            row.count
        ));
    }
    section.push('\n');

    section
}

fn generate_month_section(rows: &[MonthCount]) -> String {
    let mut section = format!("## {}\n\n", SECTIONS[2].0);

    if rows.is_empty() {
        section.push_str(NO_RECORDS);
        return section;
    }

    section.push_str("| Month | Deaths |\n");
    section.push_str("|:---|---:|\n");
    for row in rows {
        section.push_str(&format!("| {} | {} |\n", month_name(row.month), row.count));
    }
    section.push('\n');

    section
}

fn generate_city_section(title: &str, count_label: &str, rows: &[MunicipalityCount]) -> String {
    let mut section = format!("## {}\n\n", title);

    if rows.is_empty() {
        section.push_str(NO_RECORDS);
        return section;
    }

    let total: usize = rows.iter().map(|r| r.count).sum();

    section.push_str(&format!("| Municipality | {} | Share |\n", count_label));
    section.push_str("|:---|---:|---:|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            escape_cell(&row.municipality),
            row.count,
            share(row.count, total)
        ));
    }
    section.push('\n');

    section
}

fn generate_causes_section(rows: &[CauseCount]) -> String {
    let mut section = format!("## {}\n\n", SECTIONS[5].0);

    if rows.is_empty() {
        section.push_str(NO_RECORDS);
        return section;
    }

    section.push_str("| Code | Description | Total |\n");
    section.push_str("|:---|:---|---:|\n");
    for row in rows {
        section.push_str(&format!(
            "| `{}` | {} | {} |\n",
            row.code,
            escape_cell(&row.description),
            row.count
        ));
    }
    section.push('\n');

    section
}

/// Age buckets are listed by descending count.
fn generate_age_section(rows: &[AgeGroupCount]) -> String {
    let mut section = format!("## {}\n\n", SECTIONS[6].0);

    if rows.is_empty() {
        section.push_str(NO_RECORDS);
        return section;
    }

    let mut sorted: Vec<&AgeGroupCount> = rows.iter().collect();
    sorted.sort_by_key(|r| Reverse(r.count));

    section.push_str("| Age Group | Deaths |\n");
    section.push_str("|:---|---:|\n");
    for row in sorted {
        section.push_str(&format!(
            "| {} | {} |\n",
            escape_cell(&row.age_group),
            row.count
        ));
    }
    section.push('\n');

    section
}

fn generate_sex_department_section(rows: &[SexDepartmentBreakdown]) -> String {
    let mut section = format!("## {}\n\n", SECTIONS[7].0);

    if rows.is_empty() {
        section.push_str(NO_RECORDS);
        return section;
    }

    let sexes: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.by_sex.keys().map(String::as_str))
        .collect();

    section.push_str("| Department |");
    for sex in &sexes {
        section.push_str(&format!(" Sex {} |", escape_cell(sex)));
    }
    section.push_str(" Total |\n");

    section.push_str("|:---|");
    for _ in &sexes {
        section.push_str("---:|");
    }
    section.push_str("---:|\n");

    for row in rows {
        section.push_str(&format!("| {} |", escape_cell(&row.department)));
        for sex in &sexes {
            let count = row.by_sex.get(*sex).copied().unwrap_or(0);
            section.push_str(&format!(" {} |", count));
        }
        section.push_str(&format!(" {} |\n", row.total));
    }
    section.push('\n');

    section
}

/// Generate the dashboard footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Dashboard generated by mortdash v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

fn month_name(month: u8) -> String {
    match month {
        1..=12 => MONTH_NAMES[month as usize - 1].to_string(),
        other => other.to_string(),
    }
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// Keep cell text from breaking the table layout.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate a JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// Short plain-text summary for the terminal.
pub fn generate_summary_text(panels: &Panels) -> String {
    if panels.is_empty() {
        return "No records for the reporting year.".to_string();
    }

    let mut lines = Vec::new();

    let total: usize = panels.deaths_by_month.iter().map(|m| m.count).sum();
    lines.push(format!("Total deaths: {}", total));

    if let Some(peak) = panels.deaths_by_month.iter().max_by_key(|m| m.count) {
        lines.push(format!(
            "Peak month: {} ({})",
            month_name(peak.month),
            peak.count
        ));
    }
    if let Some(top) = panels.deaths_by_department.iter().max_by_key(|d| d.count) {
        lines.push(format!("Top department: {} ({})", top.department, top.count));
    }
    if let Some(city) = panels.violent_cities.first() {
        lines.push(format!(
            "Most homicides: {} ({})",
            city.municipality, city.count
        ));
    }
    if let Some(cause) = panels.top_causes.first() {
        lines.push(format!(
            "Leading cause: {} {} ({})",
            cause.code, cause.description, cause.count
        ));
    }

    lines.join("\n")
}
