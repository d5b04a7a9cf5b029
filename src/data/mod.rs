//! Input tables and the preparation pipeline.
//!
//! Loading happens once per process. The resulting [`PreparedTable`] is
//! shared read-only by every aggregation.

pub mod error;
pub mod loader;
pub mod prepare;

pub use prepare::{prepare, CauseLookup, DivisionLookup};

use crate::config::Config;
use crate::models::PreparedTable;
use anyhow::Result;
use tracing::{info, warn};

/// Load the three tables named by the configuration and prepare them
/// for the configured year.
pub fn load_and_prepare(config: &Config) -> Result<PreparedTable> {
    let delimiter = config.data.delimiter_byte()?;

    let mortality_path = config.data.mortality_path();
    info!("Loading mortality table: {}", mortality_path.display());
    let deaths = loader::load_deaths(
        &mortality_path,
        &config.columns.mortality,
        delimiter,
        config.data.year,
    )?;

    let divisions_path = config.data.divisions_path();
    info!("Loading division table: {}", divisions_path.display());
    let divisions = DivisionLookup::new(loader::load_divisions(
        &divisions_path,
        &config.columns.divisions,
        delimiter,
    )?);
    if divisions.is_empty() {
        warn!("Division table is empty; every record will have an unknown department");
    }

    let causes_path = config.data.causes_path();
    info!("Loading cause table: {}", causes_path.display());
    let causes = CauseLookup::new(loader::load_causes(
        &causes_path,
        &config.columns.causes,
        delimiter,
    )?);
    if causes.is_empty() {
        warn!("Cause table is empty; every record will have an unknown cause");
    }

    info!(
        "Loaded {} mortality rows ({} for {}), {} divisions, {} causes",
        deaths.source_rows,
        deaths.rows.len(),
        config.data.year,
        divisions.len(),
        causes.len()
    );

    Ok(prepare(deaths, &divisions, &causes, config.data.year))
}
