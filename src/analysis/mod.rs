//! Dashboard panel computation.
//!
//! The seven aggregations are independent reads of one immutable
//! prepared table, so they can be fanned out onto blocking tasks and
//! awaited together.

pub mod aggregator;

pub use aggregator::*;

use crate::config::ViewsConfig;
use crate::models::{Panels, PreparedTable};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::debug;

/// Compute every panel sequentially.
pub fn compute_panels(table: &PreparedTable, views: &ViewsConfig) -> Panels {
    Panels {
        deaths_by_department: deaths_by_department(table),
        deaths_by_month: deaths_by_month(table),
        violent_cities: violent_cities(table, views.violent_top),
        least_deaths_cities: least_deaths_cities(table, views.least_deaths),
        top_causes: top_causes(table, views.top_causes),
        age_distribution: age_distribution(table),
        sex_by_department: sex_by_department(table),
    }
}

/// Compute every panel on its own blocking task.
///
/// Produces the same panels as [`compute_panels`].
pub async fn compute_panels_concurrent(
    table: Arc<PreparedTable>,
    views: &ViewsConfig,
) -> Result<Panels> {
    debug!("Computing panels over {} records", table.len());

    let (violent_top, least_deaths, causes_limit) =
        (views.violent_top, views.least_deaths, views.top_causes);

    let t = Arc::clone(&table);
    let departments = spawn_blocking(move || deaths_by_department(&t));
    let t = Arc::clone(&table);
    let months = spawn_blocking(move || deaths_by_month(&t));
    let t = Arc::clone(&table);
    let violent = spawn_blocking(move || violent_cities(&t, violent_top));
    let t = Arc::clone(&table);
    let least = spawn_blocking(move || least_deaths_cities(&t, least_deaths));
    let t = Arc::clone(&table);
    let causes = spawn_blocking(move || top_causes(&t, causes_limit));
    let t = Arc::clone(&table);
    let ages = spawn_blocking(move || age_distribution(&t));
    let t = Arc::clone(&table);
    let sexes = spawn_blocking(move || sex_by_department(&t));

    let (
        deaths_by_department,
        deaths_by_month,
        violent_cities,
        least_deaths_cities,
        top_causes,
        age_distribution,
        sex_by_department,
    ) = tokio::try_join!(departments, months, violent, least, causes, ages, sexes)
        .context("Panel computation task failed")?;

    Ok(Panels {
        deaths_by_department,
        deaths_by_month,
        violent_cities,
        least_deaths_cities,
        top_causes,
        age_distribution,
        sex_by_department,
    })
}
