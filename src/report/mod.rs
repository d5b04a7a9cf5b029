//! Dashboard rendering.

pub mod generator;

pub use generator::*;

use crate::cli::OutputFormat;
use crate::models::Dashboard;
use anyhow::{Context, Result};
use std::path::Path;

/// Render the dashboard in the requested format.
pub fn render(dashboard: &Dashboard, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => generate_json_report(dashboard),
        OutputFormat::Markdown => Ok(generate_markdown_report(dashboard)),
    }
}

/// Render the dashboard and write it to `path`.
pub fn write_dashboard(dashboard: &Dashboard, format: OutputFormat, path: &Path) -> Result<()> {
    let content = render(dashboard, format)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write dashboard to {}", path.display()))
}
