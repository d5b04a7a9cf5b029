//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.mortdash.toml` files.

use crate::cli::OutputFormat;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".mortdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input data settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Column names of the three input tables.
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Panel settings.
    #[serde(default)]
    pub views: ViewsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

impl GeneralConfig {
    /// Log level for this run. `quiet` comes from the command line and
    /// wins over `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn default_output() -> String {
    "mortality_dashboard.md".to_string()
}

/// Input file locations and the reporting year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory the table file names are resolved against.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Mortality table file.
    #[serde(default = "default_mortality")]
    pub mortality: String,

    /// Cause-of-death description table file.
    #[serde(default = "default_causes")]
    pub causes: String,

    /// Administrative-division table file.
    #[serde(default = "default_divisions")]
    pub divisions: String,

    /// Reporting year.
    #[serde(default = "default_year")]
    pub year: i32,

    /// Field delimiter shared by the three tables.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            mortality: default_mortality(),
            causes: default_causes(),
            divisions: default_divisions(),
            year: default_year(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_mortality() -> String {
    "mortalidad.csv".to_string()
}

fn default_causes() -> String {
    "causas.csv".to_string()
}

fn default_divisions() -> String {
    "division.csv".to_string()
}

fn default_year() -> i32 {
    2019
}

fn default_delimiter() -> char {
    ','
}

impl DataConfig {
    /// Full path of the mortality table.
    pub fn mortality_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.mortality)
    }

    /// Full path of the cause table.
    pub fn causes_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.causes)
    }

    /// Full path of the division table.
    pub fn divisions_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.divisions)
    }

    /// Delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            bail!("Delimiter must be a single ASCII character, got '{}'", self.delimiter);
        }
        Ok(self.delimiter as u8)
    }
}

/// Column names for every table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default)]
    pub mortality: MortalityColumns,

    #[serde(default)]
    pub divisions: DivisionColumns,

    #[serde(default)]
    pub causes: CauseColumns,
}

/// Required columns of the mortality table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MortalityColumns {
    pub year: String,
    pub department_code: String,
    pub municipality_code: String,
    pub cause_code: String,
    pub sex: String,
    pub month: String,
    pub age_group: String,
}

impl Default for MortalityColumns {
    fn default() -> Self {
        Self {
            year: "AÑO".to_string(),
            department_code: "COD_DEPARTAMENTO".to_string(),
            municipality_code: "COD_MUNICIPIO".to_string(),
            cause_code: "COD_MUERTE".to_string(),
            sex: "SEXO".to_string(),
            month: "MES".to_string(),
            age_group: "GRUPO_EDAD1".to_string(),
        }
    }
}

/// Required columns of the division table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DivisionColumns {
    pub department_code: String,
    pub municipality_code: String,
    pub department: String,
    pub municipality: String,
}

impl Default for DivisionColumns {
    fn default() -> Self {
        Self {
            department_code: "COD_DEPARTAMENTO".to_string(),
            municipality_code: "COD_MUNICIPIO".to_string(),
            department: "DEPARTAMENTO".to_string(),
            municipality: "MUNICIPIO".to_string(),
        }
    }
}

/// Required columns of the cause table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CauseColumns {
    pub code: String,
    pub description: String,
}

impl Default for CauseColumns {
    fn default() -> Self {
        Self {
            code: "Código de la CIE-10 cuatro caracteres".to_string(),
            // The source header carries a double space.
            description: "Descripcion  de códigos mortalidad a cuatro caracteres".to_string(),
        }
    }
}

/// Panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Dashboard title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Municipalities shown in the violent-death ranking.
    #[serde(default = "default_violent_top")]
    pub violent_top: usize,

    /// Municipalities shown in the least-deaths ranking.
    #[serde(default = "default_least_deaths")]
    pub least_deaths: usize,

    /// Rows of the causes table.
    #[serde(default = "default_top_causes")]
    pub top_causes: usize,

    /// Department boundary dataset for the map panel.
    #[serde(default = "default_boundary_url")]
    pub boundary_url: String,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            violent_top: default_violent_top(),
            least_deaths: default_least_deaths(),
            top_causes: default_top_causes(),
            boundary_url: default_boundary_url(),
        }
    }
}

fn default_title() -> String {
    "Análisis de Mortalidad en Colombia".to_string()
}

fn default_violent_top() -> usize {
    5
}

fn default_least_deaths() -> usize {
    10
}

fn default_top_causes() -> usize {
    10
}

fn default_boundary_url() -> String {
    "https://gist.githubusercontent.com/john-guerra/43c7656821069d00dcbc/raw/be6a6e239cd5b5b803c6e7c2ec405b793a9064dd/Colombia.geo.json".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.data.data_dir = data_dir.display().to_string();
        }
        if let Some(ref mortality) = args.mortality {
            self.data.mortality = mortality.display().to_string();
        }
        if let Some(ref causes) = args.causes {
            self.data.causes = causes.display().to_string();
        }
        if let Some(ref divisions) = args.divisions {
            self.data.divisions = divisions.display().to_string();
        }
        if let Some(year) = args.year {
            self.data.year = year;
        }
        if let Some(delimiter) = args.delimiter {
            self.data.delimiter = delimiter;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
