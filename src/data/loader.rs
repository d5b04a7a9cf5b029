//! Typed loading of the three input tables.
//!
//! Column names are resolved against the header row once; every data
//! row is then converted into its typed record. A missing column or an
//! unparsable cell stops the load. Mortality rows of other years are
//! skipped before their cells are parsed.

use super::error::{DataError, Result, Table};
use crate::config::{CauseColumns, DivisionColumns, MortalityColumns};
use crate::models::{CauseEntry, DeathRow, DivisionEntry, MortalityRows};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

fn open(path: &Path, table: Table) -> Result<File> {
    File::open(path).map_err(|source| DataError::Io {
        table,
        path: path.to_path_buf(),
        source,
    })
}

fn reader<R: Read>(source: R, delimiter: u8) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(source)
}

/// Header row with column lookup by name.
struct Header {
    table: Table,
    names: Vec<String>,
}

impl Header {
    fn read<R: Read>(rdr: &mut csv::Reader<R>, table: Table) -> Result<Self> {
        let headers = rdr
            .headers()
            .map_err(|source| DataError::Csv { table, source })?;
        let names = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        Ok(Self { table, names })
    }

    fn index(&self, column: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|name| name == column.trim())
            .ok_or_else(|| DataError::MissingColumn {
                table: self.table,
                column: column.to_string(),
            })
    }
}

/// One data row plus what is needed to report a bad cell.
struct Row<'a> {
    table: Table,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn line(&self) -> u64 {
        self.record.position().map(|p| p.line()).unwrap_or(0)
    }

    fn text(&self, index: usize) -> String {
        self.record.get(index).unwrap_or("").trim().to_string()
    }

    fn invalid(&self, column: &str, value: &str) -> DataError {
        DataError::InvalidValue {
            table: self.table,
            line: self.line(),
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    fn code(&self, index: usize, column: &str) -> Result<u32> {
        let raw = self.record.get(index).unwrap_or("");
        parse_code(raw).ok_or_else(|| self.invalid(column, raw))
    }

    fn year(&self, index: usize, column: &str) -> Result<i32> {
        let raw = self.record.get(index).unwrap_or("");
        parse_code(raw)
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(|| self.invalid(column, raw))
    }

    fn month(&self, index: usize, column: &str) -> Result<u8> {
        let raw = self.record.get(index).unwrap_or("");
        parse_code(raw)
            .filter(|m| (1..=12).contains(m))
            .map(|m| m as u8)
            .ok_or_else(|| self.invalid(column, raw))
    }
}

/// Parse a numeric code cell.
///
/// Spreadsheet exports write integer columns as `5`, `05` or `5.0`;
/// all three parse to the same value.
pub fn parse_code(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits = match trimmed.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        Some(_) => return None,
        None => trimmed,
    };
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Read the mortality rows of one reporting year.
///
/// Only the year cell of other rows is looked at, so a malformed row of
/// another year never stops the load. A year cell that is not a number
/// cannot match and the row is skipped.
pub fn read_deaths<R: Read>(
    source: R,
    columns: &MortalityColumns,
    delimiter: u8,
    target_year: i32,
) -> Result<MortalityRows> {
    let table = Table::Mortality;
    let mut rdr = reader(source, delimiter);
    let header = Header::read(&mut rdr, table)?;

    let year = header.index(&columns.year)?;
    let department = header.index(&columns.department_code)?;
    let municipality = header.index(&columns.municipality_code)?;
    let cause = header.index(&columns.cause_code)?;
    let sex = header.index(&columns.sex)?;
    let month = header.index(&columns.month)?;
    let age_group = header.index(&columns.age_group)?;

    let mut rows = Vec::new();
    let mut source_rows = 0usize;
    let mut unreadable_years = 0usize;
    for result in rdr.records() {
        let record = result.map_err(|source| DataError::Csv { table, source })?;
        source_rows += 1;
        let row = Row {
            table,
            record: &record,
        };

        match row.year(year, &columns.year) {
            Ok(y) if y == target_year => {}
            Ok(_) => continue,
            Err(_) => {
                unreadable_years += 1;
                continue;
            }
        }

        rows.push(DeathRow {
            year: target_year,
            department_code: row.code(department, &columns.department_code)?,
            municipality_code: row.code(municipality, &columns.municipality_code)?,
            cause_code: row.text(cause),
            sex: row.text(sex),
            age_group: row.text(age_group),
            month: row.month(month, &columns.month)?,
        });
    }

    if unreadable_years > 0 {
        warn!(
            "Skipped {} mortality rows with an unreadable {} value",
            unreadable_years, columns.year
        );
    }
    debug!(
        "Read {} mortality rows, {} for {}",
        source_rows,
        rows.len(),
        target_year
    );
    Ok(MortalityRows { rows, source_rows })
}

/// Read every row of the division table.
pub fn read_divisions<R: Read>(
    source: R,
    columns: &DivisionColumns,
    delimiter: u8,
) -> Result<Vec<DivisionEntry>> {
    let table = Table::Divisions;
    let mut rdr = reader(source, delimiter);
    let header = Header::read(&mut rdr, table)?;

    let department_code = header.index(&columns.department_code)?;
    let municipality_code = header.index(&columns.municipality_code)?;
    let department = header.index(&columns.department)?;
    let municipality = header.index(&columns.municipality)?;

    let mut entries = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|source| DataError::Csv { table, source })?;
        let row = Row {
            table,
            record: &record,
        };

        entries.push(DivisionEntry {
            department_code: row.code(department_code, &columns.department_code)?,
            municipality_code: row.code(municipality_code, &columns.municipality_code)?,
            department: row.text(department),
            municipality: row.text(municipality),
        });
    }

    debug!("Read {} division entries", entries.len());
    Ok(entries)
}

/// Read every row of the cause table.
pub fn read_causes<R: Read>(
    source: R,
    columns: &CauseColumns,
    delimiter: u8,
) -> Result<Vec<CauseEntry>> {
    let table = Table::Causes;
    let mut rdr = reader(source, delimiter);
    let header = Header::read(&mut rdr, table)?;

    let code = header.index(&columns.code)?;
    let description = header.index(&columns.description)?;

    let mut entries = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|source| DataError::Csv { table, source })?;
        let row = Row {
            table,
            record: &record,
        };

        entries.push(CauseEntry {
            code: row.text(code),
            description: row.text(description),
        });
    }

    debug!("Read {} cause entries", entries.len());
    Ok(entries)
}

/// Load the mortality rows of one year from disk.
pub fn load_deaths(
    path: &Path,
    columns: &MortalityColumns,
    delimiter: u8,
    year: i32,
) -> Result<MortalityRows> {
    let file = open(path, Table::Mortality)?;
    read_deaths(file, columns, delimiter, year)
}

/// Load the division table from disk.
pub fn load_divisions(
    path: &Path,
    columns: &DivisionColumns,
    delimiter: u8,
) -> Result<Vec<DivisionEntry>> {
    let file = open(path, Table::Divisions)?;
    read_divisions(file, columns, delimiter)
}

/// Load the cause table from disk.
pub fn load_causes(path: &Path, columns: &CauseColumns, delimiter: u8) -> Result<Vec<CauseEntry>> {
    let file = open(path, Table::Causes)?;
    read_causes(file, columns, delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DEATHS: &str = "\
AÑO,COD_DEPARTAMENTO,COD_MUNICIPIO,COD_MUERTE,SEXO,MES,GRUPO_EDAD1
2019,5,1,X954,1,3,12
2019.0,05,001,I219,2,12,20
2018,11,1,J189,1,7,25
";

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("5"), Some(5));
        assert_eq!(parse_code(" 05 "), Some(5));
        assert_eq!(parse_code("5.0"), Some(5));
        assert_eq!(parse_code("5.00"), Some(5));
        assert_eq!(parse_code("5.5"), None);
        assert_eq!(parse_code("5."), None);
        assert_eq!(parse_code(""), None);
        assert_eq!(parse_code("abc"), None);
        assert_eq!(parse_code("-1"), None);
    }

    #[test]
    fn test_read_deaths() {
        let deaths =
            read_deaths(DEATHS.as_bytes(), &MortalityColumns::default(), b',', 2019).unwrap();
        let rows = &deaths.rows;

        assert_eq!(deaths.source_rows, 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2019);
        assert_eq!(rows[0].cause_code, "X954");
        assert_eq!(rows[1].year, 2019);
        assert_eq!(rows[1].department_code, 5);
        assert_eq!(rows[1].municipality_code, 1);
        assert_eq!(rows[1].month, 12);

        let other = read_deaths(DEATHS.as_bytes(), &MortalityColumns::default(), b',', 2018).unwrap();
        assert_eq!(other.rows.len(), 1);
        assert_eq!(other.rows[0].age_group, "25");
    }

    #[test]
    fn test_bad_cells_in_other_years_are_skipped() {
        let data = "\
AÑO,COD_DEPARTAMENTO,COD_MUNICIPIO,COD_MUERTE,SEXO,MES,GRUPO_EDAD1
2019,5,1,X954,1,3,12
2018,5,1,X954,1,,12
2017,x,1,X954,1,13,12
n/a,5,1,X954,1,3,12
";
        let deaths = read_deaths(data.as_bytes(), &MortalityColumns::default(), b',', 2019).unwrap();

        assert_eq!(deaths.source_rows, 4);
        assert_eq!(deaths.rows.len(), 1);
        assert_eq!(deaths.rows[0].month, 3);
    }

    #[test]
    fn test_read_deaths_columns_in_any_order() {
        let data = "\
MES,SEXO,GRUPO_EDAD1,COD_MUERTE,COD_MUNICIPIO,COD_DEPARTAMENTO,AÑO,EXTRA
4,2,18,C509,1,11,2019,x
";
        let rows = read_deaths(data.as_bytes(), &MortalityColumns::default(), b',', 2019)
            .unwrap()
            .rows;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].department_code, 11);
        assert_eq!(rows[0].month, 4);
        assert_eq!(rows[0].sex, "2");
    }

    #[test]
    fn test_read_deaths_missing_column() {
        let data = "AÑO,COD_DEPARTAMENTO,COD_MUNICIPIO,COD_MUERTE,SEXO,GRUPO_EDAD1\n";
        let err =
            read_deaths(data.as_bytes(), &MortalityColumns::default(), b',', 2019).unwrap_err();

        match err {
            DataError::MissingColumn { table, column } => {
                assert_eq!(table, Table::Mortality);
                assert_eq!(column, "MES");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_deaths_invalid_month() {
        let data = "\
AÑO,COD_DEPARTAMENTO,COD_MUNICIPIO,COD_MUERTE,SEXO,MES,GRUPO_EDAD1
2019,5,1,X954,1,13,12
";
        let err =
            read_deaths(data.as_bytes(), &MortalityColumns::default(), b',', 2019).unwrap_err();

        match err {
            DataError::InvalidValue { line, column, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "MES");
                assert_eq!(value, "13");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_divisions_with_semicolons() {
        let data = "\
COD_DANE;COD_DEPARTAMENTO;COD_MUNICIPIO;DEPARTAMENTO;MUNICIPIO
5001;5;1;ANTIOQUIA;MEDELLÍN
11001;11;1;BOGOTÁ, D.C.;BOGOTÁ, D.C.
";
        let entries = read_divisions(data.as_bytes(), &DivisionColumns::default(), b';').unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].municipality, "MEDELLÍN");
        assert_eq!(entries[1].department_code, 11);
        assert_eq!(entries[1].department, "BOGOTÁ, D.C.");
    }

    #[test]
    fn test_read_causes() {
        let data = "\
Capítulo,Código de la CIE-10 cuatro caracteres,Descripcion  de códigos mortalidad a cuatro caracteres
XX, X954 ,\"Agresión con disparo de otras armas de fuego, en calle\"
";
        let entries = read_causes(data.as_bytes(), &CauseColumns::default(), b',').unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].code, "X954");
        assert!(entries[0].description.starts_with("Agresión con disparo"));
    }

    #[test]
    fn test_header_with_byte_order_mark() {
        let data = "\u{feff}Código de la CIE-10 cuatro caracteres,Descripcion  de códigos mortalidad a cuatro caracteres\nA000,Cólera\n";
        let entries = read_causes(data.as_bytes(), &CauseColumns::default(), b',').unwrap();
        assert_eq!(entries[0].description, "Cólera");
    }

    #[test]
    fn test_load_deaths_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEATHS.as_bytes()).unwrap();

        let deaths = load_deaths(file.path(), &MortalityColumns::default(), b',', 2019).unwrap();
        assert_eq!(deaths.source_rows, 3);
        assert_eq!(deaths.rows.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_causes(
            Path::new("/definitely/not/here.csv"),
            &CauseColumns::default(),
            b',',
        )
        .unwrap_err();

        assert!(matches!(err, DataError::Io { table: Table::Causes, .. }));
    }
}
