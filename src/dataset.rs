use crate::error::{DashboardError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Geographic bucket a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    /// Backfill order; `row_index % 5` indexes into this
    pub const ALL: [Region; 5] = [
        Region::North,
        Region::South,
        Region::East,
        Region::West,
        Region::Central,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
            Region::Central => "Central",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn backfill(row_index: usize) -> Self {
        Self::ALL[row_index % Self::ALL.len()]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extreme-weather label attached to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Anomaly {
    Heatwave,
    Flood,
    Drought,
    Cyclone,
    Normal,
}

impl Anomaly {
    /// Backfill order; `row_index % 5` indexes into this
    pub const ALL: [Anomaly; 5] = [
        Anomaly::Heatwave,
        Anomaly::Flood,
        Anomaly::Drought,
        Anomaly::Cyclone,
        Anomaly::Normal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Anomaly::Heatwave => "Heatwave",
            Anomaly::Flood => "Flood",
            Anomaly::Drought => "Drought",
            Anomaly::Cyclone => "Cyclone",
            Anomaly::Normal => "Normal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn backfill(row_index: usize) -> Self {
        Self::ALL[row_index % Self::ALL.len()]
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of yearly climate measurements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateRecord {
    pub year: i32,
    pub co2_ppm: f64,
    pub temperature_c: f64,
    pub rainfall_mm: f64,
    pub region: Region,
    pub anomaly: Anomaly,
}

/// Records in file order
///
/// The loader never re-sorts, so "last record" means last row of the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<ClimateRecord>,
}

impl Dataset {
    pub fn new(records: Vec<ClimateRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ClimateRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClimateRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Last row of the file
    pub fn latest(&self) -> Option<&ClimateRecord> {
        self.records.last()
    }

    /// Distinct years in order of first appearance
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = Vec::new();
        for record in &self.records {
            if !years.contains(&record.year) {
                years.push(record.year);
            }
        }
        years
    }

    /// Distinct regions in order of first appearance
    pub fn regions(&self) -> Vec<Region> {
        let mut regions: Vec<Region> = Vec::new();
        for record in &self.records {
            if !regions.contains(&record.region) {
                regions.push(record.region);
            }
        }
        regions
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a ClimateRecord;
    type IntoIter = std::slice::Iter<'a, ClimateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

const YEAR_COLUMN: &str = "Year";
const CO2_COLUMN: &str = "CO2(ppm)";
const TEMPERATURE_COLUMNS: [&str; 3] = ["Temperature(°C)", "Temperature(C)", "Temperature"];
const RAINFALL_COLUMN: &str = "Rainfall(mm)";
const REGION_COLUMN: &str = "Region";
const ANOMALY_COLUMN: &str = "Anomaly";

/// Column positions resolved from the header row
struct Columns {
    year: usize,
    co2: usize,
    temperature: usize,
    rainfall: usize,
    region: Option<usize>,
    anomaly: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> std::result::Result<Self, String> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| find(name).ok_or_else(|| format!("missing column '{}'", name));

        let temperature = TEMPERATURE_COLUMNS
            .iter()
            .find_map(|name| find(*name))
            .ok_or_else(|| format!("missing column '{}'", TEMPERATURE_COLUMNS[0]))?;

        Ok(Columns {
            year: require(YEAR_COLUMN)?,
            co2: require(CO2_COLUMN)?,
            temperature,
            rainfall: require(RAINFALL_COLUMN)?,
            region: find(REGION_COLUMN),
            anomaly: find(ANOMALY_COLUMN),
        })
    }
}

/// Load the climate dataset from a CSV file
///
/// Missing `Region` and `Anomaly` columns are backfilled from the row
/// position, so loading the same file twice always yields the same records.
///
/// # Arguments
/// * `path` - Path to the CSV file
///
/// # Returns
/// * `Result<Dataset>` - The records in file order, or a `DashboardError::Load`
///
/// # Examples
/// ```no_run
/// use climate_insights::dataset::load_dataset;
///
/// match load_dataset("data/climate_data_2000_2024.csv") {
///     Ok(dataset) => println!("Loaded {} records", dataset.len()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DashboardError::load(path, e))?;
    from_reader(file).map_err(|reason| DashboardError::load(path, reason))
}

/// Parse a dataset from any CSV source
pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Dataset, String> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = row.map_err(|e| format!("line {}: {}", line, e))?;
        let record = parse_row(&row, &columns, index).map_err(|e| format!("line {}: {}", line, e))?;
        records.push(record);
    }

    Ok(Dataset::new(records))
}

fn parse_row(row: &StringRecord, columns: &Columns, index: usize) -> std::result::Result<ClimateRecord, String> {
    let field = |pos: usize, name: &str| row.get(pos).ok_or_else(|| format!("missing value for '{}'", name));

    let number = |pos: usize, name: &str| -> std::result::Result<f64, String> {
        let raw = field(pos, name)?;
        raw.parse::<f64>()
            .map_err(|_| format!("'{}' is not a number in column '{}'", raw, name))
    };

    let year = coerce_year(field(columns.year, YEAR_COLUMN)?)?;

    let region = match columns.region {
        Some(pos) => {
            let raw = field(pos, REGION_COLUMN)?;
            Region::from_name(raw).ok_or_else(|| format!("unknown region '{}'", raw))?
        }
        None => Region::backfill(index),
    };

    let anomaly = match columns.anomaly {
        Some(pos) => {
            let raw = field(pos, ANOMALY_COLUMN)?;
            Anomaly::from_name(raw).ok_or_else(|| format!("unknown anomaly '{}'", raw))?
        }
        None => Anomaly::backfill(index),
    };

    Ok(ClimateRecord {
        year,
        co2_ppm: number(columns.co2, CO2_COLUMN)?,
        temperature_c: number(columns.temperature, "Temperature")?,
        rainfall_mm: number(columns.rainfall, RAINFALL_COLUMN)?,
        region,
        anomaly,
    })
}

/// Accepts `2000` as well as `2000.0`
fn coerce_year(raw: &str) -> std::result::Result<i32, String> {
    if let Ok(year) = raw.parse::<i32>() {
        return Ok(year);
    }
    match raw.parse::<f64>() {
        Ok(value)
            if value.fract() == 0.0
                && value >= i32::MIN as f64
                && value <= i32::MAX as f64 =>
        {
            Ok(value as i32)
        }
        _ => Err(format!("'{}' is not a valid year", raw)),
    }
}
