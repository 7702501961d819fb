//! NPR tariff CSV loader.

use std::path::Path;

use csv::StringRecord;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::{CalcDate, TariffRow, TariffTable};
use crate::shared::errors::DataLoadError;

const AREA_MANAGER_ID: &str = "AreaManagerId";
const FARE_CALCULATION_CODE: &str = "FareCalculationCode";
const START_DATE: &str = "StartDateFarePart";
const END_DATE: &str = "EndDateFarePart";
const START_DURATION: &str = "StartDurationFarePart";
const END_DURATION: &str = "EndDurationFarePart";
const AMOUNT: &str = "AmountFarePart";
const STEP_SIZE: &str = "StepSizeFarePart";
const AMOUNT_CUMULATIVE: &str = "AmountCumulative";

/// Cell values the dataset uses for a missing fare code.
const MISSING_MARKERS: &[&str] = &["", "nan", "NaN"];

/// Positions of the required columns in the header row.
struct Columns {
    area_id: usize,
    fare_code: usize,
    start_date: usize,
    end_date: usize,
    start_duration: usize,
    end_duration: usize,
    amount: usize,
    step_size: usize,
    cumulative: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, DataLoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(DataLoadError::MissingColumn(name))
        };
        Ok(Self {
            area_id: find(AREA_MANAGER_ID)?,
            fare_code: find(FARE_CALCULATION_CODE)?,
            start_date: find(START_DATE)?,
            end_date: find(END_DATE)?,
            start_duration: find(START_DURATION)?,
            end_duration: find(END_DURATION)?,
            amount: find(AMOUNT)?,
            step_size: find(STEP_SIZE)?,
            cumulative: find(AMOUNT_CUMULATIVE)?,
        })
    }
}

/// Loads the tariff table from `path`.
///
/// Fails on a missing file, an unreadable CSV or an absent column. Rows whose
/// numeric cells cannot be read are skipped and counted.
pub fn load_from<P: AsRef<Path>>(path: P) -> Result<TariffTable, DataLoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataLoadError::FileNotFound(path.display().to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let columns = Columns::locate(reader.headers()?)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        match parse_row(&record, &columns) {
            Some(row) => rows.push(row),
            None => {
                skipped += 1;
                debug!(line = idx + 2, "Skipping unreadable tariff row");
            }
        }
    }

    info!(
        path = %path.display(),
        rows = rows.len(),
        skipped,
        "Tariff dataset loaded"
    );
    Ok(TariffTable::from_rows(rows))
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Option<TariffRow> {
    let cell = |idx: usize| record.get(idx).unwrap_or("");

    let step_size_minutes = parse_int(cell(columns.step_size))?;
    if step_size_minutes <= 0 {
        return None;
    }

    Some(TariffRow {
        area_id: parse_int(cell(columns.area_id))?,
        fare_code: parse_fare_code(cell(columns.fare_code)),
        valid_from: parse_date(cell(columns.start_date))?,
        // open-ended validity is written as an empty cell
        valid_to: match cell(columns.end_date) {
            "" => CalcDate(99_991_231),
            raw => parse_date(raw)?,
        },
        bracket_start_minute: parse_int(cell(columns.start_duration))?,
        bracket_end_minute: parse_int(cell(columns.end_duration))?,
        amount_per_step: parse_decimal(cell(columns.amount))?,
        step_size_minutes,
        cumulative_amount: match cell(columns.cumulative) {
            "" => Decimal::ZERO,
            raw => parse_decimal(raw)?,
        },
    })
}

/// Integers may be written with a trailing `.0`.
fn parse_int(raw: &str) -> Option<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = parse_decimal(raw)?;
    if !value.fract().is_zero() {
        return None;
    }
    value.to_i64()
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if MISSING_MARKERS.contains(&raw) {
        return None;
    }
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_date(raw: &str) -> Option<CalcDate> {
    let value = parse_int(raw)?;
    u32::try_from(value).ok().map(CalcDate)
}

fn parse_fare_code(raw: &str) -> Option<String> {
    if MISSING_MARKERS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::domain::ZoneKey;

    const HEADER: &str = "AreaManagerId,FareCalculationCode,StartDateFarePart,EndDateFarePart,\
StartDurationFarePart,EndDurationFarePart,AmountFarePart,StepSizeFarePart,AmountCumulative";

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn missing_file_is_reported() {
        let result = load_from("does/not/exist.csv");
        assert!(matches!(result, Err(DataLoadError::FileNotFound(_))));
    }

    #[test]
    fn loads_rows_and_coerces_numbers() {
        let file = csv_file(&[
            HEADER,
            "14,TAR01,20240101,20241231,0,60,1.00,15,0",
            "14.0,TAR01,20240101.0,20241231,60.0,999999,0.75,15.0,0.25",
        ]);
        let table = load_from(file.path()).unwrap();
        assert_eq!(table.len(), 2);

        let rows = table.rows_for(&ZoneKey::new(14, "TAR01"));
        assert_eq!(rows.len(), 2);
        let second = rows[1];
        assert_eq!(second.valid_from, CalcDate(20240101));
        assert_eq!(second.bracket_start_minute, 60);
        assert_eq!(second.step_size_minutes, 15);
        assert_eq!(second.cumulative_amount, "0.25".parse::<Decimal>().unwrap());
        assert!(second.is_unbounded());
    }

    #[test]
    fn missing_fare_codes_are_kept_without_key() {
        let file = csv_file(&[
            HEADER,
            "14,,20240101,20241231,0,60,1.00,15,0",
            "14,nan,20240101,20241231,0,60,1.00,15,0",
            "14,NaN,20240101,20241231,0,60,1.00,15,0",
        ]);
        let table = load_from(file.path()).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.rows().iter().all(|row| row.zone_key().is_none()));
    }

    #[test]
    fn unreadable_rows_are_skipped() {
        let file = csv_file(&[
            HEADER,
            "abc,TAR01,20240101,20241231,0,60,1.00,15,0",
            "14,TAR01,20240101,20241231,0,60,oops,15,0",
            "14,TAR01,20240101,20241231,0,60,1.00,0,0",
            "14,TAR01,20240101,20241231,0,60,1.00,15,0",
        ]);
        let table = load_from(file.path()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn extra_columns_and_order_are_ignored() {
        let file = csv_file(&[
            "AmountCumulative,Extra,StepSizeFarePart,AmountFarePart,EndDurationFarePart,\
StartDurationFarePart,EndDateFarePart,StartDateFarePart,FareCalculationCode,AreaManagerId",
            "0.10,x,30,2.00,120,0,,20240101,GAR01,17",
        ]);
        let table = load_from(file.path()).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.zone_key(), Some(ZoneKey::new(17, "GAR01")));
        assert_eq!(row.step_size_minutes, 30);
        assert_eq!(row.valid_to, CalcDate(99_991_231));
    }

    #[test]
    fn missing_column_fails_the_load() {
        let file = csv_file(&[
            "AreaManagerId,FareCalculationCode,StartDateFarePart",
            "14,TAR01,20240101",
        ]);
        let result = load_from(file.path());
        assert!(matches!(
            result,
            Err(DataLoadError::MissingColumn("EndDateFarePart"))
        ));
    }
}
