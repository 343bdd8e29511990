//! CSV loading for joined race results

use polars::prelude::*;
use std::path::Path;

use crate::error::{FeatureError, Result};
use crate::models::RawRaceRecord;

/// Accepted header names per field, first match wins
const SEASON_COLUMNS: &[&str] = &["season", "year"];
const ROUND_COLUMNS: &[&str] = &["round"];
const RACE_ID_COLUMNS: &[&str] = &["raceId", "race_id"];
const DRIVER_ID_COLUMNS: &[&str] = &["driverId", "driver_id"];
const CONSTRUCTOR_ID_COLUMNS: &[&str] = &["constructorId", "constructor_id"];
const GRID_COLUMNS: &[&str] = &["grid", "starting_position"];
const POSITION_COLUMNS: &[&str] = &["positionOrder", "position_order"];
const POINTS_COLUMNS: &[&str] = &["points"];
const STATUS_COLUMNS: &[&str] = &["status", "status_text"];

/// Load race result records from a CSV file
pub fn load_records<P: AsRef<Path>>(csv_path: P) -> Result<Vec<RawRaceRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(csv_path.as_ref().to_path_buf()))?
        .finish()?;

    records_from_dataframe(&df)
}

/// Convert a joined results DataFrame into raw records.
///
/// Integer columns are cast, so "\N" style placeholders become nulls. Null
/// grid and position are kept as missing; null points count as zero; a null
/// identifier fails the whole load.
pub fn records_from_dataframe(df: &DataFrame) -> Result<Vec<RawRaceRecord>> {
    let season = column_as(df, SEASON_COLUMNS, &DataType::Int64)?;
    let round = column_as(df, ROUND_COLUMNS, &DataType::Int64)?;
    let race_id = column_as(df, RACE_ID_COLUMNS, &DataType::Int64)?;
    let driver_id = column_as(df, DRIVER_ID_COLUMNS, &DataType::Int64)?;
    let constructor_id = column_as(df, CONSTRUCTOR_ID_COLUMNS, &DataType::Int64)?;
    let grid = column_as(df, GRID_COLUMNS, &DataType::Int64)?;
    let position = column_as(df, POSITION_COLUMNS, &DataType::Int64)?;
    let points = column_as(df, POINTS_COLUMNS, &DataType::Float64)?;
    let status = column_as(df, STATUS_COLUMNS, &DataType::String)?;

    let season_col = season.i64()?;
    let round_col = round.i64()?;
    let race_col = race_id.i64()?;
    let driver_col = driver_id.i64()?;
    let constructor_col = constructor_id.i64()?;
    let grid_col = grid.i64()?;
    let position_col = position.i64()?;
    let points_col = points.f64()?;
    let status_col = status.str()?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let race = required(race_col.get(i), "raceId", i)?;
        let driver = required(driver_col.get(i), "driverId", i)?;

        records.push(RawRaceRecord {
            season: to_i32(required(season_col.get(i), "season", i)?, "season", i)?,
            round: to_u32(required(round_col.get(i), "round", i)?, "round", i)?,
            race_id: to_u32(race, "raceId", i)?,
            driver_id: to_u32(driver, "driverId", i)?,
            constructor_id: to_u32(
                required(constructor_col.get(i), "constructorId", i)?,
                "constructorId",
                i,
            )?,
            grid: grid_col.get(i),
            position_order: position_col
                .get(i)
                .map(|p| to_u32(p, "positionOrder", i))
                .transpose()?,
            points: points_col.get(i).unwrap_or(0.0),
            status: status_col.get(i).unwrap_or("").to_string(),
        });
    }

    Ok(records)
}

/// Find the first present column among `names` and cast it to `dtype`
fn column_as(df: &DataFrame, names: &[&str], dtype: &DataType) -> Result<Series> {
    let series = names
        .iter()
        .find_map(|name| df.column(name).ok())
        .ok_or_else(|| {
            FeatureError::Validation(format!("missing column, expected one of {:?}", names))
        })?;
    Ok(series.cast(dtype)?)
}

fn required<T>(value: Option<T>, field: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| {
        FeatureError::Validation(format!("row {}: missing mandatory field {}", row, field))
    })
}

fn to_u32(value: i64, field: &str, row: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        FeatureError::Validation(format!("row {}: {} out of range: {}", row, field, value))
    })
}

fn to_i32(value: i64, field: &str, row: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        FeatureError::Validation(format!("row {}: {} out of range: {}", row, field, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_frame() -> DataFrame {
        df! {
            "year" => &[2023i64, 2023, 2023],
            "round" => &[1i64, 1, 1],
            "raceId" => &[1098i64, 1098, 1098],
            "driverId" => &[830i64, 815, 1],
            "constructorId" => &[9i64, 9, 131],
            "grid" => &[Some(1i64), Some(0), Some(3)],
            "positionOrder" => &[Some(1i64), Some(2), None],
            "points" => &[Some(25.0f64), Some(18.0), None],
            "status" => &["Finished", "Finished", "Retired"],
        }
        .unwrap()
    }

    #[test]
    fn test_records_from_dataframe() {
        let records = records_from_dataframe(&results_frame()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].season, 2023);
        assert_eq!(records[0].race_id, 1098);
        assert_eq!(records[0].driver_id, 830);
        assert_eq!(records[0].grid, Some(1));
        assert_eq!(records[0].position_order, Some(1));
        assert!((records[0].points - 25.0).abs() < 1e-9);
        assert_eq!(records[0].status, "Finished");

        // Sentinel is passed through untouched; the normalizer resolves it
        assert_eq!(records[1].grid, Some(0));

        assert_eq!(records[2].position_order, None);
        assert_eq!(records[2].points, 0.0);
    }

    #[test]
    fn test_snake_case_headers() {
        let df = df! {
            "season" => &[2022i64],
            "round" => &[4i64],
            "race_id" => &[1077i64],
            "driver_id" => &[844i64],
            "constructor_id" => &[6i64],
            "grid" => &[2i64],
            "position_order" => &[1i64],
            "points" => &[26i64],
            "status" => &["Finished"],
        }
        .unwrap();
        let records = records_from_dataframe(&df).unwrap();

        assert_eq!(records[0].season, 2022);
        assert_eq!(records[0].driver_id, 844);
        // Integer points columns are accepted
        assert!((records[0].points - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_identifier_fails() {
        let df = df! {
            "year" => &[2023i64],
            "round" => &[1i64],
            "raceId" => &[1098i64],
            "driverId" => &[None::<i64>],
            "constructorId" => &[9i64],
            "grid" => &[1i64],
            "positionOrder" => &[1i64],
            "points" => &[25.0f64],
            "status" => &["Finished"],
        }
        .unwrap();
        let err = records_from_dataframe(&df).unwrap_err();
        assert!(err.to_string().contains("driverId"));
    }

    #[test]
    fn test_missing_column_fails() {
        let df = df! {
            "year" => &[2023i64],
            "round" => &[1i64],
        }
        .unwrap();
        assert!(matches!(
            records_from_dataframe(&df).unwrap_err(),
            FeatureError::Validation(_)
        ));
    }

    #[test]
    fn test_load_records_from_csv_with_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(
            &path,
            r"year,round,raceId,driverId,constructorId,grid,positionOrder,points,status
2023,1,1098,830,9,1,1,25,Finished
2023,1,1098,815,9,\N,\N,\N,Did not start
",
        )
        .unwrap();

        let records = load_records(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].grid, Some(1));
        assert_eq!(records[0].position_order, Some(1));
        assert!((records[0].points - 25.0).abs() < 1e-9);

        assert_eq!(records[1].driver_id, 815);
        assert_eq!(records[1].grid, None);
        assert_eq!(records[1].position_order, None);
        assert_eq!(records[1].points, 0.0);
        assert_eq!(records[1].status, "Did not start");
    }

    #[test]
    fn test_load_records_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_records(dir.path().join("absent.csv")).is_err());
    }
}
