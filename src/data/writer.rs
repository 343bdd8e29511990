//! Feature table export
//!
//! Missing values stay null in the frame; flags are written as 0/1.

use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::modeling::impute::{get_model_feature_names, ModelInput};
use crate::models::FeatureRow;

/// Column order of the exported feature table
pub const FEATURE_COLUMNS: [&str; 21] = [
    "season",
    "round",
    "raceId",
    "driverId",
    "constructorId",
    "grid",
    "positionOrder",
    "points",
    "status",
    "grid_clean",
    "is_podium",
    "is_finished",
    "is_dnf",
    "is_dns",
    "position_gain",
    "driver_races_past",
    "driver_avg_points_past",
    "driver_consistency_past",
    "constructor_races_past",
    "constructor_strength_past",
    "constructor_avg_finish_past",
];

fn flag(value: bool) -> i32 {
    i32::from(value)
}

/// Build a DataFrame with one row per feature row
pub fn to_dataframe(rows: &[FeatureRow]) -> Result<DataFrame> {
    let c = &FEATURE_COLUMNS;
    let df = DataFrame::new(vec![
        Series::new(c[0], rows.iter().map(|r| r.season).collect::<Vec<i32>>()),
        Series::new(c[1], rows.iter().map(|r| r.round).collect::<Vec<u32>>()),
        Series::new(c[2], rows.iter().map(|r| r.race_id).collect::<Vec<u32>>()),
        Series::new(c[3], rows.iter().map(|r| r.driver_id).collect::<Vec<u32>>()),
        Series::new(c[4], rows.iter().map(|r| r.constructor_id).collect::<Vec<u32>>()),
        Series::new(c[5], rows.iter().map(|r| r.grid).collect::<Vec<Option<i64>>>()),
        Series::new(c[6], rows.iter().map(|r| r.position_order).collect::<Vec<Option<u32>>>()),
        Series::new(c[7], rows.iter().map(|r| r.points).collect::<Vec<f64>>()),
        Series::new(c[8], rows.iter().map(|r| r.status.as_str()).collect::<Vec<&str>>()),
        Series::new(c[9], rows.iter().map(|r| r.grid_clean).collect::<Vec<Option<u32>>>()),
        Series::new(c[10], rows.iter().map(|r| flag(r.is_podium)).collect::<Vec<i32>>()),
        Series::new(c[11], rows.iter().map(|r| flag(r.is_finished)).collect::<Vec<i32>>()),
        Series::new(c[12], rows.iter().map(|r| flag(r.is_dnf)).collect::<Vec<i32>>()),
        Series::new(c[13], rows.iter().map(|r| flag(r.is_dns)).collect::<Vec<i32>>()),
        Series::new(c[14], rows.iter().map(|r| r.position_gain).collect::<Vec<Option<i64>>>()),
        Series::new(c[15], rows.iter().map(|r| r.driver_races_past).collect::<Vec<u32>>()),
        Series::new(
            c[16],
            rows.iter().map(|r| r.driver_avg_points_past).collect::<Vec<Option<f64>>>(),
        ),
        Series::new(
            c[17],
            rows.iter().map(|r| r.driver_consistency_past).collect::<Vec<Option<f64>>>(),
        ),
        Series::new(c[18], rows.iter().map(|r| r.constructor_races_past).collect::<Vec<u32>>()),
        Series::new(
            c[19],
            rows.iter().map(|r| r.constructor_strength_past).collect::<Vec<Option<f64>>>(),
        ),
        Series::new(
            c[20],
            rows.iter().map(|r| r.constructor_avg_finish_past).collect::<Vec<Option<f64>>>(),
        ),
    ])?;
    Ok(df)
}

/// Write feature rows as CSV to any writer
pub fn write_csv_to<W: Write>(rows: &[FeatureRow], writer: &mut W) -> Result<()> {
    let mut df = to_dataframe(rows)?;
    CsvWriter::new(writer).include_header(true).finish(&mut df)?;
    Ok(())
}

/// Write feature rows to a CSV file
pub fn write_csv<P: AsRef<Path>>(rows: &[FeatureRow], path: P) -> Result<()> {
    let mut file = File::create(path)?;
    write_csv_to(rows, &mut file)
}

/// Build a dense model-input frame: identity, features, grid and target
pub fn model_inputs_to_dataframe(inputs: &[&ModelInput]) -> Result<DataFrame> {
    let mut columns = vec![
        Series::new("season", inputs.iter().map(|m| m.season).collect::<Vec<i32>>()),
        Series::new("raceId", inputs.iter().map(|m| m.race_id).collect::<Vec<u32>>()),
        Series::new("driverId", inputs.iter().map(|m| m.driver_id).collect::<Vec<u32>>()),
        Series::new(
            "constructorId",
            inputs.iter().map(|m| m.constructor_id).collect::<Vec<u32>>(),
        ),
        Series::new("grid_clean", inputs.iter().map(|m| m.grid_clean).collect::<Vec<Option<u32>>>()),
    ];
    let vectors: Vec<Vec<f64>> = inputs.iter().map(|m| m.to_vec()).collect();
    for (i, name) in get_model_feature_names().into_iter().enumerate() {
        columns.push(Series::new(
            name,
            vectors.iter().map(|v| v[i]).collect::<Vec<f64>>(),
        ));
    }
    columns.push(Series::new("points", inputs.iter().map(|m| m.points).collect::<Vec<f64>>()));

    Ok(DataFrame::new(columns)?)
}

/// Write model inputs to a CSV file
pub fn write_model_csv<P: AsRef<Path>>(inputs: &[&ModelInput], path: P) -> Result<()> {
    let mut df = model_inputs_to_dataframe(inputs)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(())
}
