//! Writing run results to disk.
//!
//! A run directory holds `results.json`, the serialized [`RunResult`], and
//! for monitored runs `timeseries.csv`, the time series in long format with
//! one `t,compartment,count` row per compartment per sample.
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::Writer;
use log::info;
use serde_derive::{Deserialize, Serialize};

use crate::error::EpiError;
use crate::results::{RunResult, Sample};

pub const RESULTS_FILE: &str = "results.json";
pub const TIMESERIES_FILE: &str = "timeseries.csv";

/// One row of the long-format time series.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct TimeseriesRecord {
    pub t: f64,
    pub compartment: String,
    pub count: usize,
}

// Checks that the path has the expected extension. Creates the file and all
// parent directories if they do not exist.
fn generate_validate_filepath(path: &Path, extension: &str) -> Result<File, EpiError> {
    if path.extension().and_then(OsStr::to_str) != Some(extension) {
        return Err(EpiError::ReportError(format!(
            "Expected a .{extension} file, got {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Writes `samples` as a long-format CSV file.
///
/// # Errors
///
/// `EpiError::ReportError` if the path is not a `.csv` file, otherwise I/O or
/// CSV errors.
pub fn write_timeseries_csv(path: &Path, samples: &[Sample]) -> Result<(), EpiError> {
    let file = generate_validate_filepath(path, "csv")?;
    let mut writer = Writer::from_writer(file);
    for sample in samples {
        for (compartment, count) in &sample.counts {
            writer.serialize(TimeseriesRecord {
                t: sample.t,
                compartment: compartment.clone(),
                count: *count,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes `result` as pretty-printed JSON.
///
/// # Errors
///
/// `EpiError::ReportError` if the path is not a `.json` file, otherwise I/O or
/// JSON errors.
pub fn write_results_json(path: &Path, result: &RunResult) -> Result<(), EpiError> {
    let mut file = generate_validate_filepath(path, "json")?;
    file.write_all(result.to_json_string()?.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Writes every output of `result` into `directory`, returning the paths written.
///
/// # Errors
///
/// Any error from [`write_results_json`] or [`write_timeseries_csv`].
pub fn write_run_outputs(directory: &Path, result: &RunResult) -> Result<Vec<PathBuf>, EpiError> {
    let mut written = Vec::new();

    let results_path = directory.join(RESULTS_FILE);
    write_results_json(&results_path, result)?;
    written.push(results_path);

    if let Some(timeseries) = &result.timeseries {
        let timeseries_path = directory.join(TIMESERIES_FILE);
        write_timeseries_csv(&timeseries_path, timeseries)?;
        written.push(timeseries_path);
    }

    for path in &written {
        info!("wrote {}", path.display());
    }
    Ok(written)
}
