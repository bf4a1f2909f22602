//! Input/output glue around the stereo model: parsing coordinate rows,
//! evaluating batches of rows and rendering or exporting the results.
//!
//! Each row is independent. A failing row yields an error for that row only
//! and never stops the rest of the batch.

use crate::stereo::{DoubleCameraModel, ObjectPosition, StereoError};
use log::{debug, warn};
use nalgebra::Point2;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Malformed input at the I/O boundary.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UtilError {
    #[error("Entered coordinates must be integer.")]
    NotAnInteger(String),
    #[error("Entered coordinates must be integer.")]
    EmptyRow,
    #[error("Expected 4 coordinates (xl yl xr yr), got {0}")]
    WrongCoordinateCount(usize),
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("CSV Error: {0}")]
    CsvError(String),
}

impl From<std::io::Error> for UtilError {
    fn from(err: std::io::Error) -> Self {
        UtilError::IOError(err.to_string())
    }
}

impl From<csv::Error> for UtilError {
    fn from(err: csv::Error) -> Self {
        UtilError::CsvError(err.to_string())
    }
}

/// Why a single row produced no result.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error(transparent)]
    Format(#[from] UtilError),
    #[error(transparent)]
    Stereo(#[from] StereoError),
}

/// Left and right pixel coordinates of one object, Default CS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatePair {
    pub left: Point2<f64>,
    pub right: Point2<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangulation {
    pub position: ObjectPosition,
    pub depth_error: Option<f64>,
}

/// Outcome of one input line. `line` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct RowResult {
    pub line: usize,
    pub outcome: Result<Triangulation, RowError>,
}

/// Parses `xl yl xr yr`, whitespace separated integers.
pub fn parse_coordinate_row(row: &str) -> Result<CoordinatePair, UtilError> {
    let values = row
        .split_whitespace()
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| UtilError::NotAnInteger(token.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.is_empty() {
        return Err(UtilError::EmptyRow);
    }
    if values.len() != 4 {
        return Err(UtilError::WrongCoordinateCount(values.len()));
    }

    Ok(CoordinatePair {
        left: Point2::new(values[0] as f64, values[1] as f64),
        right: Point2::new(values[2] as f64, values[3] as f64),
    })
}

/// Parses and triangulates a single row.
pub fn process_row(
    rig: &DoubleCameraModel,
    row: &str,
    with_error: bool,
) -> Result<Triangulation, RowError> {
    let pair = parse_coordinate_row(row)?;
    let triangulation = if with_error {
        let (position, err) = rig.obj_coords_with_err(&pair.left, &pair.right)?;
        Triangulation {
            position,
            depth_error: Some(err),
        }
    } else {
        Triangulation {
            position: rig.obj_coords(&pair.left, &pair.right)?,
            depth_error: None,
        }
    };
    debug!("{row:?} -> {triangulation:?}");
    Ok(triangulation)
}

/// Evaluates one row typed by the user. Unlike [`process_rows`] a blank row
/// is not skipped; it yields [`UtilError::EmptyRow`].
pub fn process_single_row(rig: &DoubleCameraModel, row: &str, with_error: bool) -> RowResult {
    RowResult {
        line: 1,
        outcome: process_row(rig, row, with_error),
    }
}

/// Evaluates every non-blank line of `contents`, keeping input order.
///
/// With the `rayon` feature the rows are evaluated in parallel.
pub fn process_rows(rig: &DoubleCameraModel, contents: &str, with_error: bool) -> Vec<RowResult> {
    let rows: Vec<(usize, &str)> = contents
        .lines()
        .enumerate()
        .filter(|(_, row)| !row.trim().is_empty())
        .map(|(idx, row)| (idx + 1, row))
        .collect();

    #[cfg(not(feature = "rayon"))]
    let iter = rows.iter();
    #[cfg(feature = "rayon")]
    let iter = rows.par_iter();

    let results: Vec<RowResult> = iter
        .map(|&(line, row)| RowResult {
            line,
            outcome: process_row(rig, row, with_error),
        })
        .collect();

    for result in &results {
        if let Err(e) = &result.outcome {
            warn!("Line {}: {}", result.line, e);
        }
    }

    results
}

/// Reads a coordinate file and evaluates it with [`process_rows`].
pub fn process_file<P: AsRef<Path>>(
    rig: &DoubleCameraModel,
    path: P,
    with_error: bool,
) -> Result<Vec<RowResult>, UtilError> {
    let contents = fs::read_to_string(path)?;
    Ok(process_rows(rig, &contents, with_error))
}

/// Renders a result the way the command line prints it: `x0 y0 depth [error]`.
pub fn format_triangulation(triangulation: &Triangulation) -> String {
    let ObjectPosition { x0, y0, depth } = triangulation.position;
    match triangulation.depth_error {
        Some(err) => format!("{x0} {y0} {depth} {err}"),
        None => format!("{x0} {y0} {depth}"),
    }
}

/// One line per row: the result or the error message.
pub fn format_row(result: &RowResult) -> String {
    match &result.outcome {
        Ok(triangulation) => format_triangulation(triangulation),
        Err(e) => e.to_string(),
    }
}

#[derive(Serialize)]
struct CsvRecord {
    line: usize,
    x0: i64,
    y0: i64,
    depth: f64,
    depth_error: Option<f64>,
}

/// Writes every successful row to a CSV file with a header.
/// Returns the number of rows written.
pub fn export_results_csv<P: AsRef<Path>>(
    results: &[RowResult],
    path: P,
) -> Result<usize, UtilError> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut written = 0;

    for result in results {
        if let Ok(t) = &result.outcome {
            writer.serialize(CsvRecord {
                line: result.line,
                x0: t.position.x0,
                y0: t.position.y0,
                depth: t.position.depth,
                depth_error: t.depth_error,
            })?;
            written += 1;
        }
    }

    writer.flush()?;
    Ok(written)
}
