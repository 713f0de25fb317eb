//! Parsing of hand-typed tables.
//!
//! Cells are free text as typed in a table widget. A decimal comma is
//! accepted and normalized to a dot. Rows with an empty cell are incomplete
//! and skipped. Anything else must parse and validate, or the error names the
//! table and the one-based row.

use thiserror::Error;

use super::{error::ParameterError, rotor::PhysicalPoint, system_curve::SystemPoint};

/// A cell or row in a typed table is invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// A cell does not hold a number.
    #[error("{table}, row {row}: `{cell}` is not a number")]
    NotANumber {
        table: String,
        row: usize,
        cell: String,
    },

    /// A row parsed but its values are not physical.
    #[error("{table}, row {row}: {source}")]
    Invalid {
        table: String,
        row: usize,
        #[source]
        source: ParameterError,
    },
}

/// Parses a number, accepting a decimal comma.
///
/// Returns `None` for an empty cell.
#[must_use]
pub fn parse_cell(cell: &str) -> Option<Result<f64, std::num::ParseFloatError>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    Some(cell.replace(',', ".").parse())
}

/// Parses `(flow, head, efficiency)` rows typed for the named rotor.
///
/// # Errors
///
/// Returns an [`InputError`] naming the rotor and row for a non-numeric cell
/// or an efficiency outside `0..=100`.
///
/// # Examples
///
/// ```
/// use pump_curves::models::pump::parse_rotor_rows;
///
/// let rows = [["0", "32,5", "0"], ["10", "30", ""], ["20,0", "26", "71,5"]];
/// let points = parse_rotor_rows("A", &rows).unwrap();
///
/// assert_eq!(points.len(), 2);
/// assert_eq!(points[1].head(), 26.0);
/// assert_eq!(points[1].efficiency(), 71.5);
/// ```
pub fn parse_rotor_rows<S: AsRef<str>>(
    rotor: &str,
    rows: &[[S; 3]],
) -> Result<Vec<PhysicalPoint>, InputError> {
    let table = format!("rotor `{rotor}`");
    let mut points = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let Some([flow, head, efficiency]) = parse_row(&table, index + 1, row)? else {
            continue;
        };
        let point = PhysicalPoint::new(flow, head, efficiency).map_err(|source| {
            InputError::Invalid {
                table: table.clone(),
                row: index + 1,
                source,
            }
        })?;
        points.push(point);
    }

    Ok(points)
}

/// Parses `(flow, head)` rows of a manual system curve.
///
/// `table` names the table in error messages, e.g. `"system curve 1"`.
///
/// # Errors
///
/// Returns an [`InputError`] for a non-numeric cell or a negative value.
pub fn parse_system_rows<S: AsRef<str>>(
    table: &str,
    rows: &[[S; 2]],
) -> Result<Vec<SystemPoint>, InputError> {
    let mut points = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let Some([flow, head]) = parse_row(table, index + 1, row)? else {
            continue;
        };
        let point = SystemPoint::new(flow, head).map_err(|source| InputError::Invalid {
            table: table.to_owned(),
            row: index + 1,
            source,
        })?;
        points.push(point);
    }

    Ok(points)
}

/// Parses every cell of a row; `None` if any cell is empty.
///
/// Incomplete rows are skipped before any cell is parsed, so a stray value
/// next to an empty cell never fails the table.
fn parse_row<S: AsRef<str>, const N: usize>(
    table: &str,
    row: usize,
    cells: &[S; N],
) -> Result<Option<[f64; N]>, InputError> {
    if cells.iter().any(|cell| cell.as_ref().trim().is_empty()) {
        return Ok(None);
    }

    let mut values = [0.0; N];
    for (value, cell) in values.iter_mut().zip(cells) {
        let Some(parsed) = parse_cell(cell.as_ref()) else {
            return Ok(None);
        };
        *value = parsed.map_err(|_| InputError::NotANumber {
            table: table.to_owned(),
            row,
            cell: cell.as_ref().to_owned(),
        })?;
    }
    Ok(Some(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn decimal_comma_is_accepted() {
        assert_eq!(parse_cell(" 12,75 "), Some(Ok(12.75)));
        assert_eq!(parse_cell("3.5"), Some(Ok(3.5)));
        assert_eq!(parse_cell("   "), None);
        assert!(matches!(parse_cell("abc"), Some(Err(_))));
    }

    #[test]
    fn incomplete_rows_are_skipped() {
        let rows = [["1", "2", "3"], ["", "5", "6"], ["7", "8", ""], ["9", "10", "11"]];
        let points = parse_rotor_rows("A", &rows).unwrap();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[1].flow(), 9.0);
    }

    #[test]
    fn incomplete_row_with_bad_cell_is_skipped() {
        let rows = [["0", "30", "0"], ["abc", "", "5"], ["10", "20", "60"]];
        let points = parse_rotor_rows("A", &rows).unwrap();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[1].head(), 20.0);

        let rows = [["x", ""], ["5", "7"]];
        let points = parse_system_rows("system curve 1", &rows).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn errors_name_rotor_and_row() {
        let rows = [["1", "2", "3"], ["4", "x", "6"]];
        let err = parse_rotor_rows("Rotor 7", &rows).unwrap_err();
        assert_eq!(
            err,
            InputError::NotANumber {
                table: "rotor `Rotor 7`".into(),
                row: 2,
                cell: "x".into(),
            }
        );
        assert_eq!(err.to_string(), "rotor `Rotor 7`, row 2: `x` is not a number");

        let rows = [["4", "5", "101"]];
        let err = parse_rotor_rows("B", &rows).unwrap_err();
        assert_eq!(
            err,
            InputError::Invalid {
                table: "rotor `B`".into(),
                row: 1,
                source: ParameterError::Efficiency { value: 101.0 },
            }
        );
    }

    #[test]
    fn system_rows_reject_negatives() {
        let rows = [["0", "5"], ["10", "-1"]];
        let err = parse_system_rows("system curve 1", &rows).unwrap_err();
        assert!(matches!(
            err,
            InputError::Invalid {
                row: 2,
                source: ParameterError::Negative { what: "head", .. },
                ..
            }
        ));

        let rows = [["0", "5"], ["", ""], ["10,5", "7"]];
        let points = parse_system_rows("system curve 2", &rows).unwrap();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[1].flow(), 10.5);
    }
}
