// Primitives for reading CSV files.

use lead_funnel::{Cell, RawTable};

use crate::viz::*;

/// Reads a csv file with a header row.
///
/// All the cells are read as text. Numbers are recognized later, when the columns are picked.
pub fn read_csv_table(path: &str) -> VizResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvOpenSnafu { path })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_table: header: {:?}", header);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is on line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, line);
        let row: Vec<Cell> = line
            .iter()
            .map(|s| {
                if s.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(s.to_string())
                }
            })
            .collect();
        rows.push(row);
    }
    info!("Read {:?} rows from {:?}", rows.len(), path);
    Ok(RawTable { header, rows })
}
