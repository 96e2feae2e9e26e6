use calamine::DataType;
use lead_funnel::{Cell, RawTable};

use crate::viz::*;

/// Reads a worksheet of an Excel file. The first row is the header.
///
/// When no worksheet name is given, the first worksheet is used.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> VizResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = match iter.next() {
        Some(header_row) => header_row.iter().map(header_name).collect(),
        // An empty worksheet has no column at all: the schema check will report it.
        None => Vec::new(),
    };
    debug!("read_excel_table: header: {:?}", header);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        debug!("read_excel_table: idx: {:?} row: {:?}", idx, row);
        rows.push(row.iter().map(read_cell).collect());
    }
    info!("Read {:?} rows from {:?}", rows.len(), path);
    Ok(RawTable { header, rows })
}

fn header_name(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Empty => "".to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => f.to_string(),
        x => format!("{:?}", x),
    }
}

fn read_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(s) if s.trim().is_empty() => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Empty => Cell::Empty,
        DataType::Bool(b) => Cell::Text(b.to_string()),
        // Formula errors (#N/A, #DIV/0!, ...) are missing values.
        DataType::Error(_) => Cell::Empty,
        x => Cell::Text(format!("{:?}", x)),
    }
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> VizResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet) = worksheet_name {
        let wrange = workbook
            .worksheet_range(worksheet)
            .context(MissingWorksheetSnafu { path, worksheet })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}
