/*!
Inclusive funnel aggregation of lead statuses, and the layout of the matching funnel charts.

The entry points are:
* [aggregate_table] to go from a spreadsheet-like table to one [FunnelSeries] per program
* [layout_funnel] and [to_svg] to draw one of these series
* [layout_bars] and [bars_to_svg] for the bar chart view of the same data

See the [manual] for the definition of each stage.
*/

pub mod builder;
pub mod color;
mod config;
pub mod manual;
mod render;
mod render_bars;
mod svg;

use log::{debug, info};

use std::collections::BTreeMap;

pub use crate::color::rainbow;
pub use crate::config::*;
pub use crate::render::*;
pub use crate::render_bars::*;
pub use crate::svg::*;

/// Title of the funnel that sums all the programs.
pub const ALL_PROGRAMS: &str = "All programs";

/// Runs the full aggregation on a table coming from a loader.
///
/// Arguments:
/// * `table` the raw table, with a header row
/// * `columns` the names of the program, status and total columns in the header
///
/// The schema of the table is checked first: any missing column, or a total column that
/// holds non-numeric or infinite content, fails the whole table. Empty totals and the
/// [MISSING_MARKERS] count as zero.
pub fn aggregate_table(
    table: &RawTable,
    columns: &ColumnNames,
) -> Result<FunnelReport, FunnelErrors> {
    info!(
        "Aggregating {:?} rows, columns: {:?}",
        table.rows.len(),
        columns
    );
    let (records, skipped_rows) = extract_records(table, columns)?;
    let (status_table, mut diagnostics) = collapse_records(&records);
    diagnostics.skipped_rows = skipped_rows;
    let funnels = compute_funnels(&status_table);
    Ok(FunnelReport {
        funnels,
        diagnostics,
    })
}

/// Picks the three relevant columns out of the table.
///
/// Returns the records and the number of rows that were skipped because the program
/// or the status was blank.
pub fn extract_records(
    table: &RawTable,
    columns: &ColumnNames,
) -> Result<(Vec<RawRecord>, u64), FunnelErrors> {
    let program_idx = find_column(&table.header, &columns.program)?;
    let status_idx = find_column(&table.header, &columns.status)?;
    let total_idx = find_column(&table.header, &columns.total)?;

    // The numeric check is done on the whole column before reading anything.
    let mut totals: Vec<f64> = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let total = match row.get(total_idx).unwrap_or(&Cell::Empty) {
            Cell::Number(x) if x.is_finite() => *x,
            Cell::Empty => 0.0,
            Cell::Text(s) if is_missing_marker(s) => {
                debug!("extract_records: row {}: missing total {:?}", idx + 2, s);
                0.0
            }
            Cell::Text(s) => match s.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => x,
                _ => return Err(non_numeric_total(columns, &format!("{:?}", s), idx)),
            },
            Cell::Number(x) => return Err(non_numeric_total(columns, &x.to_string(), idx)),
        };
        totals.push(total);
    }

    let mut skipped: u64 = 0;
    let mut records: Vec<RawRecord> = Vec::with_capacity(table.rows.len());
    for (row, total) in table.rows.iter().zip(totals) {
        let program = cell_key(row.get(program_idx));
        let status = cell_key(row.get(status_idx));
        match (program, status) {
            (Some(program), Some(status)) => records.push(RawRecord {
                program,
                status,
                total,
            }),
            _ => {
                debug!("extract_records: skipping row {:?}", row);
                skipped += 1;
            }
        }
    }
    Ok((records, skipped))
}

/// The markers that spreadsheets and exports use for a missing value.
///
/// A total holding one of them counts as zero, like an empty cell.
pub const MISSING_MARKERS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

fn is_missing_marker(s: &str) -> bool {
    MISSING_MARKERS.contains(&s.trim())
}

fn non_numeric_total(columns: &ColumnNames, value: &str, idx: usize) -> FunnelErrors {
    FunnelErrors::InputSchema {
        column: columns.total.clone(),
        // Row numbers start at 1 with the header.
        reason: format!("non-numeric value {} in row {}", value, idx + 2),
    }
}

fn find_column(header: &[String], name: &str) -> Result<usize, FunnelErrors> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| FunnelErrors::InputSchema {
            column: name.to_string(),
            reason: format!("missing from the header {:?}", header),
        })
}

// Blank keys are dropped, like a pivot table would do.
fn cell_key(cell: Option<&Cell>) -> Option<String> {
    match cell {
        Some(Cell::Text(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        // Some programs are identified by a code.
        Some(Cell::Number(x)) if x.fract() == 0.0 => Some(format!("{}", *x as i64)),
        Some(Cell::Number(x)) => Some(x.to_string()),
        _ => None,
    }
}

/// Sums the totals by (program, status).
///
/// The statuses that do not belong to any stage are still kept in the status table
/// (they simply never get summed), and reported in the diagnostics.
pub fn collapse_records(records: &[RawRecord]) -> (StatusTable, AggregationDiagnostics) {
    let mut status_table: StatusTable = BTreeMap::new();
    let mut diagnostics = AggregationDiagnostics::default();
    for r in records {
        *status_table
            .entry(r.program.clone())
            .or_default()
            .entry(r.status.clone())
            .or_insert(0.0) += r.total;
        if !KNOWN_STATUSES.contains(&r.status.as_str()) {
            let ignored = diagnostics
                .ignored_statuses
                .entry(r.status.clone())
                .or_default();
            ignored.rows += 1;
            ignored.total += r.total;
        }
    }
    debug!(
        "collapse_records: {:?} programs, ignored statuses: {:?}",
        status_table.len(),
        diagnostics.ignored_statuses
    );
    (status_table, diagnostics)
}

/// Computes the inclusive stage counts of every program.
///
/// Each stage is summed from scratch over its own statuses. A missing status counts as zero.
pub fn compute_funnels(status_table: &StatusTable) -> BTreeMap<String, FunnelSeries> {
    status_table
        .iter()
        .map(|(program, statuses)| {
            let series = compute_series(statuses);
            debug!("compute_funnels: {}: {:?}", program, series.values);
            (program.clone(), series)
        })
        .collect()
}

/// The inclusive counts for the statuses of a single program.
pub fn compute_series(statuses: &BTreeMap<String, f64>) -> FunnelSeries {
    let values = STAGES
        .iter()
        .map(|stage| {
            stage
                .statuses
                .iter()
                .map(|s| statuses.get(*s).cloned().unwrap_or(0.0))
                .sum::<f64>()
        })
        .collect();
    FunnelSeries { values }
}

/// Sums all the programs, stage by stage.
///
/// Returns None when there is no program.
pub fn total_series(funnels: &BTreeMap<String, FunnelSeries>) -> Option<FunnelSeries> {
    if funnels.is_empty() {
        return None;
    }
    let mut values = vec![0.0; STAGES.len()];
    for series in funnels.values() {
        for (acc, v) in values.iter_mut().zip(series.values.iter()) {
            *acc += *v;
        }
    }
    Some(FunnelSeries { values })
}

/// The ratio between a stage and the previous one, in percents.
///
/// It is not defined when the previous stage is empty.
pub fn conversion_rate(previous: f64, current: f64) -> Option<f64> {
    if previous > 0.0 {
        Some(current / previous * 100.0)
    } else {
        None
    }
}

/// Conversion rates along a series. The first stage has no rate.
pub fn conversion_rates(counts: &[f64]) -> Vec<Option<f64>> {
    counts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i == 0 {
                None
            } else {
                conversion_rate(counts[i - 1], *c)
            }
        })
        .collect()
}

/// Formats a count with commas as thousands separators.
///
/// Integral values are printed without decimals. Others keep two decimals.
pub fn format_count(count: f64) -> String {
    if !count.is_finite() {
        return count.to_string();
    }
    let negative = count < 0.0;
    let abs = count.abs();
    let (int_part, frac) = if abs.fract() == 0.0 {
        (format!("{:.0}", abs), None)
    } else {
        let s = format!("{:.2}", abs);
        let mut parts = s.splitn(2, '.');
        let i = parts.next().unwrap_or("0").to_string();
        let f = parts.next().map(|f| f.to_string());
        (i, f)
    };
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (idx, c) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    let sign = if negative { "-" } else { "" };
    match frac {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn table(rows: &[(&str, &str, f64)]) -> RawTable {
        RawTable {
            header: vec![
                "ST_Program".to_string(),
                "LeadStatus".to_string(),
                "GroupTotal".to_string(),
            ],
            rows: rows
                .iter()
                .map(|(p, s, t)| vec![text(p), text(s), Cell::Number(*t)])
                .collect(),
        }
    }

    #[test]
    fn prog_a_scenario() {
        init();
        let t = table(&[
            ("ProgA", "REGISTERED", 5.0),
            ("ProgA", "ADMITTED/ACCEPT", 3.0),
            ("ProgA", "APPLIED", 10.0),
        ]);
        let report = aggregate_table(&t, &ColumnNames::default()).unwrap();
        assert_eq!(report.funnels.len(), 1);
        assert_eq!(
            report.funnels["ProgA"].values,
            vec![18.0, 18.0, 18.0, 18.0, 18.0, 18.0, 8.0, 8.0, 5.0]
        );
        assert!(report.diagnostics.is_clean());
    }

    #[test]
    fn status_table_sums_duplicates() {
        let records = vec![
            RawRecord::new("ProgA", "MQL", 2.0),
            RawRecord::new("ProgA", "MQL", 3.0),
            RawRecord::new("ProgB", "SQL", 1.0),
        ];
        let (st, diag) = collapse_records(&records);
        assert_eq!(st["ProgA"]["MQL"], 5.0);
        assert_eq!(st["ProgB"].get("MQL"), None);
        assert!(diag.is_clean());
    }

    #[test]
    fn empty_table() {
        let t = table(&[]);
        let report = aggregate_table(&t, &ColumnNames::default()).unwrap();
        assert!(report.funnels.is_empty());
    }

    #[test]
    fn missing_total_column() {
        let t = RawTable {
            header: vec!["ST_Program".to_string(), "LeadStatus".to_string()],
            rows: vec![vec![text("ProgA"), text("MQL")]],
        };
        match aggregate_table(&t, &ColumnNames::default()) {
            Err(FunnelErrors::InputSchema { column, .. }) => assert_eq!(column, "GroupTotal"),
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn missing_program_column() {
        let t = RawTable {
            header: vec!["LeadStatus".to_string(), "GroupTotal".to_string()],
            rows: vec![],
        };
        let err = aggregate_table(&t, &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, FunnelErrors::InputSchema { column, .. } if column == "ST_Program"));
    }

    #[test]
    fn non_numeric_total_column() {
        let mut t = table(&[("ProgA", "MQL", 1.0)]);
        t.rows.push(vec![text("ProgA"), text("SQL"), text("lots")]);
        let err = aggregate_table(&t, &ColumnNames::default()).unwrap_err();
        match err {
            FunnelErrors::InputSchema { column, reason } => {
                assert_eq!(column, "GroupTotal");
                assert!(reason.contains("row 3"));
            }
            x => panic!("unexpected error {:?}", x),
        }
    }

    #[test]
    fn non_finite_totals_are_rejected() {
        for bad in ["inf", "-infinity", "1e999"] {
            let mut t = table(&[("ProgA", "REGISTERED", 5.0)]);
            t.rows.push(vec![text("ProgA"), text("APPLIED"), text(bad)]);
            match aggregate_table(&t, &ColumnNames::default()) {
                Err(FunnelErrors::InputSchema { column, reason }) => {
                    assert_eq!(column, "GroupTotal");
                    assert!(reason.contains("row 3"), "{}", reason);
                }
                x => panic!("unexpected result for {:?}: {:?}", bad, x),
            }
        }
        let t = table(&[("ProgA", "REGISTERED", 5.0), ("ProgA", "APPLIED", f64::NAN)]);
        assert!(matches!(
            aggregate_table(&t, &ColumnNames::default()),
            Err(FunnelErrors::InputSchema { .. })
        ));
    }

    #[test]
    fn missing_markers_count_as_zero() {
        for marker in ["N/A", "#N/A", "NA", "NULL", "NaN", "nan", " null "] {
            let mut t = table(&[("ProgA", "REGISTERED", 5.0)]);
            t.rows.push(vec![text("ProgA"), text("APPLIED"), text(marker)]);
            let report = aggregate_table(&t, &ColumnNames::default()).unwrap();
            assert_eq!(
                report.funnels["ProgA"].values,
                vec![5.0; 9],
                "marker {:?}",
                marker
            );
            assert!(report.funnels["ProgA"].values.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn numeric_text_and_blank_totals() {
        let t = RawTable {
            header: vec![
                "GroupTotal".to_string(),
                "LeadStatus".to_string(),
                "ST_Program".to_string(),
            ],
            rows: vec![
                vec![text(" 4 "), text("REGISTERED"), text("ProgA")],
                vec![Cell::Empty, text("REGISTERED"), text("ProgA")],
                vec![text("2"), text("REGISTERED")],
            ],
        };
        let report = aggregate_table(&t, &ColumnNames::default()).unwrap();
        assert_eq!(report.funnels["ProgA"].values[8], 4.0);
        assert_eq!(report.diagnostics.skipped_rows, 1);
    }

    #[test]
    fn custom_column_names() {
        let t = RawTable {
            header: vec!["prog".to_string(), "st".to_string(), "n".to_string()],
            rows: vec![vec![text("P"), text("MQL"), Cell::Number(7.0)]],
        };
        let cols = ColumnNames {
            program: "prog".to_string(),
            status: "st".to_string(),
            total: "n".to_string(),
        };
        let report = aggregate_table(&t, &cols).unwrap();
        assert_eq!(report.funnels["P"].values[2], 7.0);
        assert_eq!(report.funnels["P"].values[3], 0.0);
    }

    #[test]
    fn unknown_statuses_are_ignored_but_reported() {
        let t = table(&[
            ("ProgA", "REGISTERED", 1.0),
            ("ProgA", "SPAM", 100.0),
            ("ProgA", "SPAM", 5.0),
        ]);
        let report = aggregate_table(&t, &ColumnNames::default()).unwrap();
        assert_eq!(report.funnels["ProgA"].values, vec![1.0; 9]);
        let spam = &report.diagnostics.ignored_statuses["SPAM"];
        assert_eq!(spam.rows, 2);
        assert_eq!(spam.total, 105.0);
    }

    #[test]
    fn all_zero_program() {
        let t = table(&[("ProgZ", "MQL", 0.0), ("ProgZ", "APPLIED", 0.0)]);
        let report = aggregate_table(&t, &ColumnNames::default()).unwrap();
        assert_eq!(report.funnels["ProgZ"].values, vec![0.0; 9]);
    }

    #[test]
    fn registered_stage_is_registered_status() {
        let mut statuses = BTreeMap::new();
        for (i, s) in KNOWN_STATUSES.iter().enumerate() {
            statuses.insert(s.to_string(), (i + 1) as f64);
        }
        let series = compute_series(&statuses);
        assert_eq!(series.values[8], statuses[REGISTERED]);
        // PRE_EVAL includes everything.
        let pre_eval = series.values[0];
        assert!(series.values.iter().all(|v| *v <= pre_eval));
        assert_eq!(pre_eval, (1..=14).sum::<usize>() as f64);
    }

    #[test]
    fn stage_rules_are_nested() {
        for w in STAGES.windows(2) {
            for s in w[1].statuses {
                assert!(
                    w[0].statuses.contains(s),
                    "{} missing from {}",
                    s,
                    w[0].name
                );
            }
        }
        assert!(STAGES.iter().all(|s| s.name.ends_with("_inclusive")));
        assert_eq!(STAGES[0].statuses.len(), 14);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let t = table(&[
            ("ProgA", "MQL", 3.0),
            ("ProgB", "ADMITTED/DEFER", 2.0),
            ("ProgA", "APPLICATION CANCELLED", 4.0),
        ]);
        let r1 = aggregate_table(&t, &ColumnNames::default()).unwrap();
        let r2 = aggregate_table(&t, &ColumnNames::default()).unwrap();
        assert_eq!(r1, r2);
        // Cancelled applications stop at the application stage.
        assert_eq!(
            r1.funnels["ProgA"].values,
            vec![7.0, 7.0, 7.0, 4.0, 4.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn totals_across_programs() {
        let t = table(&[("ProgA", "REGISTERED", 1.0), ("ProgB", "MQL", 2.0)]);
        let report = aggregate_table(&t, &ColumnNames::default()).unwrap();
        let total = total_series(&report.funnels).unwrap();
        assert_eq!(
            total.values,
            vec![3.0, 3.0, 3.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]
        );
        assert_eq!(total_series(&BTreeMap::new()), None);
    }

    #[test]
    fn conversion_rates_skip_zero() {
        let rates = conversion_rates(&[10.0, 5.0, 0.0, 0.0]);
        assert_eq!(rates, vec![None, Some(50.0), Some(0.0), None]);
    }

    #[test]
    fn counts_with_separators() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(1234567.0), "1,234,567");
        assert_eq!(format_count(1234.5), "1,234.50");
        assert_eq!(format_count(-4200.0), "-4,200");
    }
}
