pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

use log::{debug, info, warn};

use lead_funnel::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::viz::config_reader::*;
use crate::viz::io_common::{provider_from_extension, simplify_file_name, FileNames};

#[derive(Debug, Snafu)]
pub enum FunnelVizError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The file {path} does not contain any worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Cannot find the worksheet {worksheet} in {path}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display("Error opening csv file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("No input file: use --input or the inputSource section of the configuration"))]
    MissingInput {},
    #[snafu(display("Input type {input_type:?} is not supported (xlsx or csv)"))]
    UnknownInputType { input_type: String },
    #[snafu(display("Chart type {chart:?} is not supported (funnel, bar, both or none)"))]
    UnknownChart { chart: String },
    #[snafu(display("Cannot aggregate the leads"))]
    Aggregation { source: FunnelErrors },
    #[snafu(display("Invalid layout in the configuration"))]
    Layout { source: FunnelErrors },
    #[snafu(display("Cannot draw the chart of {program}"))]
    Drawing {
        source: FunnelErrors,
        program: String,
    },
    #[snafu(display("Error writing file {path}"))]
    Writing {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type VizResult<T> = Result<T, FunnelVizError>;

/// The charts drawn for each program.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ChartKind {
    Funnel,
    Bar,
    Both,
    NoChart,
}

impl ChartKind {
    fn parse(s: &str) -> VizResult<ChartKind> {
        match s {
            "funnel" => Ok(ChartKind::Funnel),
            "bar" => Ok(ChartKind::Bar),
            "both" => Ok(ChartKind::Both),
            "none" => Ok(ChartKind::NoChart),
            x => UnknownChartSnafu { chart: x }.fail(),
        }
    }

    fn funnel(&self) -> bool {
        matches!(self, ChartKind::Funnel | ChartKind::Both)
    }

    fn bar(&self) -> bool {
        matches!(self, ChartKind::Bar | ChartKind::Both)
    }
}

/// Everything needed to run a report, once the command line and the configuration file
/// have been merged.
#[derive(PartialEq, Debug, Clone)]
pub struct ReportSettings {
    pub input_path: String,
    pub provider: String,
    pub worksheet: Option<String>,
    pub columns: ColumnNames,
    pub output_directory: PathBuf,
    pub chart: ChartKind,
    pub include_total: bool,
    pub report_unknown: bool,
    pub summary: Option<String>,
    pub reference: Option<String>,
    pub layout: ChartLayout,
}

/// Merges the command line arguments with the configuration file, if any.
///
/// The arguments take precedence. Paths of the configuration file are relative to the
/// directory of the configuration file.
pub fn resolve_settings(args: &Args) -> VizResult<ReportSettings> {
    let (config, root_p): (ReportConfig, Option<PathBuf>) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path).parent().map(|p| p.to_path_buf());
            (config, root)
        }
        None => (ReportConfig::default(), None),
    };
    info!("config: {:?}", config);

    let relative = |p: &str| -> PathBuf {
        match &root_p {
            Some(root) if Path::new(p).is_relative() => root.join(p),
            _ => PathBuf::from(p),
        }
    };

    let input_path: String = match (&args.input, &config.input_source.file_path) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => relative(p).display().to_string(),
        (None, None) => return MissingInputSnafu {}.fail(),
    };

    // An input file given on the command line does not inherit the provider of the configuration.
    let declared_provider = if args.input.is_some() {
        args.input_type.clone()
    } else {
        args.input_type
            .clone()
            .or_else(|| config.input_source.provider.clone())
    };
    let provider = match declared_provider.or_else(|| provider_from_extension(&input_path)) {
        Some(p) if p == "xlsx" || p == "csv" => p,
        Some(p) => return UnknownInputTypeSnafu { input_type: p }.fail(),
        None => {
            return UnknownInputTypeSnafu {
                input_type: input_path,
            }
            .fail()
        }
    };

    let output_directory = match (&args.out, &config.output_settings.output_directory) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => relative(p),
        (None, None) => PathBuf::from("."),
    };

    let chart = ChartKind::parse(
        args.chart
            .as_deref()
            .or(config.output_settings.chart.as_deref())
            .unwrap_or("funnel"),
    )?;

    let summary = match (&args.summary, &config.output_settings.summary_path) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(p)) if p == "stdout" => Some(p.clone()),
        (None, Some(p)) => Some(relative(p).display().to_string()),
        (None, None) => None,
    };

    let reference = match (&args.reference, &config.output_settings.reference_path) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(p)) => Some(relative(p).display().to_string()),
        (None, None) => None,
    };

    let layout = config.layout.chart_layout();
    layout.validate().context(LayoutSnafu {})?;

    Ok(ReportSettings {
        input_path,
        provider,
        worksheet: args
            .excel_worksheet_name
            .clone()
            .or_else(|| config.input_source.excel_worksheet_name.clone()),
        columns: config.input_source.column_names(),
        output_directory,
        chart,
        include_total: args.include_total || config.output_settings.include_total.unwrap_or(false),
        report_unknown: args.report_unknown
            || config.output_settings.report_unknown.unwrap_or(false),
        summary,
        reference,
        layout,
    })
}

fn read_table(settings: &ReportSettings) -> VizResult<RawTable> {
    info!(
        "Attempting to read lead file {:?} ({})",
        settings.input_path, settings.provider
    );
    match settings.provider.as_str() {
        "csv" => io_csv::read_csv_table(&settings.input_path),
        "xlsx" => io_excel::read_excel_table(&settings.input_path, settings.worksheet.as_deref()),
        x => UnknownInputTypeSnafu { input_type: x }.fail(),
    }
}

fn report_diagnostics(diagnostics: &AggregationDiagnostics) {
    for (status, ignored) in diagnostics.ignored_statuses.iter() {
        warn!(
            "Lead status {:?} is not part of any stage: {} rows, {} leads ignored",
            status,
            ignored.rows,
            format_count(ignored.total)
        );
    }
    if diagnostics.skipped_rows > 0 {
        warn!(
            "{} rows without a program or a status were skipped",
            diagnostics.skipped_rows
        );
    }
}

fn series_to_json(program: &str, series: &FunnelSeries) -> JSValue {
    let rates = conversion_rates(&series.values);
    let stages: Vec<JSValue> = series
        .labelled()
        .iter()
        .zip(rates)
        .map(|((stage, count), rate)| {
            json!({
                "stage": stage,
                "count": count.to_string(),
                "conversion": rate.map(|r| format!("{:.1}", r)),
            })
        })
        .collect();
    json!({"program": program, "stages": stages})
}

fn build_summary_js(
    settings: &ReportSettings,
    report: &FunnelReport,
    total: &Option<FunnelSeries>,
) -> JSValue {
    let results: Vec<JSValue> = report
        .funnels
        .iter()
        .map(|(program, series)| series_to_json(program, series))
        .collect();

    let mut ignored: JSMap<String, JSValue> = JSMap::new();
    for (status, i) in report.diagnostics.ignored_statuses.iter() {
        ignored.insert(
            status.clone(),
            json!({"rows": i.rows.to_string(), "total": i.total.to_string()}),
        );
    }

    let mut js = json!({
        "config": {
            "input": simplify_file_name(&settings.input_path),
            "programColumn": settings.columns.program,
            "statusColumn": settings.columns.status,
            "totalColumn": settings.columns.total,
        },
        "results": results,
        "ignoredStatuses": ignored,
    });
    if let Some(t) = total {
        js["total"] = series_to_json(ALL_PROGRAMS, t);
    }
    js
}

fn write_file(path: &Path, content: &str) -> VizResult<()> {
    fs::write(path, content).context(WritingSnafu {
        path: path.display().to_string(),
    })
}

/// Draws and writes the charts of one program.
fn draw_program(
    settings: &ReportSettings,
    stem: &str,
    program: &str,
    series: &FunnelSeries,
) -> VizResult<Vec<PathBuf>> {
    let stages = series.labelled();
    let style = SvgStyle::DEFAULT_STYLE;
    let mut written: Vec<PathBuf> = Vec::new();
    if settings.chart.funnel() {
        let chart = layout_funnel(program, &stages, &settings.layout)
            .context(DrawingSnafu { program })?;
        let p = settings.output_directory.join(format!("{}_funnel.svg", stem));
        write_file(&p, &to_svg(&chart, &style))?;
        written.push(p);
    }
    if settings.chart.bar() {
        let chart = layout_bars(program, &stages).context(DrawingSnafu { program })?;
        let p = settings.output_directory.join(format!("{}_bars.svg", stem));
        write_file(&p, &bars_to_svg(&chart, &style))?;
        written.push(p);
    }
    Ok(written)
}

/// Runs a full report: reads the leads, aggregates them and draws the charts.
///
/// A chart that fails does not prevent the other programs from being drawn, but the
/// report is then reported as failed.
pub fn run_report(settings: &ReportSettings) -> VizResult<JSValue> {
    let table = read_table(settings)?;
    let report = aggregate_table(&table, &settings.columns).context(AggregationSnafu {})?;
    info!("Found {:?} programs", report.funnels.len());

    if settings.report_unknown {
        report_diagnostics(&report.diagnostics);
    } else if !report.diagnostics.is_clean() {
        debug!("run_report: diagnostics: {:?}", report.diagnostics);
    }

    let total = if settings.include_total {
        total_series(&report.funnels)
    } else {
        None
    };

    if settings.chart != ChartKind::NoChart {
        fs::create_dir_all(&settings.output_directory).context(WritingSnafu {
            path: settings.output_directory.display().to_string(),
        })?;
    }

    let mut file_names = FileNames::default();
    let mut failures: Vec<String> = Vec::new();
    let all_series = report
        .funnels
        .iter()
        .map(|(p, s)| (p.as_str(), s))
        .chain(total.iter().map(|s| (ALL_PROGRAMS, s)));
    for (program, series) in all_series {
        let stem = file_names.stem_for(program);
        match draw_program(settings, &stem, program, series) {
            Ok(paths) => {
                for p in paths {
                    info!("Program {:?}: wrote {:?}", program, p);
                }
            }
            Err(e) => {
                warn!("Program {:?}: {}", program, e);
                failures.push(program.to_string());
            }
        }
    }

    let summary_js = build_summary_js(settings, &report, &total);
    let pretty_js_stats =
        serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    match settings.summary.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(p) => write_file(Path::new(p), &pretty_js_stats)?,
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &settings.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    if !failures.is_empty() {
        whatever!("Could not draw the charts of {:?}", failures)
    }
    Ok(summary_js)
}

pub fn run(args: &Args) -> VizResult<()> {
    let settings = resolve_settings(args)?;
    debug!("run: settings: {:?}", settings);
    run_report(&settings)?;
    Ok(())
}

/// Prints an error and its chain of causes on stderr.
pub fn print_error(e: &FunnelVizError) {
    eprintln!("An error occured: {}", e);
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        eprintln!("  caused by: {}", s);
        source = std::error::Error::source(s);
    }
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> PathBuf {
        [env!("CARGO_MANIFEST_DIR"), "testdata"].iter().collect()
    }

    fn args_for(config: &str) -> Args {
        Args {
            config: Some(test_dir().join(config).display().to_string()),
            input: None,
            input_type: None,
            excel_worksheet_name: None,
            out: None,
            summary: None,
            reference: None,
            chart: None,
            include_total: false,
            report_unknown: false,
            verbose: false,
        }
    }

    fn out_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("funnelviz-{}-{}", name, std::process::id()))
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn settings_from_config() {
        let settings = resolve_settings(&args_for("leads_config.json")).unwrap();
        assert_eq!(settings.provider, "csv");
        assert!(settings.input_path.ends_with("leads.csv"));
        assert_eq!(settings.chart, ChartKind::Both);
        assert!(settings.include_total);
        assert!(settings.report_unknown);
        assert_eq!(settings.reference, None);
        assert_eq!(settings.layout, ChartLayout::DEFAULT_LAYOUT);
    }

    #[test]
    fn arguments_override_config() {
        let mut args = args_for("leads_config.json");
        args.chart = Some("bar".to_string());
        args.input = Some("other.xlsx".to_string());
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.chart, ChartKind::Bar);
        assert_eq!(settings.provider, "xlsx");
        assert_eq!(settings.input_path, "other.xlsx");
    }

    #[test]
    fn bad_settings() {
        let mut args = args_for("leads_config.json");
        args.chart = Some("pie".to_string());
        assert!(matches!(
            resolve_settings(&args),
            Err(FunnelVizError::UnknownChart { .. })
        ));
        let mut args = args_for("leads_config.json");
        args.input_type = Some("ods".to_string());
        assert!(matches!(
            resolve_settings(&args),
            Err(FunnelVizError::UnknownInputType { .. })
        ));
        let mut args = args_for("leads_config.json");
        args.config = None;
        assert!(matches!(
            resolve_settings(&args),
            Err(FunnelVizError::MissingInput {})
        ));
    }

    #[test]
    fn leads_report_matches_reference() {
        init();
        let mut args = args_for("leads_config.json");
        let out = out_dir("leads");
        args.out = Some(out.display().to_string());
        args.reference = Some(
            test_dir()
                .join("leads_expected_summary.json")
                .display()
                .to_string(),
        );
        args.report_unknown = true;
        let settings = resolve_settings(&args).unwrap();
        let js = run_report(&settings).unwrap();

        assert_eq!(js["results"][0]["program"], "MBA");
        assert_eq!(js["ignoredStatuses"]["DUPLICATE"]["rows"], "1");
        for name in [
            "MBA_funnel.svg",
            "MBA_bars.svg",
            "MSc_Data_Science_funnel.svg",
            "All_programs_funnel.svg",
        ] {
            assert!(out.join(name).exists(), "missing {}", name);
        }
        let _ = fs::remove_dir_all(&out);
    }

    #[test]
    fn missing_total_column_fails() {
        init();
        let mut args = args_for("leads_config.json");
        args.input = Some(test_dir().join("no_total.csv").display().to_string());
        args.chart = Some("none".to_string());
        let settings = resolve_settings(&args).unwrap();
        match run_report(&settings) {
            Err(FunnelVizError::Aggregation {
                source: FunnelErrors::InputSchema { column, .. },
            }) => assert_eq!(column, "GroupTotal"),
            x => panic!("unexpected result {:?}", x),
        }
    }
}
