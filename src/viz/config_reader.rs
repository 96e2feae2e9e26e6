use crate::viz::*;

use lead_funnel::{ChartLayout, ColumnNames};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "chart")]
    pub chart: Option<String>,
    #[serde(rename = "includeTotal")]
    pub include_total: Option<bool>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
    #[serde(rename = "referencePath")]
    pub reference_path: Option<String>,
    #[serde(rename = "reportUnknown")]
    pub report_unknown: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "programColumn")]
    pub program_column: Option<String>,
    #[serde(rename = "statusColumn")]
    pub status_column: Option<String>,
    #[serde(rename = "totalColumn")]
    pub total_column: Option<String>,
}

impl InputSource {
    pub fn column_names(&self) -> ColumnNames {
        let default = ColumnNames::default();
        ColumnNames {
            program: self.program_column.clone().unwrap_or(default.program),
            status: self.status_column.clone().unwrap_or(default.status),
            total: self.total_column.clone().unwrap_or(default.total),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(rename = "maxWidth")]
    pub max_width: Option<f64>,
    #[serde(rename = "minWidth")]
    pub min_width: Option<f64>,
    pub height: Option<f64>,
    pub spacing: Option<f64>,
    #[serde(rename = "totalWidth")]
    pub total_width: Option<f64>,
}

impl LayoutSettings {
    pub fn chart_layout(&self) -> ChartLayout {
        let default = ChartLayout::DEFAULT_LAYOUT;
        ChartLayout {
            max_width: self.max_width.unwrap_or(default.max_width),
            min_width: self.min_width.unwrap_or(default.min_width),
            height: self.height.unwrap_or(default.height),
            spacing: self.spacing.unwrap_or(default.spacing),
            total_width: self.total_width.unwrap_or(default.total_width),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "inputSource", default)]
    pub input_source: InputSource,
    #[serde(default)]
    pub layout: LayoutSettings,
}

pub fn read_config(path: &str) -> VizResult<ReportConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ReportConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> VizResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config() {
        let js = r#"{
            "inputSource": {"filePath": "leads.csv", "totalColumn": "Count"},
            "layout": {"minWidth": 1}
        }"#;
        let config: ReportConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.output_settings, OutputSettings::default());
        let cols = config.input_source.column_names();
        assert_eq!(cols.total, "Count");
        assert_eq!(cols.program, "ST_Program");
        let layout = config.layout.chart_layout();
        assert_eq!(layout.min_width, 1.0);
        assert_eq!(layout.max_width, 8.0);
    }

    #[test]
    fn report_options() {
        let js = r#"{
            "outputSettings": {"referencePath": "expected.json", "reportUnknown": true}
        }"#;
        let config: ReportConfig = serde_json::from_str(js).unwrap();
        assert_eq!(
            config.output_settings.reference_path.as_deref(),
            Some("expected.json")
        );
        assert_eq!(config.output_settings.report_unknown, Some(true));
    }

    #[test]
    fn empty_config() {
        let config: ReportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.layout.chart_layout(), ChartLayout::DEFAULT_LAYOUT);
    }
}
