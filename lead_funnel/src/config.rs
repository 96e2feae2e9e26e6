// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// One row of the lead spreadsheet, once the relevant columns have been picked.
#[derive(PartialEq, Debug, Clone)]
pub struct RawRecord {
    pub program: String,
    pub status: String,
    pub total: f64,
}

impl RawRecord {
    pub fn new(program: &str, status: &str, total: f64) -> RawRecord {
        RawRecord {
            program: program.to_string(),
            status: status.to_string(),
            total,
        }
    }
}

/// The content of a single cell, as delivered by a loader.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

/// A rectangular table with a header row.
///
/// This is what the loaders (csv, xlsx) produce. Rows may be shorter than the header:
/// the missing cells are treated as empty.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// The names of the columns holding the program, the lead status and the total.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnNames {
    pub program: String,
    pub status: String,
    pub total: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            program: "ST_Program".to_string(),
            status: "LeadStatus".to_string(),
            total: "GroupTotal".to_string(),
        }
    }
}

/// Program name -> (raw lead status -> summed total).
///
/// A status is only present if at least one row used it.
pub type StatusTable = BTreeMap<String, BTreeMap<String, f64>>;

// ********* Funnel stages **********

pub const PRE_EVAL: &str = "PRE-EVAL";
pub const MID_EVAL: &str = "MID-EVAL";
pub const MQL: &str = "MQL";
pub const SQL: &str = "SQL";
pub const APPLICATION_IN_PROGRESS: &str = "APPLICATION IN-PROGRESS";
pub const APPLIED: &str = "APPLIED";
pub const APPLICATION_CANCELLED: &str = "APPLICATION CANCELLED";
pub const APPLICATION_WITHDRAWN: &str = "APPLICATION WITHDRAWN";
pub const ADMITTED: &str = "ADMITTED";
pub const ADMITTED_ACCEPT: &str = "ADMITTED/ACCEPT";
pub const ADMITTED_DECLINE: &str = "ADMITTED/DECLINE";
pub const ADMITTED_DEFER: &str = "ADMITTED/DEFER";
pub const ADMITTED_WITHDRAW: &str = "ADMITTED/WITHDRAW";
pub const REGISTERED: &str = "REGISTERED";

/// All the lead statuses that contribute to at least one stage.
pub const KNOWN_STATUSES: [&str; 14] = [
    PRE_EVAL,
    MID_EVAL,
    MQL,
    SQL,
    APPLICATION_IN_PROGRESS,
    APPLIED,
    APPLICATION_CANCELLED,
    APPLICATION_WITHDRAWN,
    ADMITTED,
    ADMITTED_ACCEPT,
    ADMITTED_DECLINE,
    ADMITTED_DEFER,
    ADMITTED_WITHDRAW,
    REGISTERED,
];

/// A funnel stage and the raw statuses that are summed to compute it.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub statuses: &'static [&'static str],
}

/// The funnel stages, widest first.
///
/// Every stage includes all the statuses of the stages after it: a lead that registered
/// also went through all the earlier stages. The cancelled and withdrawn applications
/// stop counting at the application stage.
pub const STAGES: [Stage; 9] = [
    Stage {
        name: "PRE_EVAL_inclusive",
        statuses: &KNOWN_STATUSES,
    },
    Stage {
        name: "MID_EVAL_inclusive",
        statuses: &[
            MID_EVAL,
            MQL,
            SQL,
            APPLICATION_IN_PROGRESS,
            APPLIED,
            APPLICATION_CANCELLED,
            APPLICATION_WITHDRAWN,
            ADMITTED,
            ADMITTED_ACCEPT,
            ADMITTED_DECLINE,
            ADMITTED_DEFER,
            ADMITTED_WITHDRAW,
            REGISTERED,
        ],
    },
    Stage {
        name: "MQL_inclusive",
        statuses: &[
            MQL,
            SQL,
            APPLICATION_IN_PROGRESS,
            APPLIED,
            APPLICATION_CANCELLED,
            APPLICATION_WITHDRAWN,
            ADMITTED,
            ADMITTED_ACCEPT,
            ADMITTED_DECLINE,
            ADMITTED_DEFER,
            ADMITTED_WITHDRAW,
            REGISTERED,
        ],
    },
    Stage {
        name: "SQL_inclusive",
        statuses: &[
            SQL,
            APPLICATION_IN_PROGRESS,
            APPLIED,
            APPLICATION_CANCELLED,
            APPLICATION_WITHDRAWN,
            ADMITTED,
            ADMITTED_ACCEPT,
            ADMITTED_DECLINE,
            ADMITTED_DEFER,
            ADMITTED_WITHDRAW,
            REGISTERED,
        ],
    },
    Stage {
        name: "APPLICATION_IN_PROGRESS_inclusive",
        statuses: &[
            APPLICATION_IN_PROGRESS,
            APPLIED,
            APPLICATION_CANCELLED,
            APPLICATION_WITHDRAWN,
            ADMITTED,
            ADMITTED_ACCEPT,
            ADMITTED_DECLINE,
            ADMITTED_DEFER,
            ADMITTED_WITHDRAW,
            REGISTERED,
        ],
    },
    Stage {
        name: "APPLIED_inclusive",
        statuses: &[
            APPLIED,
            ADMITTED,
            ADMITTED_ACCEPT,
            ADMITTED_DECLINE,
            ADMITTED_DEFER,
            ADMITTED_WITHDRAW,
            REGISTERED,
        ],
    },
    Stage {
        name: "ADMITTED_inclusive",
        statuses: &[
            ADMITTED,
            ADMITTED_ACCEPT,
            ADMITTED_DECLINE,
            ADMITTED_DEFER,
            ADMITTED_WITHDRAW,
            REGISTERED,
        ],
    },
    Stage {
        name: "ADMITTED_ACCEPT_inclusive",
        statuses: &[ADMITTED_ACCEPT, REGISTERED],
    },
    Stage {
        name: "REGISTERED_inclusive",
        statuses: &[REGISTERED],
    },
];

// ******** Output data structures *********

/// The inclusive counts of one program, aligned with `STAGES`.
#[derive(PartialEq, Debug, Clone)]
pub struct FunnelSeries {
    pub values: Vec<f64>,
}

impl FunnelSeries {
    /// Pairs every value with the name of its stage.
    pub fn labelled(&self) -> Vec<(String, f64)> {
        STAGES
            .iter()
            .zip(self.values.iter())
            .map(|(s, v)| (s.name.to_string(), *v))
            .collect()
    }
}

/// A status that did not match any stage.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct IgnoredStatus {
    pub rows: u64,
    pub total: f64,
}

/// What the aggregation dropped on the floor.
///
/// The default behaviour is to silently ignore these, callers can decide to report them.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct AggregationDiagnostics {
    pub ignored_statuses: BTreeMap<String, IgnoredStatus>,
    pub skipped_rows: u64,
}

impl AggregationDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.ignored_statuses.is_empty() && self.skipped_rows == 0
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct FunnelReport {
    pub funnels: BTreeMap<String, FunnelSeries>,
    pub diagnostics: AggregationDiagnostics,
}

/// Errors that prevent the aggregation or the layout from completing.
#[derive(PartialEq, Debug, Clone)]
pub enum FunnelErrors {
    /// The table does not have the expected columns. Fatal for the whole table.
    InputSchema { column: String, reason: String },
    /// A chart was requested for a series without any stage.
    EmptySeries { title: String },
    InvalidLayout { reason: String },
}

impl Error for FunnelErrors {}

impl Display for FunnelErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunnelErrors::InputSchema { column, reason } => {
                write!(f, "Input schema error on column {:?}: {}", column, reason)
            }
            FunnelErrors::EmptySeries { title } => {
                write!(f, "Cannot draw chart {:?}: the series has no stage", title)
            }
            FunnelErrors::InvalidLayout { reason } => write!(f, "Invalid chart layout: {}", reason),
        }
    }
}

// ********* Chart configuration **********

/// Dimensions of the funnel, in chart units.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ChartLayout {
    /// Width of the top edge of the first stage.
    pub max_width: f64,
    /// Width of the bottom edge of the last stage.
    pub min_width: f64,
    pub height: f64,
    /// Vertical gap between two stages.
    pub spacing: f64,
    /// All the trapezoids are centered in this width.
    pub total_width: f64,
}

impl ChartLayout {
    pub const DEFAULT_LAYOUT: ChartLayout = ChartLayout {
        max_width: 8.0,
        min_width: 2.0,
        height: 1.0,
        spacing: 0.2,
        total_width: 10.0,
    };

    pub fn validate(&self) -> Result<(), FunnelErrors> {
        let sizes = [
            ("maxWidth", self.max_width),
            ("minWidth", self.min_width),
            ("height", self.height),
            ("totalWidth", self.total_width),
        ];
        for (name, v) in sizes {
            if !(v.is_finite() && v > 0.0) {
                return Err(FunnelErrors::InvalidLayout {
                    reason: format!("{} must be positive, got {}", name, v),
                });
            }
        }
        if !(self.spacing.is_finite() && self.spacing >= 0.0) {
            return Err(FunnelErrors::InvalidLayout {
                reason: format!("spacing must not be negative, got {}", self.spacing),
            });
        }
        if self.min_width > self.max_width {
            return Err(FunnelErrors::InvalidLayout {
                reason: format!(
                    "minWidth {} is larger than maxWidth {}",
                    self.min_width, self.max_width
                ),
            });
        }
        if self.max_width > self.total_width {
            return Err(FunnelErrors::InvalidLayout {
                reason: format!(
                    "maxWidth {} does not fit in totalWidth {}",
                    self.max_width, self.total_width
                ),
            });
        }
        Ok(())
    }
}

impl Default for ChartLayout {
    fn default() -> Self {
        ChartLayout::DEFAULT_LAYOUT
    }
}
