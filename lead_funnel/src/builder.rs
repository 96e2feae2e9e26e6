pub use crate::config::*;
use crate::{collapse_records, compute_funnels};

/// A builder for adding lead records one at a time.
///
/// This is the entry point when the records do not come from a table (for example
/// when they are produced by another program).
///
/// ```
/// pub use lead_funnel::builder::Builder;
///
/// let mut builder = Builder::new();
/// builder.add_record("ProgA", "REGISTERED", 5.0);
/// builder.add_record("ProgA", "APPLIED", 10.0);
/// let report = builder.build();
///
/// assert_eq!(report.funnels["ProgA"].values[5], 15.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _records: Vec<RawRecord>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _records: Vec::new(),
        }
    }

    pub fn records(self, records: &[RawRecord]) -> Builder {
        let mut _records = self._records;
        _records.extend_from_slice(records);
        Builder { _records }
    }

    /// Adds the count of leads of a program that are currently in a given status.
    pub fn add_record(&mut self, program: &str, status: &str, total: f64) {
        self._records.push(RawRecord::new(program, status, total));
    }

    pub fn build(&self) -> FunnelReport {
        let (status_table, diagnostics) = collapse_records(&self._records);
        FunnelReport {
            funnels: compute_funnels(&status_table),
            diagnostics,
        }
    }
}
