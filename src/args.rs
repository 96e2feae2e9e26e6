use clap::Parser;

/// This program draws lead funnels, one per program, from a lead spreadsheet.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the report. See the manual for the format.
    /// The other options override the values of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The lead spreadsheet. Setting this option overrides the input file of the
    /// --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (xlsx or csv) The type of the input. By default, it is deduced from the extension of
    /// the input file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (directory, default '.') Where the charts are written.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the counts of each program will be written
    /// in JSON format to the given location.
    #[clap(long, value_parser)]
    pub summary: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, funnelviz will check that
    /// the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (funnel, bar, both or none, default funnel) The charts to draw for each program.
    #[clap(long, value_parser)]
    pub chart: Option<String>,

    /// If passed as an argument, also draws the funnel of all the programs together.
    #[clap(long, takes_value = false)]
    pub include_total: bool,

    /// If passed as an argument, lists the lead statuses that are not part of any stage.
    #[clap(long, takes_value = false)]
    pub report_unknown: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
