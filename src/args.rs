use clap::Parser;

/// This program summarizes the responses of an online survey into an Excel workbook.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the input, the questions to summarize and the output.
    /// For more information about the file format, read the documentation of the survey_tally::manual module.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The survey export to summarize. Setting this option overrides the path that may be
    /// specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. If not provided, it is deduced from the extension of the input file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path) The Excel workbook to write. Defaults to '<input name>_summary.xlsx' next to the input.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or 'stdout') If specified, the counts will also be written in JSON format to the given location.
    #[clap(long, value_parser)]
    pub json_out: Option<String>,

    /// (file path) A JSON summary of a previous run. If provided, the program will check that the
    /// computed counts match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (column name, can be repeated) Questions in which one cell may hold several answers. Only used
    /// when the questions are not listed in the configuration.
    #[clap(long, value_parser)]
    pub multi_select: Vec<String>,

    /// (default ';') The separator between the answers of a multi-select question.
    #[clap(long, value_parser)]
    pub delimiter: Option<String>,

    /// (default ',') The field separator of CSV inputs.
    #[clap(long, value_parser)]
    pub csv_delimiter: Option<char>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default '<no answer>') The label for the respondents who left a question empty.
    #[clap(long, value_parser)]
    pub no_answer_label: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
