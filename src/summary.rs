pub mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;
pub mod report_writer;

use log::{debug, info, warn};

use snafu::prelude::*;
use survey_tally::builder::TableBuilder;
use survey_tally::*;

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::summary::config_reader::*;

/// The survey export could not be turned into a response table.
#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display(
        "No survey export to read: use --input or set inputSource.filePath in the configuration"
    ))]
    MissingInput {},
    #[snafu(display("Survey export {path} does not exist"))]
    InputNotFound { path: String },
    #[snafu(display("Unknown input type {provider:?} (supported: csv, xlsx)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    ReadingCsvLine {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Excel file {path} has no worksheet"))]
    EmptyWorkbook { path: String },
    #[snafu(display("{path} has no header row naming the questions"))]
    MissingHeader { path: String },
    #[snafu(display("Invalid survey data in {path}"))]
    InvalidTable { source: TallyErrors, path: String },
}

/// The report or the JSON summary could not be written.
#[derive(Debug, Snafu)]
pub enum WriteError {
    #[snafu(display("Error building report {path}"))]
    BuildingWorkbook {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error saving report {path}"))]
    SavingWorkbook {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error serializing the JSON summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing JSON summary {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
}

#[derive(Debug, Snafu)]
pub enum SummaryError {
    #[snafu(display("Failed to load the survey responses"))]
    Load { source: LoadError },
    #[snafu(display("Failed to write the summary"))]
    Write { source: WriteError },
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error opening reference summary {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing reference summary {path}"))]
    ParsingReference {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the computed summary and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type LoadResult<T> = Result<T, LoadError>;
type WriteResult<T> = Result<T, WriteError>;
pub type SummaryResult<T> = Result<T, SummaryError>;

fn kind_name(section: &Section) -> &'static str {
    match section {
        Section::Tally(t) if t.kind == TallyKind::SingleChoice => "singleChoice",
        Section::Tally(_) => "multiSelect",
        Section::Grid(_) => "grid",
        Section::Freeform(_) => "freeform",
    }
}

fn section_to_json(section: &Section) -> JSValue {
    let kind = kind_name(section);
    match section {
        Section::Tally(t) => {
            let tally: Vec<JSValue> = t
                .entries
                .iter()
                .map(|(answer, count)| json!({"answer": answer, "count": count}))
                .collect();
            json!({"question": t.question, "kind": kind, "tally": tally})
        }
        Section::Grid(g) => {
            let rows: Vec<JSValue> = g
                .rows
                .iter()
                .map(|r| {
                    json!({
                        "column": r.column,
                        "counts": r.counts,
                        "other": r.other,
                        "noAnswer": r.no_answer
                    })
                })
                .collect();
            json!({"question": g.title, "kind": kind, "options": g.options, "rows": rows})
        }
        Section::Freeform(f) => {
            json!({"question": f.question, "kind": kind, "responses": f.responses})
        }
    }
}

/// The JSON view of a summary. It only holds the counts, so that two runs on
/// the same export produce the same document.
fn build_summary_js(report: &ReportSettings, summary: &Summary) -> JSValue {
    let results: Vec<JSValue> = summary.sections.iter().map(section_to_json).collect();
    let warnings: Vec<String> = summary.warnings.iter().map(|w| w.to_string()).collect();
    json!({
        "config": {
            "title": report.title,
            "respondents": summary.respondents,
        },
        "results": results,
        "warnings": warnings,
    })
}

fn pretty_json(js: &JSValue) -> WriteResult<String> {
    serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})
}

fn write_json_summary(out: &str, js: &JSValue) -> WriteResult<()> {
    let pretty = pretty_json(js)?;
    if out == "stdout" {
        println!("{}", pretty);
    } else {
        info!("Writing JSON summary {:?}", out);
        fs::write(out, pretty + "\n").context(WritingJsonSnafu { path: out })?;
    }
    Ok(())
}

pub fn read_summary(path: &str) -> SummaryResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningReferenceSnafu { path })?;
    let js: JSValue =
        serde_json::from_str(contents.as_str()).context(ParsingReferenceSnafu { path })?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

fn check_reference(path: &str, result_js: &JSValue) -> SummaryResult<()> {
    let summary_ref = read_summary(path)?;
    if summary_ref != *result_js {
        warn!("Found differences with the reference summary {}", path);
        let pretty_ref = pretty_json(&summary_ref).context(WriteSnafu {})?;
        let pretty_res = pretty_json(result_js).context(WriteSnafu {})?;
        print_diff(pretty_ref.as_str(), pretty_res.as_str(), "\n");
        return ReferenceMismatchSnafu { path }.fail();
    }
    info!("The summary matches the reference {}", path);
    Ok(())
}

/// Reads the survey export described by the settings.
pub fn load_responses(input: &InputSettings) -> LoadResult<ResponseTable> {
    let path = input.path.display().to_string();
    ensure!(input.path.is_file(), InputNotFoundSnafu { path: &path });
    info!("Attempting to read survey export {:?}", path);
    match input.provider {
        Provider::Csv => io_csv::read_csv_responses(&path, input.csv_delimiter),
        Provider::Xlsx => io_xlsx::read_xlsx_responses(&path, &input.excel_worksheet_name),
    }
}

/// Runs the whole pipeline once: load the export, summarize it, write the report.
pub fn run_summary(args: &Args) -> SummaryResult<()> {
    let (config, config_dir): (SurveyConfig, Option<PathBuf>) = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            (config, Path::new(p).parent().map(|d| d.to_path_buf()))
        }
        None => (SurveyConfig::default(), None),
    };

    let settings = resolve_settings(args, &config, config_dir.as_deref())?;
    info!("settings: {:?}", settings);

    let table = load_responses(&settings.input).context(LoadSnafu {})?;

    let questions = match &settings.questions {
        Some(qs) => qs.clone(),
        None => default_questions(
            &table,
            &settings.multi_select,
            &settings.multi_select_delimiter,
        ),
    };

    let summary = summarize(&table, &questions, &settings.rules);
    for w in summary.warnings.iter() {
        warn!("{}: section left out of the report", w);
    }

    let raw = if settings.report.include_raw_data {
        Some(&table)
    } else {
        None
    };
    report_writer::write_report(&summary, raw, &settings.report).context(WriteSnafu {})?;

    let result_js = build_summary_js(&settings.report, &summary);

    if let Some(out) = &settings.json_out {
        write_json_summary(out, &result_js).context(WriteSnafu {})?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference) = &settings.reference {
        check_reference(reference, &result_js)?;
    }

    Ok(())
}
