use crate::args::Args;
use crate::summary::io_common::{default_output_path, resolve_path};
use crate::summary::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MULTI_SELECT_DELIMITER: &str = ";";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    pub title: Option<String>,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
    #[serde(rename = "includeRawData")]
    pub include_raw_data: Option<bool>,
    pub charts: Option<bool>,
    #[serde(rename = "keepEmptySections")]
    pub keep_empty_sections: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "csvDelimiter")]
    pub csv_delimiter: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum QuestionConfig {
    #[serde(rename = "singleChoice")]
    SingleChoice { question: String },
    #[serde(rename = "multiSelect")]
    MultiSelect {
        question: String,
        delimiter: Option<String>,
    },
    #[serde(rename = "freeform")]
    Freeform { question: String },
    #[serde(rename = "grid")]
    Grid {
        title: String,
        columns: Vec<String>,
        options: Vec<String>,
    },
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "inputSource", default)]
    pub input_source: InputSource,
    #[serde(rename = "noAnswerLabel")]
    pub no_answer_label: Option<String>,
    #[serde(rename = "multiSelectDelimiter")]
    pub multi_select_delimiter: Option<String>,
    pub questions: Option<Vec<QuestionConfig>>,
}

/// The supported formats of survey exports.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Csv,
    Xlsx,
}

impl Provider {
    pub fn from_name(name: &str) -> LoadResult<Provider> {
        match name.to_lowercase().as_str() {
            "csv" => Ok(Provider::Csv),
            "xlsx" | "excel" => Ok(Provider::Xlsx),
            _ => UnknownProviderSnafu { provider: name }.fail(),
        }
    }

    pub fn from_extension(path: &Path) -> Provider {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("xlsx") | Some("xlsm") => Provider::Xlsx,
            _ => Provider::Csv,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct InputSettings {
    pub provider: Provider,
    pub path: PathBuf,
    pub csv_delimiter: u8,
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportSettings {
    pub path: PathBuf,
    pub title: Option<String>,
    pub include_raw_data: bool,
    pub charts: bool,
    pub no_answer_label: String,
}

/// Everything a run needs, once the command line and the configuration file are merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub input: InputSettings,
    pub report: ReportSettings,
    /// None when every column of the export should be summarized.
    pub questions: Option<Vec<QuestionSpec>>,
    pub multi_select: Vec<String>,
    pub multi_select_delimiter: String,
    pub rules: SummaryRules,
    pub json_out: Option<String>,
    pub reference: Option<String>,
}

pub fn read_config(path: &str) -> SummaryResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(&contents).context(ParsingConfigSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

fn csv_delimiter(args: &Args, source: &InputSource) -> SummaryResult<u8> {
    let c: Option<char> = match (args.csv_delimiter, source.csv_delimiter.as_deref()) {
        (Some(c), _) => Some(c),
        (None, Some(s)) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => whatever!("csvDelimiter must be a single character, got {:?}", s),
            }
        }
        (None, None) => None,
    };
    match c {
        None => Ok(b','),
        Some(c) if c.is_ascii() => Ok(c as u8),
        Some(c) => whatever!("the CSV delimiter must be an ASCII character, got {:?}", c),
    }
}

fn question_specs(questions: &[QuestionConfig], delimiter: &str) -> Vec<QuestionSpec> {
    questions
        .iter()
        .map(|q| match q {
            QuestionConfig::SingleChoice { question } => QuestionSpec::SingleChoice {
                question: question.clone(),
            },
            QuestionConfig::MultiSelect {
                question,
                delimiter: d,
            } => QuestionSpec::MultiSelect {
                question: question.clone(),
                delimiter: d.clone().unwrap_or_else(|| delimiter.to_string()),
            },
            QuestionConfig::Freeform { question } => QuestionSpec::Freeform {
                question: question.clone(),
            },
            QuestionConfig::Grid {
                title,
                columns,
                options,
            } => QuestionSpec::Grid {
                title: title.clone(),
                columns: columns.clone(),
                options: options.clone(),
            },
        })
        .collect()
}

/// Merges the command line arguments with the configuration file, if any.
///
/// The command line always takes precedence. Relative paths of the
/// configuration file are resolved against `config_dir`.
pub fn resolve_settings(
    args: &Args,
    config: &SurveyConfig,
    config_dir: Option<&Path>,
) -> SummaryResult<RunSettings> {
    let source = &config.input_source;
    let input_path: PathBuf = match (&args.input, &source.file_path) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => resolve_path(config_dir, p),
        (None, None) => return MissingInputSnafu {}.fail().context(LoadSnafu {}),
    };

    let provider = match args.input_type.as_ref().or(source.provider.as_ref()) {
        Some(name) => Provider::from_name(name).context(LoadSnafu {})?,
        None => Provider::from_extension(&input_path),
    };

    let input = InputSettings {
        provider,
        path: input_path.clone(),
        csv_delimiter: csv_delimiter(args, source)?,
        excel_worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or_else(|| source.excel_worksheet_name.clone()),
    };

    let out = &config.output_settings;
    let no_answer_label = args
        .no_answer_label
        .clone()
        .or_else(|| config.no_answer_label.clone())
        .unwrap_or_else(|| NO_ANSWER_LABEL.to_string());

    let report = ReportSettings {
        path: match (&args.out, &out.output_file) {
            (Some(p), _) => PathBuf::from(p),
            (None, Some(p)) => resolve_path(config_dir, p),
            (None, None) => default_output_path(&input_path),
        },
        title: out.title.clone(),
        include_raw_data: out.include_raw_data.unwrap_or(true),
        charts: out.charts.unwrap_or(true),
        no_answer_label: no_answer_label.clone(),
    };

    let multi_select_delimiter = args
        .delimiter
        .clone()
        .or_else(|| config.multi_select_delimiter.clone())
        .unwrap_or_else(|| DEFAULT_MULTI_SELECT_DELIMITER.to_string());

    let questions = config
        .questions
        .as_ref()
        .map(|qs| question_specs(qs, &multi_select_delimiter));
    if questions.is_some() && !args.multi_select.is_empty() {
        warn!("resolve_settings: questions are listed in the configuration, --multi-select is ignored");
    }

    Ok(RunSettings {
        input,
        report,
        questions,
        multi_select: args.multi_select.clone(),
        multi_select_delimiter,
        rules: SummaryRules {
            no_answer_label,
            keep_empty_sections: out.keep_empty_sections.unwrap_or(true),
        },
        json_out: args.json_out.clone(),
        reference: args.reference.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_input(input: &str) -> Args {
        Args {
            input: Some(input.to_string()),
            ..Args::default()
        }
    }

    #[test]
    fn parse_full_config() {
        let js = r#"{
            "outputSettings": {"title": "Funding", "outputFile": "out.xlsx", "charts": false},
            "inputSource": {"provider": "csv", "filePath": "responses.csv", "csvDelimiter": ";"},
            "multiSelectDelimiter": ",",
            "questions": [
                {"kind": "singleChoice", "question": "Q1"},
                {"kind": "multiSelect", "question": "Q2"},
                {"kind": "multiSelect", "question": "Q3", "delimiter": "|"},
                {"kind": "freeform", "question": "Q4"},
                {"kind": "grid", "title": "G", "columns": ["a", "b"], "options": ["x", "y"]}
            ]
        }"#;
        let config: SurveyConfig = serde_json::from_str(js).unwrap();
        let s = resolve_settings(&Args::default(), &config, Some(Path::new("/surveys"))).unwrap();
        assert_eq!(s.input.path, PathBuf::from("/surveys/responses.csv"));
        assert_eq!(s.input.provider, Provider::Csv);
        assert_eq!(s.input.csv_delimiter, b';');
        assert_eq!(s.report.path, PathBuf::from("/surveys/out.xlsx"));
        assert!(!s.report.charts);
        assert!(s.report.include_raw_data);
        assert_eq!(s.report.title, Some("Funding".to_string()));
        let qs = s.questions.unwrap();
        assert_eq!(qs.len(), 5);
        assert_eq!(
            qs[1],
            QuestionSpec::MultiSelect {
                question: "Q2".to_string(),
                delimiter: ",".to_string()
            }
        );
        assert_eq!(
            qs[2],
            QuestionSpec::MultiSelect {
                question: "Q3".to_string(),
                delimiter: "|".to_string()
            }
        );
    }

    #[test]
    fn drop_empty_sections() {
        let js = r#"{"outputSettings": {"keepEmptySections": false}}"#;
        let config: SurveyConfig = serde_json::from_str(js).unwrap();
        let s = resolve_settings(&args_with_input("a.csv"), &config, None).unwrap();
        assert!(!s.rules.keep_empty_sections);
        assert!(s.rules.no_answer_label == NO_ANSWER_LABEL);
    }

    #[test]
    fn unknown_question_kind() {
        let js = r#"{"questions": [{"kind": "ranking", "question": "Q1"}]}"#;
        assert!(serde_json::from_str::<SurveyConfig>(js).is_err());
    }

    #[test]
    fn command_line_overrides_config() {
        let config = SurveyConfig {
            input_source: InputSource {
                file_path: Some("from_config.csv".to_string()),
                ..InputSource::default()
            },
            no_answer_label: Some("(blank)".to_string()),
            ..SurveyConfig::default()
        };
        let args = Args {
            input: Some("export.xlsx".to_string()),
            out: Some("report.xlsx".to_string()),
            no_answer_label: Some("n/a".to_string()),
            ..Args::default()
        };
        let s = resolve_settings(&args, &config, None).unwrap();
        assert_eq!(s.input.path, PathBuf::from("export.xlsx"));
        assert_eq!(s.input.provider, Provider::Xlsx);
        assert_eq!(s.report.path, PathBuf::from("report.xlsx"));
        assert_eq!(s.rules.no_answer_label, "n/a");
        assert_eq!(s.report.no_answer_label, "n/a");
    }

    #[test]
    fn defaults_without_config() {
        let s = resolve_settings(
            &args_with_input("data/responses.csv"),
            &SurveyConfig::default(),
            None,
        )
        .unwrap();
        assert_eq!(s.input.provider, Provider::Csv);
        assert_eq!(s.input.csv_delimiter, b',');
        assert_eq!(s.report.path, PathBuf::from("data/responses_summary.xlsx"));
        assert_eq!(s.multi_select_delimiter, ";");
        assert_eq!(s.rules, SummaryRules::default_rules());
        assert!(s.questions.is_none());
    }

    #[test]
    fn missing_input_is_a_load_error() {
        let res = resolve_settings(&Args::default(), &SurveyConfig::default(), None);
        assert!(matches!(
            res,
            Err(SummaryError::Load {
                source: LoadError::MissingInput {}
            })
        ));
    }

    #[test]
    fn unknown_provider() {
        let args = Args {
            input_type: Some("ods".to_string()),
            ..args_with_input("a.ods")
        };
        let res = resolve_settings(&args, &SurveyConfig::default(), None);
        assert!(matches!(
            res,
            Err(SummaryError::Load {
                source: LoadError::UnknownProvider { .. }
            })
        ));
    }

    #[test]
    fn bad_csv_delimiter() {
        let config = SurveyConfig {
            input_source: InputSource {
                csv_delimiter: Some("ab".to_string()),
                ..InputSource::default()
            },
            ..SurveyConfig::default()
        };
        assert!(resolve_settings(&args_with_input("a.csv"), &config, None).is_err());
    }
}
