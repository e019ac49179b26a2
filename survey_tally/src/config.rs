// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The label used for the group of respondents who did not answer.
pub const NO_ANSWER_LABEL: &str = "<no answer>";

/// The content of a single cell of the survey export.
///
/// A missing answer is kept as its own marker so that it is never mixed
/// up with an answer whose text happens to look empty.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Answer {
    /// A non-empty answer, with the surrounding whitespace removed.
    Value(String),
    /// The respondent left this question empty.
    NoAnswer,
}

impl Answer {
    /// Interprets the raw text of a cell.
    pub fn from_raw(raw: &str) -> Answer {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Answer::NoAnswer
        } else {
            Answer::Value(trimmed.to_string())
        }
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            Answer::Value(s) => Some(s.as_str()),
            Answer::NoAnswer => None,
        }
    }
}

/// The loaded survey data.
///
/// Rows are respondents and columns are questions, in the order of the export.
/// Every row has exactly one answer per question.
///
/// Use [crate::builder::TableBuilder] to construct one.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResponseTable {
    pub(crate) questions: Vec<String>,
    pub(crate) rows: Vec<Vec<Answer>>,
}

impl ResponseTable {
    /// The question texts, in export order.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn rows(&self) -> &[Vec<Answer>] {
        &self.rows
    }

    pub fn num_respondents(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, question: &str) -> Option<usize> {
        self.questions.iter().position(|q| q == question)
    }

    /// All the answers to one question, in row order.
    pub fn column(&self, question: &str) -> Option<impl Iterator<Item = &Answer> + '_> {
        let idx = self.column_index(question)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}

/// Describes how one question should be summarized.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum QuestionSpec {
    /// Each respondent picks at most one answer (radio button, yes/no).
    SingleChoice { question: String },
    /// A cell may hold several options, joined with the delimiter.
    /// Google Forms uses `;` for checkbox questions.
    MultiSelect { question: String, delimiter: String },
    /// Free text. The responses are listed, not counted.
    Freeform { question: String },
    /// A multiple choice grid: every column is one row of the grid and
    /// every respondent picks one of the options for each of them.
    Grid {
        title: String,
        columns: Vec<String>,
        options: Vec<String>,
    },
}

impl QuestionSpec {
    /// The title of the section produced for this question.
    pub fn title(&self) -> &str {
        match self {
            QuestionSpec::SingleChoice { question }
            | QuestionSpec::MultiSelect { question, .. }
            | QuestionSpec::Freeform { question } => question.as_str(),
            QuestionSpec::Grid { title, .. } => title.as_str(),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SummaryRules {
    /// The label of the group collecting the missing answers.
    pub no_answer_label: String,
    /// If false, sections without a single entry are dropped from the summary.
    pub keep_empty_sections: bool,
}

impl SummaryRules {
    pub fn default_rules() -> SummaryRules {
        SummaryRules {
            no_answer_label: NO_ANSWER_LABEL.to_string(),
            keep_empty_sections: true,
        }
    }
}

impl Default for SummaryRules {
    fn default() -> Self {
        SummaryRules::default_rules()
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TallyKind {
    SingleChoice,
    MultiSelect,
}

/// The frequency of each distinct answer to one question.
///
/// Entries are sorted by decreasing count. Entries with the same count keep
/// the order in which the answers were first seen in the table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FrequencyTally {
    pub question: String,
    pub kind: TallyKind,
    pub entries: Vec<(String, u64)>,
}

impl FrequencyTally {
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| *c).sum()
    }

    pub fn count_of(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
    }
}

/// One row of a grid: the counts of a single column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GridRow {
    pub column: String,
    /// In the same order as the options of the grid.
    pub counts: Vec<u64>,
    /// Answers that are not one of the options.
    pub other: u64,
    pub no_answer: u64,
}

impl GridRow {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.other + self.no_answer
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GridTally {
    pub title: String,
    pub options: Vec<String>,
    pub rows: Vec<GridRow>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FreeformResponses {
    pub question: String,
    pub responses: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Section {
    Tally(FrequencyTally),
    Grid(GridTally),
    Freeform(FreeformResponses),
}

impl Section {
    pub fn title(&self) -> &str {
        match self {
            Section::Tally(t) => t.question.as_str(),
            Section::Grid(g) => g.title.as_str(),
            Section::Freeform(f) => f.question.as_str(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Section::Tally(t) => t.entries.is_empty(),
            Section::Grid(g) => g.rows.is_empty(),
            Section::Freeform(f) => f.responses.is_empty(),
        }
    }
}

/// A configured question that could not be summarized.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SchemaWarning {
    MissingQuestion { question: String },
    MissingGridColumn { title: String, column: String },
}

impl Display for SchemaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaWarning::MissingQuestion { question } => {
                write!(f, "question {:?} not found in the responses", question)
            }
            SchemaWarning::MissingGridColumn { title, column } => {
                write!(
                    f,
                    "column {:?} of grid {:?} not found in the responses",
                    column, title
                )
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Summary {
    pub respondents: u64,
    pub sections: Vec<Section>,
    pub warnings: Vec<SchemaWarning>,
}

/// Errors that prevent a table from being built.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    EmptyHeader,
    RowTooLong {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::EmptyHeader => write!(f, "the header row has no question"),
            TallyErrors::RowTooLong {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {} has {} cells but the header only has {} questions",
                row, found, expected
            ),
        }
    }
}
