mod config;
pub mod builder;
pub mod manual;

use log::{debug, info, warn};

use std::{collections::HashMap, hash::Hash};

pub use crate::config::*;

// **** Private structures ****

/// Counts the members of each group, remembering the order in which the
/// groups were first seen.
struct Counter<K> {
    positions: HashMap<K, usize>,
    groups: Vec<(K, u64)>,
}

impl<K: Eq + Hash + Clone> Counter<K> {
    fn new() -> Counter<K> {
        Counter {
            positions: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn add(&mut self, key: &K) {
        match self.positions.get(key) {
            Some(pos) => self.groups[*pos].1 += 1,
            None => {
                self.positions.insert(key.clone(), self.groups.len());
                self.groups.push((key.clone(), 1));
            }
        }
    }

    /// The groups by decreasing count. The sort is stable: equal counts stay
    /// in first-seen order.
    fn into_sorted(self) -> Vec<(K, u64)> {
        let mut groups = self.groups;
        groups.sort_by(|a, b| b.1.cmp(&a.1));
        groups
    }
}

/// Labels the counted groups. If a respondent actually typed the no-answer
/// label, the group of missing answers gets a distinct label.
fn label_entries(
    question: &str,
    groups: Vec<(Answer, u64)>,
    rules: &SummaryRules,
) -> Vec<(String, u64)> {
    let label = rules.no_answer_label.as_str();
    let has_missing = groups.iter().any(|(a, _)| *a == Answer::NoAnswer);
    let typed = groups.iter().any(|(a, _)| a.as_value() == Some(label));
    let no_answer_label = if has_missing && typed {
        let renamed = format!("{} (empty)", label);
        warn!(
            "{:?}: {:?} is both an answer and the no-answer label, missing answers are labeled {:?}",
            question, label, renamed
        );
        renamed
    } else {
        label.to_string()
    };
    groups
        .into_iter()
        .map(|(a, c)| match a {
            Answer::Value(s) => (s, c),
            Answer::NoAnswer => (no_answer_label.clone(), c),
        })
        .collect()
}

/// Splits the content of a multi-select cell into its distinct options.
///
/// Options are trimmed, empty options are dropped and an option repeated in
/// the same cell is only returned once.
pub fn split_options(cell: &str, delimiter: &str) -> Vec<String> {
    let tokens: Vec<&str> = if delimiter.is_empty() {
        vec![cell]
    } else {
        cell.split(delimiter).collect()
    };
    let mut res: Vec<String> = Vec::new();
    for t in tokens {
        let t = t.trim();
        if !t.is_empty() && !res.iter().any(|x| x == t) {
            res.push(t.to_string());
        }
    }
    res
}

/// The questions summarized when none are configured: every column of the
/// table in export order.
///
/// The columns listed in `multi_select` are split with `delimiter`, all the
/// other ones are treated as single choice questions. Listed columns that are
/// not in the table are kept at the end, so that [summarize] reports them.
pub fn default_questions(
    table: &ResponseTable,
    multi_select: &[String],
    delimiter: &str,
) -> Vec<QuestionSpec> {
    let multi = |q: &String| QuestionSpec::MultiSelect {
        question: q.clone(),
        delimiter: delimiter.to_string(),
    };
    let mut questions: Vec<QuestionSpec> = table
        .questions()
        .iter()
        .map(|q| {
            if multi_select.contains(q) {
                multi(q)
            } else {
                QuestionSpec::SingleChoice { question: q.clone() }
            }
        })
        .collect();
    for ms in multi_select {
        if table.column_index(ms).is_none() {
            debug!("default_questions: multi-select question {:?} not in the table", ms);
            questions.push(multi(ms));
        }
    }
    questions
}

/// Counts the answers of a single choice question.
///
/// Missing answers are counted in their own group, so the counts always add
/// up to the number of respondents. Returns None if the question is not a
/// column of the table.
pub fn tally_single_choice(
    table: &ResponseTable,
    question: &str,
    rules: &SummaryRules,
) -> Option<FrequencyTally> {
    let mut counter: Counter<Answer> = Counter::new();
    for answer in table.column(question)? {
        counter.add(answer);
    }
    let entries = label_entries(question, counter.into_sorted(), rules);
    Some(FrequencyTally {
        question: question.to_string(),
        kind: TallyKind::SingleChoice,
        entries,
    })
}

/// Counts the options selected in a multi-select question.
///
/// A respondent adds one count to every option found in their cell. A cell
/// with no option at all counts as a missing answer.
pub fn tally_multi_select(
    table: &ResponseTable,
    question: &str,
    delimiter: &str,
    rules: &SummaryRules,
) -> Option<FrequencyTally> {
    let mut counter: Counter<Answer> = Counter::new();
    for (idx, answer) in table.column(question)?.enumerate() {
        let options = match answer {
            Answer::Value(s) => split_options(s, delimiter),
            Answer::NoAnswer => Vec::new(),
        };
        debug!(
            "tally_multi_select: {:?} row {}: {:?}",
            question, idx, options
        );
        if options.is_empty() {
            counter.add(&Answer::NoAnswer);
        }
        for opt in options {
            counter.add(&Answer::Value(opt));
        }
    }
    let entries = label_entries(question, counter.into_sorted(), rules);
    Some(FrequencyTally {
        question: question.to_string(),
        kind: TallyKind::MultiSelect,
        entries,
    })
}

/// The non-empty answers of a free text question, in row order.
pub fn collect_freeform(table: &ResponseTable, question: &str) -> Option<FreeformResponses> {
    let responses = table
        .column(question)?
        .filter_map(|a| a.as_value().map(|s| s.to_string()))
        .collect();
    Some(FreeformResponses {
        question: question.to_string(),
        responses,
    })
}

/// Cross-tabulates the columns of a grid question against its options.
///
/// Columns that are not in the table are reported in the warnings and left
/// out. If no column is found, no grid is returned.
pub fn tally_grid(
    table: &ResponseTable,
    title: &str,
    columns: &[String],
    options: &[String],
) -> (Option<GridTally>, Vec<SchemaWarning>) {
    let mut warnings: Vec<SchemaWarning> = Vec::new();
    let mut rows: Vec<GridRow> = Vec::new();
    for column in columns {
        let answers = match table.column(column) {
            Some(x) => x,
            None => {
                warnings.push(SchemaWarning::MissingGridColumn {
                    title: title.to_string(),
                    column: column.clone(),
                });
                continue;
            }
        };
        let mut row = GridRow {
            column: column.clone(),
            counts: vec![0; options.len()],
            other: 0,
            no_answer: 0,
        };
        for answer in answers {
            match answer {
                Answer::NoAnswer => row.no_answer += 1,
                Answer::Value(s) => match options.iter().position(|o| o == s) {
                    Some(pos) => row.counts[pos] += 1,
                    None => {
                        debug!(
                            "tally_grid: {:?}: value {:?} is not one of the options",
                            column, s
                        );
                        row.other += 1;
                    }
                },
            }
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return (None, warnings);
    }
    let grid = GridTally {
        title: title.to_string(),
        options: options.to_vec(),
        rows,
    };
    (Some(grid), warnings)
}

/// Summarizes all the questions, in the given order.
///
/// Questions that cannot be found in the table are skipped and reported in
/// the warnings of the summary. This function does not fail: an empty table
/// simply yields empty tallies.
///
/// Arguments:
/// * `table` the survey responses
/// * `questions` the questions to summarize, see [default_questions] to summarize every column
/// * `rules` the rules for labeling and filtering
pub fn summarize(
    table: &ResponseTable,
    questions: &[QuestionSpec],
    rules: &SummaryRules,
) -> Summary {
    info!(
        "Summarizing {:?} questions for {:?} respondents",
        questions.len(),
        table.num_respondents()
    );
    let mut sections: Vec<Section> = Vec::new();
    let mut warnings: Vec<SchemaWarning> = Vec::new();

    for spec in questions.iter() {
        let section: Option<Section> = match spec {
            QuestionSpec::SingleChoice { question } => {
                tally_single_choice(table, question, rules).map(Section::Tally)
            }
            QuestionSpec::MultiSelect {
                question,
                delimiter,
            } => tally_multi_select(table, question, delimiter, rules).map(Section::Tally),
            QuestionSpec::Freeform { question } => {
                collect_freeform(table, question).map(Section::Freeform)
            }
            QuestionSpec::Grid {
                title,
                columns,
                options,
            } => {
                let (grid, mut grid_warnings) = tally_grid(table, title, columns, options);
                for w in grid_warnings.iter() {
                    warn!("summarize: {}", w);
                }
                warnings.append(&mut grid_warnings);
                grid.map(Section::Grid)
            }
        };

        match section {
            Some(s) if s.is_empty() && !rules.keep_empty_sections => {
                info!("summarize: {:?}: empty section dropped", s.title());
            }
            Some(s) => {
                log_section(&s);
                sections.push(s);
            }
            // Grids report their own missing columns.
            None if matches!(spec, QuestionSpec::Grid { .. }) => {}
            None => {
                let w = SchemaWarning::MissingQuestion {
                    question: spec.title().to_string(),
                };
                warn!("summarize: {}, skipping it", w);
                warnings.push(w);
            }
        }
    }

    Summary {
        respondents: table.num_respondents() as u64,
        sections,
        warnings,
    }
}

fn log_section(section: &Section) {
    match section {
        Section::Tally(t) => {
            info!("{} ({} answers)", t.question, t.total());
            for (label, count) in t.entries.iter() {
                info!("{:>8} {}", count, label);
            }
        }
        Section::Grid(g) => {
            info!("{} (grid, {} columns)", g.title, g.rows.len());
            for r in g.rows.iter() {
                info!("{:>8?} {}", r.counts, r.column);
            }
        }
        Section::Freeform(f) => {
            info!("{} ({} responses)", f.question, f.responses.len());
        }
    }
}
