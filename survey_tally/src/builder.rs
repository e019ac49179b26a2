use log::{debug, warn};

pub use crate::config::*;

/// A builder for assembling a response table row by row.
///
/// ```
/// pub use survey_tally::builder::TableBuilder;
/// # use survey_tally::TallyErrors;
///
/// let mut builder = TableBuilder::new(&["Color".to_string(), "Age".to_string()])?;
///
/// builder.add_row_simple(&["Red".to_string(), "".to_string()])?;
/// builder.add_row_simple(&["Blue".to_string(), "30".to_string()])?;
///
/// let table = builder.build();
/// assert_eq!(table.num_respondents(), 2);
/// # Ok::<(), TallyErrors>(())
/// ```
pub struct TableBuilder {
    pub(crate) _questions: Vec<String>,
    pub(crate) _rows: Vec<Vec<Answer>>,
}

impl TableBuilder {
    /// Starts a table from the header row of the export.
    ///
    /// Question texts are trimmed. Questions that appear more than once get a
    /// ` (2)`, ` (3)`, ... suffix so that each column can still be addressed.
    pub fn new(header: &[String]) -> Result<TableBuilder, TallyErrors> {
        if header.is_empty() {
            return Err(TallyErrors::EmptyHeader);
        }
        let mut questions: Vec<String> = Vec::with_capacity(header.len());
        for (idx, raw) in header.iter().enumerate() {
            let base = raw.trim().to_string();
            let mut name = base.clone();
            let mut suffix = 2;
            while questions.contains(&name) {
                name = format!("{} ({})", base, suffix);
                suffix += 1;
            }
            if name != base {
                warn!(
                    "TableBuilder: duplicate question {:?} in column {}, renamed to {:?}",
                    base,
                    idx + 1,
                    name
                );
            }
            questions.push(name);
        }
        debug!("TableBuilder: questions: {:?}", questions);
        Ok(TableBuilder {
            _questions: questions,
            _rows: Vec::new(),
        })
    }

    pub fn num_questions(&self) -> usize {
        self._questions.len()
    }

    /// Adds a row of raw cell contents.
    ///
    /// Empty cells are recorded as missing answers.
    pub fn add_row_simple(&mut self, cells: &[String]) -> Result<(), TallyErrors> {
        let answers: Vec<Answer> = cells.iter().map(|s| Answer::from_raw(s)).collect();
        self.add_row(answers)
    }

    /// Adds a row of answers.
    ///
    /// A row shorter than the header is completed with missing answers, a
    /// longer row is rejected unless the extra cells are all empty.
    pub fn add_row(&mut self, mut answers: Vec<Answer>) -> Result<(), TallyErrors> {
        let expected = self._questions.len();
        if answers.len() > expected {
            if answers[expected..].iter().any(|a| *a != Answer::NoAnswer) {
                return Err(TallyErrors::RowTooLong {
                    row: self._rows.len() + 1,
                    expected,
                    found: answers.len(),
                });
            }
            answers.truncate(expected);
        }
        answers.resize(expected, Answer::NoAnswer);
        self._rows.push(answers);
        Ok(())
    }

    pub fn build(self) -> ResponseTable {
        ResponseTable {
            questions: self._questions,
            rows: self._rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: &str) -> String {
        x.to_string()
    }

    #[test]
    fn empty_header_is_rejected() {
        assert_eq!(TableBuilder::new(&[]).err(), Some(TallyErrors::EmptyHeader));
    }

    #[test]
    fn duplicate_questions_are_renamed() {
        let b = TableBuilder::new(&[s("Name"), s("Name "), s("Age"), s("Name")]).unwrap();
        let table = b.build();
        assert_eq!(
            table.questions(),
            &[s("Name"), s("Name (2)"), s("Age"), s("Name (3)")]
        );
    }

    #[test]
    fn short_rows_are_padded() {
        let mut b = TableBuilder::new(&[s("A"), s("B"), s("C")]).unwrap();
        b.add_row_simple(&[s("x")]).unwrap();
        let table = b.build();
        assert_eq!(
            table.rows()[0],
            vec![Answer::Value(s("x")), Answer::NoAnswer, Answer::NoAnswer]
        );
    }

    #[test]
    fn long_rows() {
        let mut b = TableBuilder::new(&[s("A")]).unwrap();
        // Trailing empty cells are common in spreadsheet exports.
        b.add_row_simple(&[s("x"), s(""), s(" ")]).unwrap();
        assert_eq!(
            b.add_row_simple(&[s("x"), s("y")]),
            Err(TallyErrors::RowTooLong {
                row: 2,
                expected: 1,
                found: 2
            })
        );
        assert_eq!(b.build().num_respondents(), 1);
    }

    #[test]
    fn blank_cells_are_missing_answers() {
        assert_eq!(Answer::from_raw("  "), Answer::NoAnswer);
        assert_eq!(Answer::from_raw(" Yes "), Answer::Value(s("Yes")));
    }
}
