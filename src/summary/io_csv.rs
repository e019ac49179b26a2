// Primitives for reading CSV exports.

use crate::summary::{io_common::assemble_table, *};

/// Reads a CSV export: the first line holds the questions, every other line
/// is one respondent.
pub fn read_csv_responses(path: &str, delimiter: u8) -> LoadResult<ResponseTable> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;
    let mut records = rdr.into_records();

    let first_line: usize = 1;
    let header_record = records
        .next()
        .context(MissingHeaderSnafu { path })?
        .context(ReadingCsvLineSnafu {
            path,
            lineno: first_line,
        })?;
    let header: Vec<String> = header_record
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            // Exports from spreadsheet tools often start with a byte order mark.
            if idx == 0 {
                s.trim_start_matches('\u{feff}').to_string()
            } else {
                s.to_string()
            }
        })
        .collect();
    debug!("read_csv_responses: header: {:?}", header);

    let mut rows: Vec<Vec<Answer>> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(ReadingCsvLineSnafu { path, lineno })?;
        debug!("read_csv_responses: lineno: {:?} row: {:?}", lineno, line);
        rows.push(line.iter().map(Answer::from_raw).collect());
    }
    assemble_table(path, &header, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let p = dir.path().join(name);
        let mut f = std::fs::File::create(&p).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        p.display().to_string()
    }

    #[test]
    fn read_google_forms_export() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_file(
            &dir,
            "responses.csv",
            "\u{feff}Timestamp,Color,Pets\n\
             2022/10/01 10:00:00,Red,\"Cat;Dog\"\n\
             2022/10/01 10:05:00,,Dog\n\
             2022/10/01 10:09:00,Blue\n",
        );
        let table = read_csv_responses(&p, b',').unwrap();
        assert_eq!(table.questions(), &["Timestamp", "Color", "Pets"]);
        assert_eq!(table.num_respondents(), 3);
        assert_eq!(table.rows()[0][2], Answer::Value("Cat;Dog".to_string()));
        assert_eq!(table.rows()[1][1], Answer::NoAnswer);
        assert_eq!(table.rows()[2][2], Answer::NoAnswer);
    }

    #[test]
    fn custom_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_file(&dir, "responses.csv", "A;B\n1;2\n");
        let table = read_csv_responses(&p, b';').unwrap();
        assert_eq!(table.questions(), &["A", "B"]);
        assert_eq!(table.rows()[0][1], Answer::Value("2".to_string()));
    }

    #[test]
    fn empty_file_has_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_file(&dir, "empty.csv", "");
        assert!(matches!(
            read_csv_responses(&p, b','),
            Err(LoadError::MissingHeader { .. })
        ));
    }

    #[test]
    fn header_only() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_file(&dir, "header.csv", "Color,Age\n");
        let table = read_csv_responses(&p, b',').unwrap();
        assert_eq!(table.num_respondents(), 0);
    }

    #[test]
    fn row_longer_than_header() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_file(&dir, "long.csv", "A\n1,2\n");
        assert!(matches!(
            read_csv_responses(&p, b','),
            Err(LoadError::InvalidTable { .. })
        ));
    }
}
