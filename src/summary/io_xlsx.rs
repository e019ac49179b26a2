use calamine::DataType;

use crate::summary::{io_common::assemble_table, *};

// Timestamp columns of Microsoft Forms exports. Their number format is not
// always recognized as a date, so their numbers are read as dates.
const FORM_TIME_COLUMNS: [&str; 3] = ["Start time", "Completion time", "Last modified time"];

/// Reads an Excel export: the first row of the worksheet holds the questions.
pub fn read_xlsx_responses(
    path: &str,
    worksheet_name: &Option<String>,
) -> LoadResult<ResponseTable> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(MissingHeaderSnafu { path })?;
    let header: Vec<String> = header_row
        .iter()
        .map(|c| match cell_to_answer(c) {
            Answer::Value(s) => s,
            Answer::NoAnswer => "".to_string(),
        })
        .collect();
    debug!("read_xlsx_responses: header: {:?}", header);
    let time_columns: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| FORM_TIME_COLUMNS.contains(&h.trim()))
        .map(|(idx, _)| idx)
        .collect();

    let mut rows: Vec<Vec<Answer>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        debug!("read_xlsx_responses: idx: {:?} row: {:?}", idx, row);
        let answers = row
            .iter()
            .enumerate()
            .map(|(col, cell)| match cell {
                DataType::Float(_) | DataType::Int(_) if time_columns.contains(&col) => {
                    datetime_text(cell).map_or_else(|| cell_to_answer(cell), Answer::Value)
                }
                _ => cell_to_answer(cell),
            })
            .collect();
        rows.push(answers);
    }
    assemble_table(path, &header, rows)
}

/// Renders a cell as an answer. Numbers that hold an integer are written
/// without decimals, dates and times as `YYYY-MM-DD HH:MM:SS`.
pub fn cell_to_answer(cell: &DataType) -> Answer {
    match cell {
        DataType::Empty => Answer::NoAnswer,
        DataType::String(s) => Answer::from_raw(s),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            Answer::Value(format!("{}", *f as i64))
        }
        DataType::Float(f) => Answer::Value(f.to_string()),
        DataType::Int(i) => Answer::Value(i.to_string()),
        DataType::Bool(b) => Answer::Value(b.to_string()),
        DataType::DateTime(f) => match datetime_text(cell) {
            Some(s) => Answer::Value(s),
            None => {
                warn!("cell_to_answer: date out of range {}", f);
                Answer::Value(f.to_string())
            }
        },
        DataType::Error(e) => {
            warn!("cell_to_answer: error cell {:?}", e);
            Answer::Value(format!("{:?}", e))
        }
        #[allow(unreachable_patterns)]
        _ => Answer::Value(format!("{:?}", cell)),
    }
}

/// A date cell as `YYYY-MM-DD HH:MM:SS`, rounded to the closest second.
fn datetime_text(cell: &DataType) -> Option<String> {
    let dt = cell.as_datetime()?;
    Some(
        (dt + chrono::Duration::milliseconds(500))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )
}

fn get_range(path: &str, worksheet_name_o: &Option<String>) -> LoadResult<calamine::Range<DataType>> {
    debug!(
        "read_xlsx_responses: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name,
                path,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyWorkbookSnafu { path }.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_xlsx_responses: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            [(worksheet_name, wrange), ..] => {
                warn!(
                    "{} has {} worksheets, reading the first one ({:?}). Use --excel-worksheet-name to pick another one.",
                    path,
                    all_worksheets.len(),
                    worksheet_name
                );
                Ok(wrange.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Format, Workbook};

    fn write_export(path: &std::path::Path, sheets: &[&str]) {
        let mut workbook = Workbook::new();
        for name in sheets {
            let ws = workbook.add_worksheet();
            ws.set_name(*name).unwrap();
            ws.write_string(0, 0, "Color").unwrap();
            ws.write_string(0, 1, "Age").unwrap();
            ws.write_string(1, 0, "Red").unwrap();
            ws.write_number(1, 1, 30).unwrap();
            ws.write_string(2, 0, "Blue").unwrap();
            ws.write_string(3, 1, "41").unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn read_single_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("export.xlsx");
        write_export(&p, &["Form1"]);
        let table = read_xlsx_responses(&p.display().to_string(), &None).unwrap();
        assert_eq!(table.questions(), &["Color", "Age"]);
        assert_eq!(table.num_respondents(), 3);
        assert_eq!(table.rows()[0][1], Answer::Value("30".to_string()));
        assert_eq!(table.rows()[1][1], Answer::NoAnswer);
        assert_eq!(table.rows()[2][0], Answer::NoAnswer);
    }

    #[test]
    fn read_named_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("export.xlsx");
        write_export(&p, &["Form1", "Form2"]);
        let path = p.display().to_string();
        let table = read_xlsx_responses(&path, &Some("Form2".to_string())).unwrap();
        assert_eq!(table.num_respondents(), 3);
        assert!(matches!(
            read_xlsx_responses(&path, &Some("Nope".to_string())),
            Err(LoadError::MissingWorksheet { .. })
        ));
        // Several worksheets and no name: the first one is used.
        assert!(read_xlsx_responses(&path, &None).is_ok());
    }

    #[test]
    fn not_an_excel_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("export.xlsx");
        std::fs::write(&p, "Color,Age\n").unwrap();
        assert!(matches!(
            read_xlsx_responses(&p.display().to_string(), &None),
            Err(LoadError::OpeningExcel { .. })
        ));
    }

    #[test]
    fn dates_as_text() {
        // 2022-10-03 09:12:44, as stored by Excel
        assert_eq!(
            cell_to_answer(&DataType::DateTime(44837.38384259259)),
            Answer::Value("2022-10-03 09:12:44".to_string())
        );
        assert_eq!(
            cell_to_answer(&DataType::DateTime(44837.5)),
            Answer::Value("2022-10-03 12:00:00".to_string())
        );
    }

    #[test]
    fn read_form_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("export.xlsx");
        let mut workbook = Workbook::new();
        let time_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let ws = workbook.add_worksheet();
        ws.write_string(0, 0, "Start time").unwrap();
        ws.write_string(0, 1, "Birth date").unwrap();
        ws.write_string(0, 2, "Score").unwrap();
        ws.write_number_with_format(1, 0, 44837.38384259259, &time_format)
            .unwrap();
        ws.write_number_with_format(1, 1, 44837.0, &date_format)
            .unwrap();
        ws.write_number(1, 2, 2.5).unwrap();
        workbook.save(&p).unwrap();

        let table = read_xlsx_responses(&p.display().to_string(), &None).unwrap();
        assert_eq!(
            table.rows()[0],
            vec![
                Answer::Value("2022-10-03 09:12:44".to_string()),
                Answer::Value("2022-10-03 00:00:00".to_string()),
                Answer::Value("2.5".to_string()),
            ]
        );
    }

    #[test]
    fn numbers_as_text() {
        assert_eq!(
            cell_to_answer(&DataType::Float(3.0)),
            Answer::Value("3".to_string())
        );
        assert_eq!(
            cell_to_answer(&DataType::Float(2.5)),
            Answer::Value("2.5".to_string())
        );
        assert_eq!(
            cell_to_answer(&DataType::String("  ".to_string())),
            Answer::NoAnswer
        );
    }
}
