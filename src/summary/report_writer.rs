use rust_xlsxwriter::{Chart, ChartType, Color, DocProperties, Format, Workbook, Worksheet};

use crate::summary::config_reader::ReportSettings;
use crate::summary::*;

pub const SINGLE_CHOICE_SHEET: &str = "single_choice";
pub const MULTI_SELECT_SHEET: &str = "multi_select";
pub const GRID_SHEET: &str = "grid";
pub const FREEFORM_SHEET: &str = "freeform_text";
pub const RAW_DATA_SHEET: &str = "raw_data";

// Widths in characters.
const MAX_LABEL_WIDTH: usize = 70;
const MIN_COLUMN_WIDTH: usize = 8;
// Blank rows between two sections of the same worksheet.
const SECTION_GAP: u32 = 2;
const CHART_ROWS: u32 = 16;
// Longest string Excel accepts in a cell.
const MAX_CELL_CHARS: usize = 32_767;

struct Formats {
    prompt: Format,
    header: Format,
}

impl Formats {
    fn new() -> Formats {
        Formats {
            prompt: Format::new()
                .set_italic()
                .set_font_size(14)
                .set_font_color(Color::Blue),
            header: Format::new().set_bold(),
        }
    }
}

/// The part of a text that fits in a cell. Longer texts are cut with a warning.
fn cell_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        None => text,
        Some((end, _)) => {
            warn!(
                "Text of {} characters truncated to {} characters: {:?}...",
                text.chars().count(),
                MAX_CELL_CHARS,
                text.chars().take(40).collect::<String>()
            );
            &text[..end]
        }
    }
}

/// Tracks the widest table cell of every column. Section titles are not
/// tracked: they are allowed to overflow into the next cells.
struct ColumnWidths(Vec<usize>);

impl ColumnWidths {
    fn record(&mut self, col: u16, text: &str) {
        let idx = col as usize;
        if self.0.len() <= idx {
            self.0.resize(idx + 1, MIN_COLUMN_WIDTH);
        }
        let width = text.chars().count().min(MAX_LABEL_WIDTH);
        if width > self.0[idx] {
            self.0[idx] = width;
        }
    }

    fn apply(&self, worksheet: &mut Worksheet) -> Result<(), rust_xlsxwriter::XlsxError> {
        for (idx, width) in self.0.iter().enumerate() {
            worksheet.set_column_width(idx as u16, (*width + 2) as f64)?;
        }
        Ok(())
    }
}

/// One worksheet being filled, section after section.
struct SheetWriter<'a> {
    name: &'static str,
    worksheet: Worksheet,
    formats: &'a Formats,
    widths: ColumnWidths,
    next_row: u32,
    charts: bool,
}

type XResult<T> = Result<T, rust_xlsxwriter::XlsxError>;

impl<'a> SheetWriter<'a> {
    fn new(name: &'static str, formats: &'a Formats, charts: bool) -> XResult<SheetWriter<'a>> {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(name)?;
        Ok(SheetWriter {
            name,
            worksheet,
            formats,
            widths: ColumnWidths(Vec::new()),
            next_row: 0,
            charts,
        })
    }

    fn write_title(&mut self, title: &str) -> XResult<u32> {
        let row = self.next_row;
        self.worksheet
            .write_string_with_format(row, 0, cell_text(title), &self.formats.prompt)?;
        Ok(row)
    }

    fn write_header(&mut self, row: u32, names: &[String]) -> XResult<()> {
        for (col, name) in names.iter().enumerate() {
            let name = cell_text(name);
            self.worksheet
                .write_string_with_format(row, col as u16, name, &self.formats.header)?;
            self.widths.record(col as u16, name);
        }
        Ok(())
    }

    fn write_label(&mut self, row: u32, col: u16, label: &str) -> XResult<()> {
        let label = cell_text(label);
        self.worksheet.write_string(row, col, label)?;
        self.widths.record(col, label);
        Ok(())
    }

    fn write_count(&mut self, row: u32, col: u16, count: u64) -> XResult<()> {
        self.worksheet.write_number(row, col, count as f64)?;
        self.widths.record(col, &count.to_string());
        Ok(())
    }

    /// Moves past a section that used `rows` rows, leaving room for its chart.
    fn end_section(&mut self, first_row: u32, rows: u32, with_chart: bool) {
        let mut used = rows;
        if with_chart && used < CHART_ROWS {
            used = CHART_ROWS;
        }
        self.next_row = first_row + used + SECTION_GAP;
    }

    fn write_tally(&mut self, tally: &FrequencyTally) -> XResult<()> {
        let title_row = self.write_title(&tally.question)?;
        let header_row = title_row + 1;
        self.write_header(header_row, &["answer".to_string(), "count".to_string()])?;
        for (idx, (label, count)) in tally.entries.iter().enumerate() {
            let row = header_row + 1 + idx as u32;
            self.write_label(row, 0, label)?;
            self.write_count(row, 1, *count)?;
        }
        let n = tally.entries.len() as u32;
        let with_chart = self.charts && n > 0;
        if with_chart {
            let mut chart = Chart::new(ChartType::Bar);
            chart
                .add_series()
                .set_categories((self.name, header_row + 1, 0, header_row + n, 0))
                .set_values((self.name, header_row + 1, 1, header_row + n, 1));
            chart.title().set_name(cell_text(&tally.question));
            chart.legend().set_hidden();
            chart.y_axis().set_reverse();
            self.worksheet.insert_chart(title_row, 3, &chart)?;
        }
        self.end_section(title_row, 2 + n, with_chart);
        Ok(())
    }

    fn write_grid(&mut self, grid: &GridTally, no_answer_label: &str) -> XResult<()> {
        let title_row = self.write_title(&grid.title)?;
        let header_row = title_row + 1;
        let has_other = grid.rows.iter().any(|r| r.other > 0);

        let mut header: Vec<String> = vec!["option".to_string()];
        header.extend(grid.options.iter().cloned());
        if has_other {
            header.push("other".to_string());
        }
        header.push(no_answer_label.to_string());
        self.write_header(header_row, &header)?;

        for (idx, grid_row) in grid.rows.iter().enumerate() {
            let row = header_row + 1 + idx as u32;
            self.write_label(row, 0, &grid_row.column)?;
            let mut col: u16 = 1;
            for count in grid_row.counts.iter() {
                self.write_count(row, col, *count)?;
                col += 1;
            }
            if has_other {
                self.write_count(row, col, grid_row.other)?;
                col += 1;
            }
            self.write_count(row, col, grid_row.no_answer)?;
        }

        let n = grid.rows.len() as u32;
        let with_chart = self.charts && n > 0 && !grid.options.is_empty();
        if with_chart {
            let mut chart = Chart::new(ChartType::Column);
            for (idx, option) in grid.options.iter().enumerate() {
                let col = idx as u16 + 1;
                chart
                    .add_series()
                    .set_name(option.as_str())
                    .set_categories((self.name, header_row + 1, 0, header_row + n, 0))
                    .set_values((self.name, header_row + 1, col, header_row + n, col));
            }
            chart.title().set_name(cell_text(&grid.title));
            let chart_col = header.len() as u16 + 1;
            self.worksheet.insert_chart(title_row, chart_col, &chart)?;
        }
        self.end_section(title_row, 2 + n, with_chart);
        Ok(())
    }

    fn write_freeform(&mut self, responses: &FreeformResponses) -> XResult<()> {
        let title_row = self.write_title(&responses.question)?;
        let header_row = title_row + 1;
        self.write_header(header_row, &["response".to_string()])?;
        for (idx, text) in responses.responses.iter().enumerate() {
            self.write_label(header_row + 1 + idx as u32, 0, text)?;
        }
        self.end_section(title_row, 2 + responses.responses.len() as u32, false);
        Ok(())
    }

    fn finish(mut self) -> XResult<Worksheet> {
        self.widths.apply(&mut self.worksheet)?;
        Ok(self.worksheet)
    }
}

fn write_raw_data(table: &ResponseTable, formats: &Formats) -> XResult<Worksheet> {
    let mut sheet = SheetWriter::new(RAW_DATA_SHEET, formats, false)?;
    sheet.write_header(0, table.questions())?;
    for (idx, row) in table.rows().iter().enumerate() {
        let r = idx as u32 + 1;
        for (col, answer) in row.iter().enumerate() {
            if let Answer::Value(s) = answer {
                sheet.write_label(r, col as u16, s)?;
            }
        }
    }
    sheet.worksheet.set_freeze_panes(1, 0)?;
    sheet.finish()
}

/// Which worksheet a section goes to.
fn sheet_of(section: &Section) -> &'static str {
    match section {
        Section::Tally(t) if t.kind == TallyKind::SingleChoice => SINGLE_CHOICE_SHEET,
        Section::Tally(_) => MULTI_SELECT_SHEET,
        Section::Grid(_) => GRID_SHEET,
        Section::Freeform(_) => FREEFORM_SHEET,
    }
}

fn build_workbook(
    summary: &Summary,
    raw: Option<&ResponseTable>,
    settings: &ReportSettings,
) -> XResult<Workbook> {
    let mut workbook = Workbook::new();
    let formats = Formats::new();

    if let Some(title) = &settings.title {
        let properties = DocProperties::new().set_title(title);
        workbook.set_properties(&properties);
    }

    for sheet_name in [
        SINGLE_CHOICE_SHEET,
        MULTI_SELECT_SHEET,
        GRID_SHEET,
        FREEFORM_SHEET,
    ] {
        let sections: Vec<&Section> = summary
            .sections
            .iter()
            .filter(|s| sheet_of(s) == sheet_name)
            .collect();
        if sections.is_empty() {
            continue;
        }
        debug!(
            "build_workbook: {} sections in worksheet {}",
            sections.len(),
            sheet_name
        );
        let mut sheet = SheetWriter::new(sheet_name, &formats, settings.charts)?;
        for section in sections {
            match section {
                Section::Tally(t) => sheet.write_tally(t)?,
                Section::Grid(g) => sheet.write_grid(g, &settings.no_answer_label)?,
                Section::Freeform(f) => sheet.write_freeform(f)?,
            }
        }
        workbook.push_worksheet(sheet.finish()?);
    }

    if let Some(table) = raw {
        workbook.push_worksheet(write_raw_data(table, &formats)?);
    }

    // An empty workbook cannot be opened by Excel.
    if summary.sections.is_empty() && raw.is_none() {
        workbook.add_worksheet().set_name(SINGLE_CHOICE_SHEET)?;
    }
    Ok(workbook)
}

/// Writes the report workbook to the path of the settings.
///
/// `raw` is copied to its own worksheet when given.
pub fn write_report(
    summary: &Summary,
    raw: Option<&ResponseTable>,
    settings: &ReportSettings,
) -> WriteResult<()> {
    let path = settings.path.display().to_string();
    info!("Writing report {:?}", path);
    let mut workbook =
        build_workbook(summary, raw, settings).context(BuildingWorkbookSnafu { path: &path })?;
    workbook
        .save(&settings.path)
        .context(SavingWorkbookSnafu { path: &path })?;
    Ok(())
}
