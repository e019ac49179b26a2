use std::path::{Path, PathBuf};

use crate::summary::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// The report written when no output is configured: `<input stem>_summary.xlsx`
/// in the directory of the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "survey".to_string());
    input.with_file_name(format!("{}_summary.xlsx", stem))
}

/// Paths found in a configuration file are relative to that file.
pub fn resolve_path(root: Option<&Path>, path: &str) -> PathBuf {
    let p = Path::new(path);
    match root {
        Some(r) if p.is_relative() => r.join(p),
        _ => p.to_path_buf(),
    }
}

/// Assembles a response table from the header row and the data rows of an export.
pub fn assemble_table<I>(path: &str, header: &[String], rows: I) -> LoadResult<ResponseTable>
where
    I: IntoIterator<Item = Vec<Answer>>,
{
    ensure!(
        header.iter().any(|h| !h.trim().is_empty()),
        MissingHeaderSnafu { path }
    );
    let mut builder = TableBuilder::new(header).context(InvalidTableSnafu { path })?;
    for row in rows {
        builder.add_row(row).context(InvalidTableSnafu { path })?;
    }
    let table = builder.build();
    info!(
        "Read {} respondents and {} questions from {}",
        table.num_respondents(),
        table.questions().len(),
        simplify_file_name(path)
    );
    Ok(table)
}
