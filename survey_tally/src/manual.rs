/*!

This is the long-form manual for `survey_tally` and the `survey` command.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values, as downloaded from Google Forms ("Download responses (.csv)")
* `xlsx` Excel workbooks, as downloaded from Microsoft Forms or from the Google Sheets linked to a form

The first row must contain the text of each question. Every following row is
one respondent. Empty cells are reported under the `<no answer>` label. If a
respondent typed that label, the empty cells are reported as
`<no answer> (empty)` instead.

### `csv`

```text
Timestamp,Do you support raising state funds?,Who do you represent?: (check all that apply)
2022/10/01 10:00:00,Yes,Resident;Business owner
2022/10/01 10:05:12,No,Resident
2022/10/01 10:07:40,,
```

The field delimiter can be changed with `--csv-delimiter` (for example `;` for
exports made with a French or German locale).

### `xlsx`

The worksheet can be selected with `--excel-worksheet-name`. If it is not
given, the first worksheet is read, with a warning when the workbook has
several.

Date cells are read as `YYYY-MM-DD HH:MM:SS`. The numbers of the `Start time`,
`Completion time` and `Last modified time` columns of Microsoft Forms exports
are always read as dates.

## Question kinds

| kind           | cell content                     | output                                  |
|----------------|----------------------------------|-----------------------------------------|
| `singleChoice` | one answer                       | answer and count, largest count first   |
| `multiSelect`  | several answers, `;` separated   | one count per selected option           |
| `freeform`     | free text                        | the list of non-empty responses         |
| `grid`         | one column per row of the grid   | one row per column, one count per option |

Without a configuration file, every column is a `singleChoice` question, except
the ones passed with `--multi-select`.

For counted questions, answers with the same count keep the order in which they
first appear in the export.

## Configuration

```json
{
  "outputSettings": {
    "title": "Southeast PA funding options",
    "outputFile": "summary.xlsx",
    "includeRawData": true,
    "charts": true,
    "keepEmptySections": true
  },
  "inputSource": {
    "provider": "csv",
    "filePath": "responses.csv"
  },
  "noAnswerLabel": "<no answer>",
  "multiSelectDelimiter": ";",
  "questions": [
    { "kind": "singleChoice", "question": "Do you support raising state funds?" },
    { "kind": "multiSelect", "question": "Who do you represent?: (check all that apply)" },
    { "kind": "freeform", "question": "Is there anything else you would like to share?" },
    {
      "kind": "grid",
      "title": "What kind of improvements would you like to see?",
      "columns": ["New or extended rail lines", "Highway capacity improvements"],
      "options": ["Lowest priority", "Medium priority", "Highest priority"]
    }
  ]
}
```

With `"keepEmptySections": false`, questions without any answer are left out
of the report.

Paths in the configuration file are relative to the directory of the
configuration file. Command line flags take precedence over the configuration.

A configured question that is not in the export is reported as a warning and
left out of the report. The other questions are still summarized.

## Output

The report is an Excel workbook with one worksheet per question kind
(`single_choice`, `multi_select`, `grid`, `freeform_text`) and a `raw_data`
worksheet holding the export itself. Texts longer than the 32,767 characters
an Excel cell can hold are cut, with a warning.

With `--json-out`, the counts are also written in JSON. This file does not
depend on the time of the run and can be passed back with `--reference` to
check that a new run gives the same results.

 */
