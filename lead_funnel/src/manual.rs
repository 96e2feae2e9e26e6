/*!

This is the long-form manual for `lead_funnel` and `funnelviz`.

## Input

The input is a spreadsheet (`xlsx`) or a `csv` file with one row per group of leads.
Three columns are read, all the others are ignored:
* `ST_Program`: the name of the program
* `LeadStatus`: the current status of the leads
* `GroupTotal`: how many leads of this program are in this status

The names of the columns can be changed in the configuration (`programColumn`,
`statusColumn`, `totalColumn`). Several rows may have the same program and status, they
are added together. The total column must only contain numbers (or be empty).

## Stages

A lead that is registered has been through all the earlier steps. The stages of the
funnel are therefore *inclusive*: each stage counts the leads that reached at least
this stage.

| Stage | Statuses |
|---|---|
| `PRE_EVAL_inclusive` | all the statuses below |
| `MID_EVAL_inclusive` | all but `PRE-EVAL` |
| `MQL_inclusive` | all but `PRE-EVAL`, `MID-EVAL` |
| `SQL_inclusive` | all but `PRE-EVAL`, `MID-EVAL`, `MQL` |
| `APPLICATION_IN_PROGRESS_inclusive` | `APPLICATION IN-PROGRESS`, `APPLIED`, `APPLICATION CANCELLED`, `APPLICATION WITHDRAWN`, `ADMITTED`, `ADMITTED/ACCEPT`, `ADMITTED/DECLINE`, `ADMITTED/DEFER`, `ADMITTED/WITHDRAW`, `REGISTERED` |
| `APPLIED_inclusive` | `APPLIED`, `ADMITTED`, `ADMITTED/ACCEPT`, `ADMITTED/DECLINE`, `ADMITTED/DEFER`, `ADMITTED/WITHDRAW`, `REGISTERED` |
| `ADMITTED_inclusive` | `ADMITTED`, `ADMITTED/ACCEPT`, `ADMITTED/DECLINE`, `ADMITTED/DEFER`, `ADMITTED/WITHDRAW`, `REGISTERED` |
| `ADMITTED_ACCEPT_inclusive` | `ADMITTED/ACCEPT`, `REGISTERED` |
| `REGISTERED_inclusive` | `REGISTERED` |

Cancelled and withdrawn applications count up to the application stage, not after.
Any other status is ignored. Run with `--report-unknown` to list them.

Each stage is summed on its own, so a funnel is not guaranteed to be decreasing if the
input is unusual (negative totals for instance).

## Funnel charts

Each stage is a trapezoid. The trapezoids narrow linearly from `maxWidth` at the top of
the first stage to `minWidth` at the bottom of the last stage, and each one is then
scaled by its count relative to the largest count. A stage with half the leads of the
largest one is therefore half as wide as the plain taper would draw it.

The percentage above each stage is the conversion from the previous stage. It is not
drawn when the previous stage is empty.

## Configuration

The options of the command line can also be stored in a JSON file, except `--verbose`.
The command line takes precedence over the file.

```json
{
  "outputSettings": {
    "outputDirectory": "charts",
    "chart": "both",
    "includeTotal": true,
    "summaryPath": "summary.json",
    "referencePath": "expected_summary.json",
    "reportUnknown": true
  },
  "inputSource": {
    "provider": "xlsx",
    "filePath": "leads.xlsx",
    "excelWorksheetName": "Sheet1"
  },
  "layout": {
    "maxWidth": 8,
    "minWidth": 2
  }
}
```

The paths of the input file, the summary and the reference summary are relative to the
configuration file. `--config`, `--input`, `--input-type` and `--excel-worksheet-name`
map to `inputSource`; the column names are only set in the file, with `programColumn`,
`statusColumn` and `totalColumn`.

*/
