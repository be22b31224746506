//! The persisted run report and the console summary table.

use crate::record::TestRecord;
use serde::{Deserialize, Serialize};

/// Location of the report inside a run folder.
pub const REPORT_PATH: [&str; 2] = ["results", "report.json"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub model_name: String,
    /// Name of the suite
    pub reclist: String,
    /// Registered test names, in execution order
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub data: Vec<TestRecord>,
}

impl Report {
    pub fn new(
        model_name: impl Into<String>,
        reclist: impl Into<String>,
        tests: Vec<String>,
        data: Vec<TestRecord>,
    ) -> Self {
        Self {
            metadata: ReportMetadata {
                model_name: model_name.into(),
                reclist: reclist.into(),
                tests,
            },
            data,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

/// Render records as a plain-text table with Type, Description and Result
/// columns. Cells may span several lines.
pub fn summary_table(title: &str, records: &[TestRecord]) -> String {
    let header = [
        "Type".to_string(),
        "Description".to_string(),
        "Result".to_string(),
    ];
    let rows: Vec<[String; 3]> = records
        .iter()
        .map(|record| {
            [
                record.name.clone(),
                record.description.clone(),
                record.result.display_value(),
            ]
        })
        .collect();
    let align = [Align::Right, Align::Left, Align::Right];

    let mut widths = [0usize; 3];
    for row in std::iter::once(&header).chain(rows.iter()) {
        for (width, cell) in widths.iter_mut().zip(row) {
            let longest = cell.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            *width = (*width).max(longest);
        }
    }

    let separator = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut out = String::new();
    let total = separator.chars().count();
    let padding = total.saturating_sub(title.chars().count()) / 2;
    out.push_str(&" ".repeat(padding));
    out.push_str(title);
    out.push('\n');

    out.push_str(&separator);
    out.push('\n');
    push_row(&mut out, &header, &widths, &[Align::Left; 3]);
    out.push_str(&separator);
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths, &align);
        out.push_str(&separator);
        out.push('\n');
    }

    out
}

fn push_row(out: &mut String, row: &[String; 3], widths: &[usize; 3], align: &[Align; 3]) {
    let cells: Vec<Vec<&str>> = row.iter().map(|cell| cell.lines().collect()).collect();
    let height = cells.iter().map(|lines| lines.len()).max().unwrap_or(0).max(1);

    for line in 0..height {
        out.push('|');
        for ((lines, width), align) in cells.iter().zip(widths).zip(align) {
            let text = lines.get(line).copied().unwrap_or("");
            let fill = " ".repeat(width - text.chars().count());
            match align {
                Align::Left => out.push_str(&format!(" {}{} |", text, fill)),
                Align::Right => out.push_str(&format!(" {}{} |", fill, text)),
            }
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::ChartType;
    use crate::record::TestOutcome;
    use serde_json::json;

    fn record(name: &str, description: &str, result: TestOutcome) -> TestRecord {
        TestRecord {
            test: name.to_lowercase(),
            name: name.to_string(),
            description: description.to_string(),
            result,
            display_type: Some(ChartType::Scalar),
        }
    }

    #[test]
    fn test_report_layout() {
        let report = Report::new(
            "ToyModel",
            "ToySuite",
            vec!["accuracy".to_string()],
            vec![record("Accuracy", "Compute the accuracy", TestOutcome::Scalar(0.8))],
        );

        assert_eq!(
            report.to_json().unwrap(),
            json!({
                "metadata": {
                    "model_name": "ToyModel",
                    "reclist": "ToySuite",
                    "tests": ["accuracy"]
                },
                "data": [{
                    "name": "Accuracy",
                    "description": "Compute the accuracy",
                    "result": 0.8,
                    "display_type": "scalar"
                }]
            })
        );
    }

    #[test]
    fn test_summary_table() {
        let table = summary_table(
            "ToySuite",
            &[
                record("Accuracy", "Compute the accuracy", TestOutcome::Scalar(0.123456)),
                record(
                    "LessWrong",
                    "",
                    TestOutcome::Distribution(vec![0.1, 0.2, 0.3, 0.4]),
                ),
            ],
        );

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0].trim(), "ToySuite");
        assert!(lines[2].starts_with("| Type "));
        assert!(table.contains("  Accuracy | Compute the accuracy |"));
        assert!(table.contains("0.1235 |"));
        assert!(!table.contains("0.123456"));
        assert!(table.contains("\"...\""));
        assert!(!table.contains("0.4"));

        // all rows have the same width
        let width = lines[1].chars().count();
        assert!(lines[1..].iter().all(|l| l.chars().count() == width));
    }

    #[test]
    fn test_summary_table_without_records() {
        let table = summary_table("Empty", &[]);
        assert_eq!(table.lines().count(), 4);
    }
}
