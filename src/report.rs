//! CSV and stdout reports
//!
//! Three CSV files for spreadsheet analysis (commands, headers, header
//! folders) plus a plain-text summary. Rows come from sorted maps and numbers
//! use fixed precision, so the same inputs always render the same bytes.

use crate::action::ActionKind;
use crate::attribution::{AttributionSummary, CategoryRow, FolderRow, HeaderRow};

/// One timed build command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRow {
    /// Source file for compiles, output file for links
    pub file: String,
    pub kind: ActionKind,
    /// Wall-clock time, truncated to whole milliseconds
    pub elapsed_ms: u64,
}

/// A CSV table with a fixed header row
#[derive(Debug, Clone)]
pub struct CsvTable {
    header: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(header: Vec<&'static str>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(&self.header.join(","));
        output.push('\n');

        for row in &self.rows {
            let fields: Vec<String> = row.iter().map(|f| Self::escape_field(f)).collect();
            output.push_str(&fields.join(","));
            output.push('\n');
        }

        output
    }
}

fn ms(value: f64) -> String {
    format!("{:.3}", value)
}

pub fn commands_csv(rows: &[CommandRow]) -> String {
    let mut table = CsvTable::new(vec!["file", "type", "time (ms)"]);
    for row in rows {
        table.add_row(vec![
            row.file.clone(),
            row.kind.label().to_string(),
            row.elapsed_ms.to_string(),
        ]);
    }
    table.to_csv()
}

pub fn headers_csv(rows: &[HeaderRow]) -> String {
    let mut table = CsvTable::new(vec![
        "file",
        "count",
        "own time (ms)",
        "total time (ms)",
        "avg own time (ms)",
        "avg time (ms)",
    ]);
    for row in rows {
        table.add_row(vec![
            row.path.clone(),
            row.count.to_string(),
            ms(row.own_ms),
            ms(row.total_ms),
            ms(row.avg_own_ms),
            ms(row.avg_total_ms),
        ]);
    }
    table.to_csv()
}

pub fn folders_csv(rows: &[FolderRow]) -> String {
    let mut table = CsvTable::new(vec!["folder", "own time (ms)"]);
    for row in rows {
        table.add_row(vec![row.folder.clone(), ms(row.own_ms)]);
    }
    table.to_csv()
}

/// Total build time line printed after the command report
pub fn build_time_text(total_build_secs: f64) -> String {
    format!("\nTotal Build Time: {:.3} sec\n", total_build_secs)
}

/// Header parsing totals followed by ranked category totals
pub fn summary_text(summary: &AttributionSummary, categories: &[CategoryRow]) -> String {
    let mut out = String::from("\n");
    out.push_str(&format!(
        "{:.3} sec - Total Header Parsing\n",
        summary.total_header_secs
    ));
    out.push_str(&format!(
        "{:.3} sec - Total Header Parsing (no transitive includes)\n",
        summary.own_header_secs
    ));
    if !summary.overlapping_units.is_empty() {
        out.push_str(&format!(
            "({} of {} translation units had overlapping intervals)\n",
            summary.overlapping_units.len(),
            summary.units
        ));
    }
    if summary.skipped_events > 0 {
        out.push_str(&format!(
            "({} malformed trace events skipped)\n",
            summary.skipped_events
        ));
    }
    if summary.unresolved_paths > 0 {
        out.push_str(&format!(
            "({} header occurrences kept their raw path)\n",
            summary.unresolved_paths
        ));
    }
    out.push('\n');
    for category in categories {
        out.push_str(&format!("{:.3} sec - {}\n", category.secs, category.name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_commands_csv() {
        let csv = commands_csv(&[
            CommandRow {
                file: "../src/main.cpp".to_string(),
                kind: ActionKind::CompileCpp,
                elapsed_ms: 1234,
            },
            CommandRow {
                file: "app".to_string(),
                kind: ActionKind::LinkCpp,
                elapsed_ms: 56,
            },
        ]);
        assert_eq!(
            csv,
            "file,type,time (ms)\n../src/main.cpp,Compile C++,1234\napp,Link C++,56\n"
        );
    }

    #[test]
    fn test_headers_csv() {
        let csv = headers_csv(&[HeaderRow {
            path: "/src/a.h".to_string(),
            count: 2,
            own_ms: 4.0,
            total_ms: 6.0,
            avg_own_ms: 2.0,
            avg_total_ms: 3.0,
        }]);
        assert_eq!(
            csv,
            "file,count,own time (ms),total time (ms),avg own time (ms),avg time (ms)\n\
             /src/a.h,2,4.000,6.000,2.000,3.000\n"
        );
    }

    #[test]
    fn test_folders_csv_escapes() {
        let csv = folders_csv(&[FolderRow {
            folder: "/odd,dir".to_string(),
            own_ms: 1.5,
        }]);
        assert_eq!(csv, "folder,own time (ms)\n\"/odd,dir\",1.500\n");
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(CsvTable::escape_field("a\"b"), "\"a\"\"b\"");
        assert_eq!(CsvTable::escape_field("plain"), "plain");
    }

    #[test]
    fn test_summary_text() {
        let summary = AttributionSummary {
            total_header_secs: 1.8,
            own_header_secs: 1.0,
            units: 3,
            overlapping_units: vec![PathBuf::from("x.json")],
            skipped_events: 0,
            unresolved_paths: 0,
        };
        let text = summary_text(
            &summary,
            &[CategoryRow {
                name: "Total Frontend".to_string(),
                secs: 2.5,
            }],
        );
        assert!(text.contains("1.800 sec - Total Header Parsing\n"));
        assert!(text.contains("1.000 sec - Total Header Parsing (no transitive includes)"));
        assert!(text.contains("(1 of 3 translation units had overlapping intervals)"));
        assert!(text.ends_with("2.500 sec - Total Frontend\n"));
        assert!(!text.contains("malformed"));
    }

    #[test]
    fn test_summary_text_data_quality_lines() {
        let summary = AttributionSummary {
            total_header_secs: 0.0,
            own_header_secs: 0.0,
            units: 1,
            overlapping_units: vec![],
            skipped_events: 7,
            unresolved_paths: 2,
        };
        let text = summary_text(&summary, &[]);
        assert_eq!(
            text,
            "\n0.000 sec - Total Header Parsing\n\
             0.000 sec - Total Header Parsing (no transitive includes)\n\
             (7 malformed trace events skipped)\n\
             (2 header occurrences kept their raw path)\n\n"
        );
    }

    #[test]
    fn test_build_time_text() {
        assert_eq!(build_time_text(2.0), "\nTotal Build Time: 2.000 sec\n");
    }
}
