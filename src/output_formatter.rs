use crate::errors::Result;
use crate::formats::Location;
use crate::results::SearchReport;
use crate::scanner::KeywordReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Defines the possible output formats for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A simple, human-readable text format.
    Text,
    /// JSON format, suitable for machine processing.
    Json,
    /// Comma-Separated Values format, one row per match.
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Text,
        }
    }
}

/// Renders search/replace and keyword reports.
pub struct OutputFormatter {
    format: OutputFormat,
    tool_name: String,
    tool_version: String,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            tool_name: "cellsweep".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Writes a search/replace report to `writer`.
    pub fn write_report<W: Write>(&self, writer: &mut W, report: &SearchReport) -> Result<()> {
        let output = match self.format {
            OutputFormat::Text => self.report_text(report),
            OutputFormat::Json => self.json(report)?,
            OutputFormat::Csv => self.report_csv(report)?,
        };
        writer.write_all(output.as_bytes())?;
        Ok(())
    }

    /// Writes a keyword search report to `writer`.
    pub fn write_keyword_report<W: Write>(
        &self,
        writer: &mut W,
        report: &KeywordReport,
    ) -> Result<()> {
        let output = match self.format {
            OutputFormat::Text => self.keyword_text(report),
            OutputFormat::Json => self.json(report)?,
            OutputFormat::Csv => self.keyword_csv(report)?,
        };
        writer.write_all(output.as_bytes())?;
        Ok(())
    }

    fn json<T: Serialize>(&self, report: &T) -> Result<String> {
        #[derive(Serialize)]
        struct JsonOutput<'a, T> {
            tool: ToolInfo<'a>,
            generated_at: DateTime<Utc>,
            #[serde(flatten)]
            report: &'a T,
        }

        #[derive(Serialize)]
        struct ToolInfo<'a> {
            name: &'a str,
            version: &'a str,
        }

        let output = JsonOutput {
            tool: ToolInfo {
                name: &self.tool_name,
                version: &self.tool_version,
            },
            generated_at: Utc::now(),
            report,
        };

        let mut json = serde_json::to_string_pretty(&output)?;
        json.push('\n');
        Ok(json)
    }

    fn report_text(&self, report: &SearchReport) -> String {
        let mut output = String::new();

        for result in &report.results {
            if let Some(error) = &result.error {
                output.push_str(&format!("[error] {}: {}\n", result.file_path.display(), error));
                continue;
            }
            for m in &result.matches {
                output.push_str(&format!(
                    "{}:{}: {}\n",
                    result.file_path.display(),
                    location_label(&m.location),
                    m.line_content.trim_end_matches(['\r', '\n'])
                ));
            }
            if let Some(backup) = &result.backup_path {
                if result.replaced {
                    output.push_str(&format!(
                        "  replaced {} match(es), backup at {}\n",
                        result.total_matches,
                        backup.display()
                    ));
                }
            }
        }

        output.push_str(&format!("\n{}\n", "-".repeat(50)));
        output.push_str(&format!("Files processed: {}\n", report.total_files));
        output.push_str(&format!("Files with matches: {}\n", report.files_with_matches));
        output.push_str(&format!("Total matches: {}\n", report.total_matches()));
        if report.preview_only {
            output.push_str("Mode: preview (no files were changed)\n");
        } else {
            output.push_str(&format!("Replacements made: {}\n", report.total_replacements));
        }
        let errors = report.errors().count();
        if errors > 0 {
            output.push_str(&format!("Files with errors: {errors}\n"));
        }
        output
    }

    fn report_csv(&self, report: &SearchReport) -> Result<String> {
        use csv::Writer;

        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_record([
            "File", "Location", "Start", "End", "Match", "Content", "Replaced", "Error",
        ])?;

        for result in &report.results {
            let file = result.file_path.display().to_string();
            let replaced = result.replaced.to_string();
            if let Some(error) = &result.error {
                if result.matches.is_empty() {
                    let record: [&str; 8] = [&file, "", "", "", "", "", &replaced, error];
                    wtr.write_record(record)?;
                    continue;
                }
            }
            let error = result.error.as_deref().unwrap_or("");
            for m in &result.matches {
                let record: [&str; 8] = [
                    &file,
                    &location_label(&m.location),
                    &m.start.to_string(),
                    &m.end.to_string(),
                    &m.match_text,
                    m.line_content.trim_end_matches(['\r', '\n']),
                    &replaced,
                    error,
                ];
                wtr.write_record(record)?;
            }
        }

        let data = wtr
            .into_inner()
            .map_err(|e| format!("CSV writer error: {}", e))?;
        Ok(String::from_utf8(data).unwrap_or_default())
    }

    fn keyword_text(&self, report: &KeywordReport) -> String {
        let mut output = String::new();

        for hit in &report.results {
            output.push_str(&format!(
                "[{}] {} / {} / {}{}: {}\n",
                hit.keyword,
                hit.file_path.display(),
                hit.sheet,
                crate::formats::column_letter(hit.col),
                hit.row,
                hit.value
            ));
        }
        for failed in &report.failed_files {
            output.push_str(&format!(
                "[error] {}: {}\n",
                failed.file_path.display(),
                failed.error
            ));
        }

        output.push_str(&format!("\n{}\n", "-".repeat(50)));
        output.push_str(&format!("Keywords: {}\n", report.keywords.join(", ")));
        output.push_str(&format!("Files searched: {}\n", report.files_searched));
        output.push_str(&format!("Total matches: {}\n", report.total_matches));
        if !report.failed_files.is_empty() {
            output.push_str(&format!("Unreadable files: {}\n", report.failed_files.len()));
        }
        output
    }

    fn keyword_csv(&self, report: &KeywordReport) -> Result<String> {
        use csv::Writer;

        let mut wtr = Writer::from_writer(vec![]);
        wtr.write_record([
            "File name", "Sheet", "Row", "Column", "Cell value", "Keyword", "File path",
        ])?;
        for hit in &report.results {
            let record: [&str; 7] = [
                &hit.file_name,
                &hit.sheet,
                &hit.row.to_string(),
                &crate::formats::column_letter(hit.col),
                &hit.value,
                &hit.keyword,
                &hit.file_path.display().to_string(),
            ];
            wtr.write_record(record)?;
        }

        let data = wtr
            .into_inner()
            .map_err(|e| format!("CSV writer error: {}", e))?;
        Ok(String::from_utf8(data).unwrap_or_default())
    }
}

fn location_label(location: &Location) -> String {
    match location {
        Location::Line(line) => line.to_string(),
        Location::Cell { sheet, row, col } => {
            format!("{}!{}{}", sheet, crate::formats::column_letter(*col), row)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::Match;
    use crate::results::{Aggregator, FileResult};
    use crate::scanner::{FailedFile, KeywordHit};
    use std::path::{Path, PathBuf};

    fn sample_report() -> SearchReport {
        let m = Match {
            location: Location::Cell {
                sheet: "Prices".to_string(),
                row: 3,
                col: 2,
            },
            start: 0,
            end: 5,
            match_text: "apple".to_string(),
            line_content: "apple tart".to_string(),
            context_before: String::new(),
            context_after: " tart".to_string(),
        };
        let mut aggregator = Aggregator::new();
        aggregator.push(FileResult::new(Path::new("/data/menu.xlsx")).with_matches(vec![m]));
        aggregator.push(FileResult::new(Path::new("/data/empty.txt")));
        aggregator.finish(true)
    }

    fn sample_keywords() -> KeywordReport {
        KeywordReport {
            success: true,
            keywords: vec!["apple".to_string()],
            results: vec![KeywordHit {
                file_name: "fruit.xlsx".to_string(),
                file_path: PathBuf::from("/data/fruit.xlsx"),
                sheet: "Sheet1".to_string(),
                row: 3,
                col: 2,
                value: "apple".to_string(),
                keyword: "apple".to_string(),
            }],
            total_matches: 1,
            files_searched: 2,
            failed_files: vec![FailedFile {
                file_path: PathBuf::from("/data/broken.xlsx"),
                error: "corrupt".to_string(),
            }],
        }
    }

    fn render(format: OutputFormat, report: &SearchReport) -> String {
        let mut out = Vec::new();
        OutputFormatter::new(format).write_report(&mut out, report).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("csv"), OutputFormat::Csv);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_text_report() {
        let text = render(OutputFormat::Text, &sample_report());
        assert!(text.contains("/data/menu.xlsx:Prices!B3: apple tart"));
        assert!(text.contains("Files processed: 2"));
        assert!(text.contains("Files with matches: 1"));
        assert!(text.contains("Mode: preview"));
    }

    #[test]
    fn test_json_report_carries_report_fields() {
        let json: serde_json::Value =
            serde_json::from_str(&render(OutputFormat::Json, &sample_report())).unwrap();
        assert_eq!(json["tool"]["name"], "cellsweep");
        assert_eq!(json["success"], true);
        assert_eq!(json["preview_only"], true);
        assert_eq!(json["total_files"], 2);
        assert_eq!(json["results"][0]["matches"][0]["sheet"], "Prices");
    }

    #[test]
    fn test_csv_report_has_one_row_per_match() {
        let csv = render(OutputFormat::Csv, &sample_report());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("File,Location"));
        assert!(lines[1].contains("Prices!B3"));
    }

    #[test]
    fn test_keyword_report_formats() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let mut out = Vec::new();
        formatter.write_keyword_report(&mut out, &sample_keywords()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[apple] /data/fruit.xlsx / Sheet1 / B3: apple"));
        assert!(text.contains("[error] /data/broken.xlsx: corrupt"));
        assert!(text.contains("Unreadable files: 1"));

        let formatter = OutputFormatter::new(OutputFormat::Csv);
        let mut out = Vec::new();
        formatter.write_keyword_report(&mut out, &sample_keywords()).unwrap();
        let csv = String::from_utf8(out).unwrap();
        assert!(csv.starts_with("File name,Sheet,Row,Column,Cell value,Keyword,File path"));
        assert!(csv.contains("fruit.xlsx,Sheet1,3,B,apple,apple,/data/fruit.xlsx"));
    }
}
