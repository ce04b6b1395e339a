//! Import report output as JSON or JSON Lines.

use std::io::{self, Write};

use crate::config::OutputConfig;
use crate::types::ImportReport;

/// Report format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// One JSON object per report, optionally pretty-printed
    Json,
    /// One compact JSON object per line
    JsonLines,
}

impl ReportFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Writes [`ImportReport`]s to an underlying writer.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    pretty: bool,
    reports_written: usize,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W, format: ReportFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            reports_written: 0,
        }
    }

    /// Build from the `[output]` config section; unknown formats fall back to JSON.
    pub fn from_config(writer: W, config: &OutputConfig) -> Self {
        let format = ReportFormat::parse(&config.format).unwrap_or(ReportFormat::Json);
        Self::new(writer, format, config.pretty)
    }

    /// Write one report followed by a newline.
    pub fn write(&mut self, report: &ImportReport) -> io::Result<()> {
        match self.format {
            ReportFormat::Json if self.pretty => {
                serde_json::to_writer_pretty(&mut self.writer, report).map_err(io::Error::other)?
            }
            // JSONL is never pretty-printed
            _ => serde_json::to_writer(&mut self.writer, report).map_err(io::Error::other)?,
        }
        writeln!(self.writer)?;
        self.reports_written += 1;
        Ok(())
    }

    pub fn reports_written(&self) -> usize {
        self.reports_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelBuffer;

    fn report() -> ImportReport {
        let image = PixelBuffer::from_rgba(1, 1, vec![1, 2, 3, 4]).unwrap();
        let mut report = ImportReport::new(&image);
        report.tint = Some("#cc0000".to_string());
        report.strategy = Some("label".to_string());
        report
    }

    #[test]
    fn test_write_json() {
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::Json, false);
        writer.write(&report()).unwrap();
        assert_eq!(writer.reports_written(), 1);

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.contains("\"tint\":\"#cc0000\""));
        assert!(output.contains("\"strategy\":\"label\""));
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn test_write_jsonl_ignores_pretty() {
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::JsonLines, true);
        writer.write(&report()).unwrap();
        writer.write(&report()).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(output.trim().split('\n').count(), 2);
    }

    #[test]
    fn test_pretty_json_spans_lines() {
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::Json, true);
        writer.write(&report()).unwrap();
        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.trim().lines().count() > 1);
    }

    #[test]
    fn test_from_config() {
        let config = OutputConfig {
            format: "NDJSON".to_string(),
            pretty: true,
        };
        let writer = ReportWriter::from_config(Vec::new(), &config);
        assert_eq!(writer.format, ReportFormat::JsonLines);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ReportFormat::parse("json"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::parse("JSONL"), Some(ReportFormat::JsonLines));
        assert_eq!(ReportFormat::parse("xml"), None);
    }
}
