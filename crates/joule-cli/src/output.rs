// SPDX-License-Identifier: Apache-2.0
//! Report writers.
//!
//! The output file's extension picks the format: `.json` and `.csv` get
//! machine-readable renderings, everything else a plain-text summary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context as _;
use joule_core::Report;

/// Renders a [`Report`] to a byte stream in one concrete format.
pub trait ReportWriter {
    /// Write the full report to `out`.
    fn write(&self, out: &mut dyn Write, report: &Report) -> anyhow::Result<()>;
}

/// Pretty-printed JSON, mirroring the report's own structure.
pub struct JsonWriter;

impl ReportWriter for JsonWriter {
    fn write(&self, out: &mut dyn Write, report: &Report) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut *out, report).context("serializing report to JSON")?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

/// One row per offending message, errors joined with `" | "`.
pub struct CsvWriter;

impl ReportWriter for CsvWriter {
    fn write(&self, out: &mut dyn Write, report: &Report) -> anyhow::Result<()> {
        writeln!(out, "id,direction,errors")?;
        for (id, directions) in &report.invalid_messages {
            for (direction, errors) in directions {
                writeln!(
                    out,
                    "{},{},{}",
                    csv_field(id),
                    direction,
                    csv_field(&errors.join(" | "))
                )?;
            }
        }
        for (line_key, errors) in &report.non_parsable_messages {
            writeln!(
                out,
                "{},unparsable,{}",
                csv_field(line_key),
                csv_field(&errors.join(" | "))
            )?;
        }
        Ok(())
    }
}

/// Human-readable summary with a statistics block.
pub struct TxtWriter;

impl ReportWriter for TxtWriter {
    fn write(&self, out: &mut dyn Write, report: &Report) -> anyhow::Result<()> {
        if report.invalid_messages.is_empty() && report.non_parsable_messages.is_empty() {
            writeln!(out, "All messages are valid.")?;
        }

        for (id, directions) in &report.invalid_messages {
            for (direction, errors) in directions {
                writeln!(out, "message {id} ({direction}):")?;
                for error in errors {
                    writeln!(out, "  - {error}")?;
                }
            }
        }
        for (line_key, errors) in &report.non_parsable_messages {
            writeln!(out, "{line_key} (unparsable):")?;
            for error in errors {
                writeln!(out, "  - {error}")?;
            }
        }

        let stats = &report.statistics;
        writeln!(out)?;
        writeln!(out, "Statistics")?;
        writeln!(
            out,
            "  requests:   {} valid ({:.1}%), {} invalid ({:.1}%)",
            stats.valid_requests,
            stats.valid_request_percentage(),
            stats.invalid_requests,
            stats.invalid_request_percentage()
        )?;
        writeln!(
            out,
            "  responses:  {} valid ({:.1}%), {} invalid ({:.1}%)",
            stats.valid_responses,
            stats.valid_response_percentage(),
            stats.invalid_responses,
            stats.invalid_response_percentage()
        )?;
        writeln!(out, "  unparsable: {}", stats.unparsable_messages)?;
        writeln!(
            out,
            "  total:      {} ({:.1}% valid)",
            stats.total(),
            stats.total_valid_percentage()
        )?;
        Ok(())
    }
}

/// Quote a CSV field if it contains a delimiter, quote, or newline.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Pick a writer from a path's extension.
pub fn writer_for(path: &Path) -> Box<dyn ReportWriter> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Box::new(JsonWriter),
        Some("csv") => Box::new(CsvWriter),
        _ => Box::new(TxtWriter),
    }
}

/// Write `report` to `path` in the format its extension selects.
pub fn write_report_file(path: &Path, report: &Report) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating report file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writer_for(path).write(&mut out, report)?;
    out.flush()?;
    Ok(())
}
