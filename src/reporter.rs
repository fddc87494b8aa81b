//! Console output for collected samples
//!
//! Reporters only render; a write error is logged and never stops sampling.

use std::io::Write;

use chrono::Local;
use clap::ValueEnum;
use tracing::warn;

use crate::Sample;

pub trait Reporter: Send {
    fn display(&mut self, samples: &[Sample]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Build the reporter for `format`, writing to stdout
pub fn stdout_reporter(format: OutputFormat) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Table => Box::new(TableReporter::new(std::io::stdout())),
        OutputFormat::Json => Box::new(JsonReporter::new(std::io::stdout())),
    }
}

/// One aligned line per sample, with a banner and header before the first tick
pub struct TableReporter<W> {
    out: W,
    header_written: bool,
}

impl<W: Write + Send> TableReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self, first: &Sample) -> std::io::Result<()> {
        let rule = "=".repeat(80);
        writeln!(self.out, "\n{rule}")?;
        writeln!(
            self.out,
            " MONITORING: {} ({}) | SCENARIO: {}",
            first.hostname, first.os, first.scenario
        )?;
        writeln!(self.out, "{rule}\n")?;

        let header = format!(
            "{:<10} | {:<6} | {:<6} | {:<15} | {:<10} | {:<10} | {:<5}",
            "TIME", "CPU", "RAM", "TARGET", "PING (ms)", "HTTP (ms)", "CODE"
        );
        writeln!(self.out, "{header}")?;
        writeln!(self.out, "{}", "-".repeat(header.len()))
    }

    fn write_samples(&mut self, samples: &[Sample]) -> std::io::Result<()> {
        if let Some(first) = samples.first()
            && !self.header_written
        {
            self.write_header(first)?;
            self.header_written = true;
        }

        for sample in samples {
            writeln!(self.out, "{}", format_line(sample))?;
        }

        self.out.flush()
    }
}

impl<W: Write + Send> Reporter for TableReporter<W> {
    fn display(&mut self, samples: &[Sample]) {
        if let Err(e) = self.write_samples(samples) {
            warn!("failed to write samples to console: {e}");
        }
    }
}

/// Render a sample as a table line
///
/// A missing ping shows as `T/O`; a missing HTTP latency and an absent or
/// zero status code show as `-`.
pub fn format_line(sample: &Sample) -> String {
    let time = sample.timestamp.with_timezone(&Local).format("%H:%M:%S");

    let ping = sample
        .ping_latency_ms
        .map_or_else(|| String::from("T/O"), |ms| ms.to_string());
    let http = sample
        .http_latency_ms
        .map_or_else(|| String::from("-"), |ms| ms.to_string());
    let code = match sample.http_status_code {
        Some(code) if code != 0 => code.to_string(),
        _ => String::from("-"),
    };

    format!(
        "{:<10} | {:<5}% | {:<5}% | {:<15} | {:<10} | {:<10} | {:<5}",
        time.to_string(),
        sample.cpu_percent,
        sample.ram_percent,
        sample.target_name,
        ping,
        http,
        code
    )
}

/// One JSON object per sample and line
pub struct JsonReporter<W> {
    out: W,
}

impl<W: Write + Send> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_samples(&mut self, samples: &[Sample]) -> std::io::Result<()> {
        for sample in samples {
            serde_json::to_writer(&mut self.out, sample)?;
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn display(&mut self, samples: &[Sample]) {
        if let Err(e) = self.write_samples(samples) {
            warn!("failed to write samples as JSON: {e}");
        }
    }
}
