use anyhow::Result;

use crate::domain::{outcome::Outcome, ports::OutputWriter, report::ComparisonReport};

pub struct JsonWriter;

impl OutputWriter for JsonWriter {
    fn format(&self, report: &ComparisonReport) -> Result<String> {
        let outcome = Outcome::ok(summary_message(report), report);
        Ok(serde_json::to_string_pretty(&outcome)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

fn summary_message(report: &ComparisonReport) -> String {
    let summary = &report.summary;
    let message = if summary.has_differences() {
        "Comparison completed: differences found"
    } else if summary.fetch_failures > 0 {
        "Comparison completed with incomplete reads: no differences in what was read"
    } else {
        "Comparison completed: no structural differences"
    };
    if summary.has_differences() && summary.fetch_failures > 0 {
        format!("{message} ({} incomplete reads)", summary.fetch_failures)
    } else {
        message.to_string()
    }
}
