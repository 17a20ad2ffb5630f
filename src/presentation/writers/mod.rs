use crate::domain::{ports::OutputWriter, report::ComparisonReport};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use self::{html::HtmlWriter, json::JsonWriter};

pub mod html;
pub mod json;

/// Register available writers - add new ones without touching main.rs
pub fn all_writers() -> Vec<Box<dyn OutputWriter>> {
    vec![Box::new(JsonWriter), Box::new(HtmlWriter)]
}

pub fn writer_for(format: &str) -> Option<Box<dyn OutputWriter>> {
    match format {
        "json" => Some(Box::new(JsonWriter)),
        "html" => Some(Box::new(HtmlWriter)),
        _ => None,
    }
}

/// Writes the report to `<dir>/<report_id>.<ext>` via the chosen writer and
/// returns the path written.
pub fn write_to_file(
    writer: &dyn OutputWriter,
    report: &ComparisonReport,
    dir: &str,
) -> Result<PathBuf> {
    // Ensure the output directory exists
    fs::create_dir_all(dir).with_context(|| format!("Failed to create output dir {dir}"))?;

    let content = writer.format(report)?;
    let path = Path::new(dir).join(format!("{}.{}", report.report_id, writer.extension()));
    fs::write(&path, &content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comparison::compare;
    use crate::domain::report::SideInfo;
    use crate::domain::scope::ScopeSelector;
    use crate::domain::snapshot::SchemaSnapshot;
    use crate::domain::value_objects::Side;

    #[test]
    fn writers_are_registered_by_extension() {
        let exts: Vec<_> = all_writers().iter().map(|w| w.extension()).collect();
        assert_eq!(exts, vec!["json", "html"]);
        assert_eq!(writer_for("html").map(|w| w.extension()), Some("html"));
        assert!(writer_for("sql").is_none());
    }

    #[test]
    fn writes_report_named_after_its_id() {
        let s = SchemaSnapshot::default();
        let scope = ScopeSelector::everything();
        let report = ComparisonReport::new(
            SideInfo::describe(Side::A, "sqlite", &s),
            SideInfo::describe(Side::B, "sqlite", &s),
            scope,
            compare(&s, &s, &scope).unwrap(),
        );

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let out = out.to_str().unwrap();

        for writer in all_writers() {
            let path = write_to_file(writer.as_ref(), &report, out).unwrap();
            assert_eq!(
                path.file_name().unwrap().to_str().unwrap(),
                format!("{}.{}", report.report_id, writer.extension())
            );
            assert!(fs::metadata(&path).unwrap().len() > 0);
        }
    }
}
