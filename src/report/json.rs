use crate::model::ProjectReport;

use super::Renderer;

/// The report itself, pretty-printed. Same shape as the stored report.
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn format(&self) -> &'static str {
        "json"
    }

    fn render(&self, report: &ProjectReport) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
