//! SARIF output: hotspots and code smells as results.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{CodeSmellKind, ProjectReport};

use super::Renderer;

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "codepulse";

const HOTSPOT_RULE: &str = "hotspot";

#[derive(Serialize, Deserialize)]
struct SarifReport {
    version: String,
    #[serde(rename = "$schema")]
    schema: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize, Deserialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize, Deserialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize, Deserialize)]
struct SarifDriver {
    name: String,
    version: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize, Deserialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_config: SarifRuleConfig,
}

#[derive(Serialize, Deserialize)]
struct SarifRuleConfig {
    level: String,
}

#[derive(Serialize, Deserialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize, Deserialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize, Deserialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifact,
    region: SarifRegion,
}

#[derive(Serialize, Deserialize)]
struct SarifArtifact {
    uri: String,
}

#[derive(Serialize, Deserialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
}

/// (name, description, level)
fn rule_info(rule_id: &str) -> (&'static str, &'static str, &'static str) {
    match rule_id {
        HOTSPOT_RULE => ("Hotspot", "File combines high complexity with high churn", "warning"),
        "many_parameters" => ("ManyParameters", "Function takes many parameters", "note"),
        "many_locals" => ("ManyLocals", "Function declares many local variables", "note"),
        "deep_nesting" => ("DeepNesting", "Function nests blocks deeply", "warning"),
        "god_function" => ("GodFunction", "Function is both long and complex", "warning"),
        "global_state" => ("GlobalState", "Package-level mutable variable", "note"),
        _ => ("Unknown", "", "note"),
    }
}

fn smell_level(kind: CodeSmellKind) -> &'static str {
    rule_info(kind.as_str()).2
}

/// Make a path relative to the analyzed root, with forward slashes.
fn make_relative_path(file_path: &str, root: &str) -> String {
    Path::new(file_path)
        .strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file_path.to_string())
}

fn location(uri: String, line: usize) -> Vec<SarifLocation> {
    vec![SarifLocation {
        physical_location: SarifPhysicalLocation {
            artifact_location: SarifArtifact { uri },
            region: SarifRegion {
                start_line: line.max(1),
            },
        },
    }]
}

pub struct SarifRenderer;

impl Renderer for SarifRenderer {
    fn format(&self) -> &'static str {
        "sarif"
    }

    fn render(&self, report: &ProjectReport) -> anyhow::Result<String> {
        let root = report.root_path.as_str();
        let mut results = Vec::new();

        for h in &report.hotspots {
            results.push(SarifResult {
                rule_id: HOTSPOT_RULE.to_string(),
                level: rule_info(HOTSPOT_RULE).2.to_string(),
                message: SarifMessage {
                    text: format!(
                        "{}: score {:.1} (CCN {}, churn {})",
                        h.reason, h.score, h.ccn, h.churn
                    ),
                },
                locations: location(make_relative_path(&h.file_path, root), 1),
            });
        }

        for smell in report.files.iter().flat_map(|f| f.smells.iter()) {
            let text = match &smell.function {
                Some(func) => format!("{}: {}", func, smell.description),
                None => smell.description.clone(),
            };
            results.push(SarifResult {
                rule_id: smell.kind.as_str().to_string(),
                level: smell_level(smell.kind).to_string(),
                message: SarifMessage { text },
                locations: location(
                    make_relative_path(&smell.file_path, root),
                    smell.line.unwrap_or(1),
                ),
            });
        }

        let rule_ids: BTreeSet<&str> = results.iter().map(|r| r.rule_id.as_str()).collect();
        let rules: Vec<SarifRule> = rule_ids
            .into_iter()
            .map(|id| {
                let (name, description, level) = rule_info(id);
                SarifRule {
                    id: id.to_string(),
                    name: name.to_string(),
                    short_description: SarifMessage {
                        text: description.to_string(),
                    },
                    default_config: SarifRuleConfig {
                        level: level.to_string(),
                    },
                }
            })
            .collect();

        let sarif = SarifReport {
            version: SARIF_VERSION.to_string(),
            schema: SARIF_SCHEMA.to_string(),
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: TOOL_NAME.to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                        rules,
                    },
                },
                results,
            }],
        };

        Ok(serde_json::to_string_pretty(&sarif)?)
    }
}
