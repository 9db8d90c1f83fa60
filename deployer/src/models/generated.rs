//! Artifacts generated by the assistant: contract source, deployment config
//! and the scaffolded dApp, as found in a markdown response.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CODE_BLOCK: OnceLock<Regex> = OnceLock::new();

fn code_block_regex() -> &'static Regex {
    CODE_BLOCK.get_or_init(|| {
        Regex::new(r"(?s)```(\w+)?[ \t]*\r?\n(.*?)```").expect("valid code block regex")
    })
}

/// Contract, config and dApp pulled out of one assistant response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub rust_contract: Option<String>,
    pub deployment_config: Option<serde_json::Value>,
    pub react_dapp: Option<String>,
}

impl GeneratedArtifact {
    /// Keep the first `rust`, `json` and `react`/`jsx`/`js` fenced blocks
    pub fn from_markdown(markdown: &str) -> Self {
        let mut artifact = GeneratedArtifact::default();

        for captures in code_block_regex().captures_iter(markdown) {
            let lang = captures
                .get(1)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_default();
            let code = captures.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

            match lang.as_str() {
                "rust" if artifact.rust_contract.is_none() => {
                    artifact.rust_contract = Some(code.to_string());
                }
                "json" if artifact.deployment_config.is_none() => {
                    let config = serde_json::from_str(code)
                        .unwrap_or_else(|_| serde_json::Value::String(code.to_string()));
                    artifact.deployment_config = Some(config);
                }
                "react" | "jsx" | "js" if artifact.react_dapp.is_none() => {
                    artifact.react_dapp = Some(code.to_string());
                }
                _ => {}
            }
        }

        artifact
    }

    /// Contract source to submit, if any
    pub fn source_code(&self) -> Option<&str> {
        self.rust_contract.as_deref()
    }

    /// Deployment config to submit, if any
    pub fn config(&self) -> Option<&serde_json::Value> {
        self.deployment_config.as_ref()
    }

    /// True when both halves needed for a deployment are present
    pub fn is_deployable(&self) -> bool {
        self.source_code().is_some_and(|code| !code.trim().is_empty())
            && self.config().is_some_and(config_present)
    }

    /// Files of the scaffolded dApp
    pub fn dapp_files(&self) -> Vec<DappFile> {
        self.react_dapp
            .as_deref()
            .map(split_dapp_files)
            .unwrap_or_default()
    }
}

/// Whether a config value carries anything to deploy with
pub fn config_present(config: &serde_json::Value) -> bool {
    match config {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Lowercase languages of every fenced block that names one
pub fn code_block_languages(markdown: &str) -> BTreeSet<String> {
    code_block_regex()
        .captures_iter(markdown)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// One file of a scaffolded dApp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappFile {
    pub path: String,
    pub content: String,
}

impl DappFile {
    /// Editor language derived from the extension
    pub fn file_type(&self) -> &'static str {
        let ext = self
            .path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "js" | "jsx" | "ts" | "tsx" => "javascript",
            "json" => "json",
            "css" => "css",
            "html" => "html",
            "md" => "markdown",
            _ => "text",
        }
    }
}

/// Split a bundle on `// path/to/file.ext` header lines
///
/// A bundle without headers becomes a single `App.jsx`.
pub fn split_dapp_files(bundle: &str) -> Vec<DappFile> {
    let normalized = bundle.replace("\r\n", "\n");
    let mut files = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in normalized.lines() {
        if let Some(path) = file_header(line) {
            if let Some((prev_path, body)) = current.take() {
                files.push(DappFile {
                    path: prev_path,
                    content: body.join("\n").trim().to_string(),
                });
            }
            current = Some((path.to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((path, body)) = current {
        files.push(DappFile {
            path,
            content: body.join("\n").trim().to_string(),
        });
    }

    if files.is_empty() && !bundle.trim().is_empty() {
        files.push(DappFile {
            path: "App.jsx".to_string(),
            content: bundle.trim().to_string(),
        });
    }

    files
}

fn file_header(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("//")?.trim();
    if rest.is_empty() || rest.contains(char::is_whitespace) || rest.contains("://") {
        return None;
    }
    let (stem, ext) = rest.rsplit_once('.')?;
    let stem = stem.rsplit('/').next().unwrap_or(stem);
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(rest)
}
