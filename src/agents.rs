//! Agent persona lookup.
//!
//! Agent steps may name an agent (`agent: reviewer` or `agent: team:reviewer`).
//! The runner asks an [`AgentResolver`] for that agent's system prompt and
//! passes it to the backend. A resolver that cannot find the agent returns
//! `None`; the step still runs, just without a system prompt.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves agent names to system-prompt text.
pub trait AgentResolver {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Finds agents as markdown files in a list of directories.
///
/// `reviewer` maps to `reviewer.md`; `team:reviewer` maps to
/// `team/reviewer.md`, falling back to `reviewer.md`. Directories are
/// searched in order and the first match wins. A leading `---` front-matter
/// block is stripped from the file.
#[derive(Debug, Clone, Default)]
pub struct MarkdownAgentResolver {
    search_paths: Vec<PathBuf>,
}

impl MarkdownAgentResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn candidates(name: &str) -> Vec<PathBuf> {
        match name.split_once(':') {
            Some((namespace, agent)) => vec![
                Path::new(namespace).join(format!("{agent}.md")),
                PathBuf::from(format!("{agent}.md")),
            ],
            None => vec![PathBuf::from(format!("{name}.md"))],
        }
    }
}

impl AgentResolver for MarkdownAgentResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        if name.is_empty() || name.contains("..") || name.starts_with('/') {
            return None;
        }

        for dir in &self.search_paths {
            for candidate in Self::candidates(name) {
                let path = dir.join(&candidate);
                if let Ok(content) = std::fs::read_to_string(&path) {
                    debug!("Resolved agent '{}' to {}", name, path.display());
                    return Some(strip_front_matter(&content).trim().to_string());
                }
            }
        }

        None
    }
}

/// Drop a leading `---`-delimited YAML block, if any.
pub fn strip_front_matter(content: &str) -> &str {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return content;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return &rest[offset..];
        }
    }

    content
}
