//! Prompt templates for the financial advisor
//!
//! Every prompt ships embedded in the binary. A markdown file with the same
//! name in the override directory (`~/.local/share/finsight/prompts/` by
//! default) replaces the embedded copy.
//!
//! File format: YAML frontmatter (`id`, `version`) followed by a `# System`
//! section and a `# User` section. The user section is a template with
//! `{{var}}` placeholders and `{{#if var}}...{{/if}}` blocks that are kept
//! only when `var` is non-empty.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

mod embedded {
    pub const FINANCIAL_INSIGHTS: &str = include_str!("../../../prompts/financial_insights.md");
    pub const DETECT_ANOMALIES: &str = include_str!("../../../prompts/detect_anomalies.md");
    pub const SAVINGS_STRATEGIES: &str = include_str!("../../../prompts/savings_strategies.md");
    pub const CATEGORIZE_TRANSACTION: &str =
        include_str!("../../../prompts/categorize_transaction.md");
    pub const FINANCIAL_CHAT: &str = include_str!("../../../prompts/financial_chat.md");
}

const IF_END: &str = "{{/if}}";

/// The advisor's prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    FinancialInsights,
    DetectAnomalies,
    SavingsStrategies,
    CategorizeTransaction,
    FinancialChat,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinancialInsights => "financial_insights",
            Self::DetectAnomalies => "detect_anomalies",
            Self::SavingsStrategies => "savings_strategies",
            Self::CategorizeTransaction => "categorize_transaction",
            Self::FinancialChat => "financial_chat",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[
            Self::FinancialInsights,
            Self::DetectAnomalies,
            Self::SavingsStrategies,
            Self::CategorizeTransaction,
            Self::FinancialChat,
        ]
    }

    fn embedded(&self) -> &'static str {
        match self {
            Self::FinancialInsights => embedded::FINANCIAL_INSIGHTS,
            Self::DetectAnomalies => embedded::DETECT_ANOMALIES,
            Self::SavingsStrategies => embedded::SAVINGS_STRATEGIES,
            Self::CategorizeTransaction => embedded::CATEGORIZE_TRANSACTION,
            Self::FinancialChat => embedded::FINANCIAL_CHAT,
        }
    }

    fn file_name(&self) -> String {
        format!("{}.md", self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct Frontmatter {
    id: String,
    version: u32,
}

/// A parsed prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub version: u32,
    pub system: Option<String>,
    /// Unrendered user template
    pub user: String,
}

impl Prompt {
    fn parse(id: PromptId, source: &str) -> Result<Self> {
        let (front, body) = split_frontmatter(source)?;
        let front: Frontmatter = serde_yaml::from_str(front)?;
        if front.id != id.as_str() {
            return Err(Error::InvalidData(format!(
                "Prompt file declares id '{}', expected '{}'",
                front.id,
                id.as_str()
            )));
        }

        let (system, user) = split_sections(body);
        Ok(Self {
            version: front.version,
            system,
            user: user.unwrap_or_else(|| body.to_string()),
        })
    }

    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        render_template(&self.user, vars)
    }
}

/// Loads prompts once and keeps them
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    loaded: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Embedded prompts plus overrides from the default directory
    pub fn new() -> Self {
        Self {
            override_dir: dirs::data_local_dir().map(|d| d.join("finsight").join("prompts")),
            loaded: HashMap::new(),
        }
    }

    pub fn with_override_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
            loaded: HashMap::new(),
        }
    }

    /// Ignores override files
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            loaded: HashMap::new(),
        }
    }

    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.loaded.contains_key(&id) {
            let prompt = match self.override_file(id) {
                Some(path) => load_override(id, &path)?,
                None => Prompt::parse(id, id.embedded())?,
            };
            self.loaded.insert(id, prompt);
        }
        self.loaded
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt {} not loaded", id.as_str())))
    }

    fn override_file(&self, id: PromptId) -> Option<PathBuf> {
        let path = self.override_dir.as_ref()?.join(id.file_name());
        path.is_file().then_some(path)
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn load_override(id: PromptId, path: &Path) -> Result<Prompt> {
    let source = fs::read_to_string(path)?;
    let prompt = Prompt::parse(id, &source)?;
    debug!(
        prompt = id.as_str(),
        version = prompt.version,
        path = %path.display(),
        "Using prompt override"
    );
    Ok(prompt)
}

/// `(frontmatter, body)` of a `---` delimited file
fn split_frontmatter(source: &str) -> Result<(&str, &str)> {
    let rest = source
        .trim_start()
        .strip_prefix("---")
        .ok_or_else(|| Error::InvalidData("Prompt must start with YAML frontmatter".into()))?;
    let (front, body) = rest
        .split_once("\n---")
        .ok_or_else(|| Error::InvalidData("Prompt frontmatter is not closed".into()))?;
    Ok((front.trim(), body.trim()))
}

/// The `# System` and `# User` sections; other top-level headings end a section
fn split_sections(body: &str) -> (Option<String>, Option<String>) {
    const SYSTEM: usize = 0;
    const USER: usize = 1;
    let mut sections: [Option<Vec<&str>>; 2] = [None, None];
    let mut current = None;

    for line in body.lines() {
        match line.trim_end() {
            "# System" => {
                sections[SYSTEM] = Some(Vec::new());
                current = Some(SYSTEM);
            }
            "# User" => {
                sections[USER] = Some(Vec::new());
                current = Some(USER);
            }
            heading if heading.starts_with("# ") => current = None,
            _ => {
                if let Some(lines) = current.and_then(|i| sections[i].as_mut()) {
                    lines.push(line);
                }
            }
        }
    }

    let [system, user] = sections;
    let join = |lines: Vec<&str>| lines.join("\n").trim().to_string();
    (system.map(join), user.map(join))
}

/// Single pass over the template; unknown placeholders are left as written
fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find("}}").map(|i| open + i) else {
            out.push_str(&rest[open..]);
            return out;
        };
        let tag = rest[open + 2..close].trim();
        let raw = &rest[open..close + 2];
        rest = &rest[close + 2..];

        if let Some(var) = tag.strip_prefix("#if ") {
            let Some(end) = rest.find(IF_END) else {
                out.push_str(raw);
                continue;
            };
            if vars.get(var.trim()).is_some_and(|v| !v.is_empty()) {
                out.push_str(&render_template(&rest[..end], vars));
            }
            rest = &rest[end + IF_END.len()..];
        } else if let Some(value) = vars.get(tag) {
            out.push_str(value);
        } else {
            out.push_str(raw);
        }
    }

    out.push_str(rest);
    out
}
