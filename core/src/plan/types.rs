use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of ecosystems the engine knows how to set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Python,
    #[serde(alias = "nodejs", alias = "javascript")]
    Node,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Java, Language::Python, Language::Node];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Python => "python",
            Self::Node => "node",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "java" => Ok(Self::Java),
            "python" => Ok(Self::Python),
            "node" | "nodejs" | "javascript" => Ok(Self::Node),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackDetection {
    pub language: Language,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub manifest_paths: Vec<PathBuf>,
    #[serde(default)]
    pub package_manager: Option<String>,
}

/// One shell command line. Deserializes from either `"npm ci"` or
/// `{ "run": "npm audit", "best_effort": true }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PlanCommandRepr")]
pub struct PlanCommand {
    pub run: String,
    /// A failing best-effort command does not stop the sequence.
    #[serde(default)]
    pub best_effort: bool,
}

impl PlanCommand {
    pub fn new(run: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            best_effort: false,
        }
    }

    pub fn best_effort(run: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            best_effort: true,
        }
    }
}

impl From<&str> for PlanCommand {
    fn from(run: &str) -> Self {
        Self::new(run)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanCommandRepr {
    Line(String),
    Full {
        run: String,
        #[serde(default)]
        best_effort: bool,
    },
}

impl From<PlanCommandRepr> for PlanCommand {
    fn from(repr: PlanCommandRepr) -> Self {
        match repr {
            PlanCommandRepr::Line(run) => Self::new(run),
            PlanCommandRepr::Full { run, best_effort } => Self { run, best_effort },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyPlanItem {
    pub language: Language,
    pub working_directory: PathBuf,
    pub ordered_commands: Vec<PlanCommand>,
    #[serde(default)]
    pub expected_artifacts: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,
}

impl DependencyPlanItem {
    pub fn new<I, C>(language: Language, working_directory: impl Into<PathBuf>, commands: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<PlanCommand>,
    {
        Self {
            language,
            working_directory: working_directory.into(),
            ordered_commands: commands.into_iter().map(Into::into).collect(),
            expected_artifacts: Vec::new(),
            package_manager: None,
        }
    }

    pub fn with_artifacts<I, P>(mut self, artifacts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.expected_artifacts = artifacts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_package_manager(mut self, pm: impl Into<String>) -> Self {
        self.package_manager = Some(pm.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    #[serde(default)]
    pub items: Vec<DependencyPlanItem>,
}

impl DependencyAnalysis {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Document produced by the scanner + analyzer pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanInput {
    #[serde(default)]
    pub project_path: Option<PathBuf>,
    #[serde(default)]
    pub detections: Vec<StackDetection>,
    #[serde(default)]
    pub analysis: DependencyAnalysis,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_accept_string_or_object() {
        let item: DependencyPlanItem = serde_json::from_str(
            r#"{
                "language": "nodejs",
                "working_directory": "web",
                "ordered_commands": ["npm ci", {"run": "npm audit", "best_effort": true}]
            }"#,
        )
        .unwrap();

        assert_eq!(item.language, Language::Node);
        assert_eq!(item.ordered_commands[0], PlanCommand::new("npm ci"));
        assert!(item.ordered_commands[1].best_effort);
        assert!(item.expected_artifacts.is_empty());
    }

    #[test]
    fn unknown_language_is_rejected() {
        let res = serde_json::from_str::<StackDetection>(r#"{"language": "ruby"}"#);
        assert!(res.is_err());
        assert!("ruby".parse::<Language>().is_err());
    }
}
