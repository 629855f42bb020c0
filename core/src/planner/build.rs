use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use crate::error::EngineError;
use crate::plan::{DependencyAnalysis, DependencyPlanItem, Language, StackDetection};

/// Execution order by language. Unlisted languages run after listed ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePriority {
    order: Vec<Language>,
}

impl Default for LanguagePriority {
    fn default() -> Self {
        Self::new(vec![Language::Java, Language::Python, Language::Node])
    }
}

impl LanguagePriority {
    /// Later duplicates are ignored.
    pub fn new(order: Vec<Language>) -> Self {
        let mut seen = HashSet::new();
        let order = order.into_iter().filter(|l| seen.insert(*l)).collect();
        Self { order }
    }

    pub fn rank(&self, language: Language) -> usize {
        self.order
            .iter()
            .position(|l| *l == language)
            .unwrap_or(self.order.len())
    }

    pub fn languages(&self) -> &[Language] {
        &self.order
    }
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn escapes(relative: &Path) -> bool {
    let mut depth = 0i32;
    for comp in relative.components() {
        match comp {
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            Component::Normal(_) => depth += 1,
            _ => {}
        }
    }
    false
}

fn resolve_working_directory(
    item: &DependencyPlanItem,
    project_root: Option<&Path>,
) -> Result<PathBuf, EngineError> {
    let dir = &item.working_directory;
    let escape = || EngineError::WorkingDirectoryEscape {
        language: item.language,
        path: dir.display().to_string(),
    };

    if dir.is_relative() {
        if escapes(dir) {
            return Err(escape());
        }
        let dir = normalize(dir);
        return Ok(match project_root {
            Some(root) => normalize(&root.join(dir)),
            None => dir,
        });
    }

    let dir = normalize(dir);
    if let Some(root) = project_root.filter(|r| r.is_absolute()) {
        if !dir.starts_with(normalize(root)) {
            return Err(escape());
        }
    }
    Ok(dir)
}

fn validate(item: &DependencyPlanItem) -> Result<(), EngineError> {
    if item.ordered_commands.is_empty() {
        return Err(EngineError::EmptyCommands(item.language));
    }
    if let Some(index) = item
        .ordered_commands
        .iter()
        .position(|c| c.run.trim().is_empty())
    {
        return Err(EngineError::BlankCommand {
            language: item.language,
            index,
        });
    }
    Ok(())
}

/// Order the analyzer's items for execution.
///
/// Items for languages the scanner did not detect are dropped. The sort is
/// stable: priority rank first, then the index of the language's first
/// detection.
pub fn build_plan(
    detections: &[StackDetection],
    analysis: &DependencyAnalysis,
    project_root: Option<&Path>,
    priority: &LanguagePriority,
) -> Result<Vec<DependencyPlanItem>, EngineError> {
    if detections.is_empty() || analysis.is_empty() {
        tracing::info!("nothing to plan");
        return Ok(Vec::new());
    }

    let mut first_seen: HashMap<Language, (usize, &StackDetection)> = HashMap::new();
    for (idx, detection) in detections.iter().enumerate() {
        first_seen.entry(detection.language).or_insert((idx, detection));
    }

    let mut languages = HashSet::new();
    let mut plan = Vec::with_capacity(analysis.items.len());
    for item in &analysis.items {
        let Some((_, detection)) = first_seen.get(&item.language) else {
            tracing::warn!(language = %item.language, "dropping plan item for undetected language");
            continue;
        };
        validate(item)?;
        if !languages.insert(item.language) {
            return Err(EngineError::DuplicateLanguage(item.language));
        }

        let mut item = item.clone();
        item.working_directory = resolve_working_directory(&item, project_root)?;
        if item.package_manager.is_none() {
            item.package_manager = detection.package_manager.clone();
        }
        plan.push(item);
    }

    plan.sort_by_key(|item| {
        let discovered = first_seen
            .get(&item.language)
            .map(|(idx, _)| *idx)
            .unwrap_or(usize::MAX);
        (priority.rank(item.language), discovered)
    });

    tracing::info!(
        items = plan.len(),
        order = ?plan.iter().map(|i| i.language).collect::<Vec<_>>(),
        "plan built"
    );
    Ok(plan)
}
