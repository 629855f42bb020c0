use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use envsetup_core::ledger::{FinalStatus, OverallStatus};
use envsetup_core::observe::{RunEvent, RunObserver};
use envsetup_core::plan::Language;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

struct Bars {
    multi: MultiProgress,
    overall: ProgressBar,
    items: HashMap<Language, ProgressBar>,
}

/// Progress bars on stderr: one overall bar plus a spinner per running item.
pub struct ProgressRendererPlugin {
    enabled: bool,
    bars: Mutex<Option<Bars>>,
}

impl ProgressRendererPlugin {
    /// With `enabled = false` every event is ignored (non-tty output).
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bars: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Bars>> {
        match self.bars.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn start(&self, planned: usize) {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(planned as u64));
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} items ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        overall.set_style(style);
        overall.set_message("Starting...");
        *self.lock() = Some(Bars {
            multi,
            overall,
            items: HashMap::new(),
        });
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("  {spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

impl RunObserver for ProgressRendererPlugin {
    fn name(&self) -> &str {
        "progress-renderer"
    }

    fn format(&self) -> &str {
        "progress"
    }

    fn render(&self, event: &RunEvent) {
        if !self.enabled {
            return;
        }
        if let RunEvent::RunStart { planned, .. } = event {
            self.start(*planned);
            return;
        }

        let mut guard = self.lock();
        let Some(bars) = guard.as_mut() else {
            return;
        };

        match event {
            RunEvent::ItemStart {
                language,
                index,
                total,
                ..
            } => {
                let bar = bars.multi.add(ProgressBar::new_spinner());
                bar.set_style(spinner_style());
                bar.set_message(format!("⏳ {language}"));
                bar.enable_steady_tick(Duration::from_millis(100));
                bars.items.insert(*language, bar);
                bars.overall.set_message(format!("item {}/{}", index + 1, total));
            }
            RunEvent::Backoff {
                language,
                attempt_number,
                delay_ms,
                ..
            } => {
                if let Some(bar) = bars.items.get(language) {
                    bar.set_message(format!(
                        "🔁 {language} (attempt {attempt_number} failed, retrying in {delay_ms}ms)"
                    ));
                }
            }
            RunEvent::ItemEnd { result, .. } => {
                let icon = match result.final_status {
                    FinalStatus::Succeeded => "✅",
                    FinalStatus::FailedExhausted => "❌",
                    FinalStatus::Skipped => "⏭",
                };
                let msg = format!("{icon} {} ({} attempt(s))", result.language(), result.attempts.len());
                match bars.items.remove(&result.language()) {
                    Some(bar) => bar.finish_with_message(msg),
                    None => {
                        let bar = bars.multi.add(ProgressBar::new_spinner());
                        bar.set_style(spinner_style());
                        bar.finish_with_message(msg);
                    }
                }
                bars.overall.inc(1);
            }
            RunEvent::RunEnd { overall_status, .. } => {
                let msg = match overall_status {
                    OverallStatus::Succeeded => "✅ All items completed",
                    OverallStatus::PartialFailure => "⚠ Completed with failures",
                    OverallStatus::Failed => "❌ Setup failed",
                };
                bars.overall.finish_with_message(msg);
            }
            _ => {}
        }
    }
}
