//! One adapter per supported ecosystem. Each runs the plan item's commands
//! through a [`CommandRunner`](envsetup_core::executor::CommandRunner) and
//! applies ecosystem hints before the generic classifier.

mod java;
mod node;
mod python;

pub use java::JavaExecutor;
pub use node::NodeExecutor;
pub use python::PythonExecutor;

use envsetup_core::ErrorKind;
use regex::Regex;

/// First matching rule wins.
pub(crate) fn match_hints(rules: &[(Regex, ErrorKind)], text: &str) -> Option<ErrorKind> {
    rules
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, kind)| *kind)
}

/// Quote a path for `sh -c` / `cmd /C`.
pub(crate) fn quoted(path: &std::path::Path) -> String {
    format!("\"{}\"", path.display())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use envsetup_core::executor::{CommandLimits, CommandOutput, CommandRunner, ExecContext};
    use envsetup_core::ledger::Ledger;

    /// Replays outputs in order, then succeeds.
    pub struct ScriptedRunner {
        outputs: Mutex<VecDeque<CommandOutput>>,
        pub seen: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new(outputs: Vec<CommandOutput>) -> Arc<Self> {
            Arc::new(Self {
                outputs: Mutex::new(outputs.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(stderr: &str) -> Arc<Self> {
            Self::new(vec![CommandOutput::exited(1, "", stderr)])
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn run(&self, command: &str, _cwd: &Path, _limits: &CommandLimits) -> CommandOutput {
            self.seen.lock().unwrap().push(command.to_string());
            self.outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| CommandOutput::exited(0, "", ""))
        }
    }

    pub fn ctx(ledger: &Ledger) -> ExecContext<'_> {
        ExecContext {
            limits: CommandLimits::default(),
            attempt_number: 1,
            ledger,
        }
    }
}
