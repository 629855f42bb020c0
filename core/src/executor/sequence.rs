use super::traits::CommandRunner;
use super::types::{CommandOutput, ExecContext, ExecutionOutcome};
use crate::error::ErrorKind;
use crate::ledger::LedgerEventKind;
use crate::plan::DependencyPlanItem;
use crate::util::tail_str;

fn append_tail(acc: &mut String, chunk: &str, max: usize) {
    if chunk.is_empty() {
        return;
    }
    if !acc.is_empty() && !acc.ends_with('\n') {
        acc.push('\n');
    }
    acc.push_str(chunk);
    if acc.len() > max {
        *acc = tail_str(acc, max);
    }
}

/// Run an item's commands in order in its working directory.
///
/// Stops at the first failing command unless that command is best-effort.
/// `classify` maps the failing command's output onto an [`ErrorKind`].
pub async fn run_command_sequence<C>(
    runner: &dyn CommandRunner,
    item: &DependencyPlanItem,
    ctx: &ExecContext<'_>,
    classify: C,
) -> ExecutionOutcome
where
    C: Fn(&CommandOutput) -> ErrorKind,
{
    let max = ctx.limits.tail_bytes;
    let mut stdout = String::new();
    let mut stderr = String::new();

    for (idx, command) in item.ordered_commands.iter().enumerate() {
        tracing::debug!(
            language = %item.language,
            attempt = ctx.attempt_number,
            step = idx + 1,
            command = %command.run,
            cwd = %item.working_directory.display(),
            "running command"
        );

        let output = runner
            .run(&command.run, &item.working_directory, &ctx.limits)
            .await;
        append_tail(&mut stdout, &output.stdout_tail, max);
        append_tail(&mut stderr, &output.stderr_tail, max);
        ctx.ledger.record_event(LedgerEventKind::CommandFinished {
            language: item.language,
            attempt_number: ctx.attempt_number,
            step: idx + 1,
            command: command.run.clone(),
            success: output.success(),
            best_effort: command.best_effort,
            duration_ms: output.duration_ms,
        });

        if output.success() {
            continue;
        }

        let kind = classify(&output);
        if command.best_effort {
            tracing::warn!(
                language = %item.language,
                command = %command.run,
                error_kind = %kind,
                "best-effort command failed, continuing"
            );
            continue;
        }

        return ExecutionOutcome {
            exit_status: output.exit_code,
            stdout_tail: stdout,
            stderr_tail: stderr,
            error_kind: Some(kind),
            failed_command: Some(command.run.clone()),
        };
    }

    ExecutionOutcome::success(stdout, stderr)
}
