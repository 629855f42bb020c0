#![cfg(unix)]

mod common;

use std::time::Duration;

use common::ShellExecutor;
use envsetup_core::executor::{CommandLimits, ExecContext, ExecutorAdapter};
use envsetup_core::ledger::Ledger;
use envsetup_core::plan::{DependencyPlanItem, Language};
use envsetup_core::ErrorKind;

fn ctx(ledger: &Ledger, timeout: Duration) -> ExecContext<'_> {
    ExecContext {
        limits: CommandLimits {
            timeout,
            tail_bytes: 4096,
        },
        attempt_number: 1,
        ledger,
    }
}

#[tokio::test]
async fn reinstall_on_an_installed_tree_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let item = DependencyPlanItem::new(
        Language::Node,
        dir.path(),
        ["mkdir -p node_modules/pkg", "touch node_modules/pkg/index.js"],
    );
    let executor = ShellExecutor {
        language: Language::Node,
    };
    let ledger = Ledger::new("idempotence");

    let first = executor.execute(&item, &ctx(&ledger, Duration::from_secs(10))).await;
    let second = executor.execute(&item, &ctx(&ledger, Duration::from_secs(10))).await;

    assert!(first.is_success());
    assert!(second.is_success());
    assert_eq!(second.error_kind, None);
    assert!(dir.path().join("node_modules/pkg/index.js").exists());
}

#[tokio::test]
async fn slow_command_is_classified_as_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let item = DependencyPlanItem::new(Language::Python, dir.path(), ["sleep 5"]);
    let executor = ShellExecutor {
        language: Language::Python,
    };
    let ledger = Ledger::new("timeout");

    let outcome = executor
        .execute(&item, &ctx(&ledger, Duration::from_millis(200)))
        .await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(outcome.failed_command.as_deref(), Some("sleep 5"));
}

#[tokio::test]
async fn missing_binary_is_classified_as_toolchain_missing() {
    let dir = tempfile::tempdir().unwrap();
    let item = DependencyPlanItem::new(
        Language::Java,
        dir.path(),
        ["definitely-not-a-real-build-tool --version"],
    );
    let executor = ShellExecutor {
        language: Language::Java,
    };
    let ledger = Ledger::new("missing");

    let outcome = executor
        .execute(&item, &ctx(&ledger, Duration::from_secs(10)))
        .await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::ToolchainMissing));
    assert_eq!(outcome.exit_status, Some(127));
}
