//! Updating a plugin list file end to end

mod helper;

use std::sync::Arc;

use tempfile::TempDir;

use hpi_update::plugins;
use hpi_update::resolve::update::update_plugins_file;
use hpi_update::version::error::{FetchError, ResolveError, UpdateError};

use helper::{FailingUpdateCenter, MockUpdateCenter, test_config};

const DECLARED: &str = r#"
jenkins_plugins:
  - name: git
    version: "4.2.2"
  - name: mailer
    version: "1.30"
    version_lock: true
"#;

const PREVIOUS: &str = "jenkins_plugins:\n- name: git\n  version: 4.0.0\n";

#[tokio::test(flavor = "multi_thread")]
async fn update_writes_resolved_list_and_returns_diff() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("jenkins_plugins_test.yml");
    let dest = dir.path().join("jenkins_plugins_latest.yml");
    std::fs::write(&src, DECLARED).unwrap();
    let source = MockUpdateCenter::new()
        .with_latest("git", "4.3.0", "2.204.1", "")
        .with_release("mailer", "1.30", "2.138.4", "");

    let lines = update_plugins_file(Arc::new(source), &test_config("2.222.2"), &src, &dest)
        .await
        .unwrap();

    let lines: Vec<String> = lines.iter().map(ToString::to_string).collect();
    assert_eq!(lines, vec!["git: 4.2.2 -> 4.3.0", "mailer: o 1.30"]);
    let written = plugins::read(&dest).unwrap();
    assert_eq!(written.jenkins_plugins.len(), 2);
    assert_eq!(written.jenkins_plugins[0].version.as_deref(), Some("4.3.0"));
    assert!(written.jenkins_plugins[1].version_lock);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_leaves_existing_destination_untouched() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("jenkins_plugins_test.yml");
    let dest = dir.path().join("jenkins_plugins_latest.yml");
    std::fs::write(&src, DECLARED).unwrap();
    std::fs::write(&dest, PREVIOUS).unwrap();

    let result = update_plugins_file(
        Arc::new(FailingUpdateCenter { status: 500 }),
        &test_config("2.222.2"),
        &src,
        &dest,
    )
    .await;

    assert!(matches!(
        result,
        Err(UpdateError::Resolve(ResolveError::Fetch(
            FetchError::UnexpectedStatus { status: 500, .. }
        )))
    ));
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), PREVIOUS);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_creates_no_destination() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("jenkins_plugins_test.yml");
    let dest = dir.path().join("jenkins_plugins_latest.yml");
    std::fs::write(&src, DECLARED).unwrap();

    let result = update_plugins_file(
        Arc::new(FailingUpdateCenter { status: 503 }),
        &test_config("2.222.2"),
        &src,
        &dest,
    )
    .await;

    assert!(result.is_err());
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_source_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("missing.yml");
    let dest = dir.path().join("jenkins_plugins_latest.yml");

    let result = update_plugins_file(
        Arc::new(MockUpdateCenter::new()),
        &test_config("2.222.2"),
        &src,
        &dest,
    )
    .await;

    assert!(matches!(result, Err(UpdateError::PluginsFile(_))));
    assert!(!dest.exists());
}
