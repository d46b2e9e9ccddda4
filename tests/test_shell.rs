//! Integration tests for session handling and upload staging.
//!
//! Tests cover:
//! - Login/signup flows updating the session
//! - The upload extension gate
//! - Staged uploads being removed on every exit path

mod common;

use common::*;
use helmetscan::shell::{Accounts, Analyzer, Session, ShellError, accepted_extension};

fn staged_files(dir: &tempfile::TempDir) -> usize {
    std::fs::read_dir(dir.path()).expect("read staging dir").count()
}

async fn logged_in_session() -> (Session, CredentialDb, tempfile::TempDir) {
    let (store, temp_dir) = create_test_store().await;
    let accounts = Accounts::new(store);
    let mut session = Session::new();
    assert!(
        accounts
            .signup(&mut session, "alice", "pw1")
            .await
            .expect("signup")
    );
    let store = CredentialDb::new(accounts.store().db_file());
    (session, store, temp_dir)
}

#[tokio::test]
async fn test_signup_logs_in_and_logout_clears() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;
    let accounts = Accounts::new(store);
    let mut session = Session::new();
    assert!(!session.is_logged_in());

    assert!(accounts.signup(&mut session, "alice", "pw1").await?);
    assert_eq!(session.username(), Some("alice"));

    session.logout();
    assert!(!session.is_logged_in());
    assert_eq!(session.username(), None);

    Ok(())
}

#[tokio::test]
async fn test_failed_auth_leaves_session_logged_out() -> anyhow::Result<()> {
    let (store, _temp_dir) = create_test_store().await;
    assert!(store.create("alice", "pw1").await?);
    let accounts = Accounts::new(store);
    let mut session = Session::new();

    assert!(!accounts.signup(&mut session, "alice", "other").await?);
    assert!(!session.is_logged_in());

    assert!(!accounts.login(&mut session, "alice", "wrong").await?);
    assert!(!accounts.login(&mut session, "bob", "pw1").await?);
    assert!(!session.is_logged_in());

    assert!(accounts.login(&mut session, "alice", "pw1").await?);
    assert_eq!(session.username(), Some("alice"));

    Ok(())
}

#[test]
fn test_extension_gate() {
    assert_eq!(accepted_extension("site.jpg").unwrap(), "jpg");
    assert_eq!(accepted_extension("site.JPEG").unwrap(), "jpeg");
    assert_eq!(accepted_extension("a.b.png").unwrap(), "png");
    assert_eq!(accepted_extension("photo.WebP").unwrap(), "webp");
    assert!(matches!(accepted_extension("photo.gif"), Err(ShellError::UnsupportedFormat(_))));
    assert!(matches!(accepted_extension("png"), Err(ShellError::UnsupportedFormat(_))));
    assert!(matches!(accepted_extension(""), Err(ShellError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_upload_requires_login() -> anyhow::Result<()> {
    let staging = tempfile::TempDir::new()?;
    let engine = ScriptedEngine::new(vec![]);
    let analyzer = Analyzer::new(pipeline_with(engine.clone())).with_staging_dir(staging.path());

    let result = analyzer
        .analyze_upload(&Session::new(), "site.png", &test_image_bytes())
        .await;

    assert!(matches!(result, Err(ShellError::NotLoggedIn)));
    assert_eq!(engine.calls(), 0);
    assert_eq!(staged_files(&staging), 0);

    Ok(())
}

#[tokio::test]
async fn test_unsupported_upload_is_rejected_before_staging() -> anyhow::Result<()> {
    let (session, _store, _temp_dir) = logged_in_session().await;
    let staging = tempfile::TempDir::new()?;
    let engine = ScriptedEngine::new(vec![]);
    let analyzer = Analyzer::new(pipeline_with(engine.clone())).with_staging_dir(staging.path());

    let result = analyzer
        .analyze_upload(&session, "site.gif", &test_image_bytes())
        .await;

    assert!(matches!(result, Err(ShellError::UnsupportedFormat(_))));
    assert_eq!(engine.calls(), 0);
    assert_eq!(staged_files(&staging), 0);

    Ok(())
}

#[tokio::test]
async fn test_successful_upload_removes_staged_file() -> anyhow::Result<()> {
    let (session, _store, _temp_dir) = logged_in_session().await;
    let staging = tempfile::TempDir::new()?;
    let engine = ScriptedEngine::new(vec![raw(0, 0.91, [10.0, 10.0, 50.0, 50.0])]);
    let analyzer = Analyzer::new(pipeline_with(engine.clone())).with_staging_dir(staging.path());

    let result = analyzer
        .analyze_upload(&session, "Site.PNG", &test_image_bytes())
        .await?;

    assert_eq!(result.detections, vec!["helmet 0.91"]);
    assert_eq!(engine.calls(), 1);
    assert_eq!(staged_files(&staging), 0);

    Ok(())
}

#[tokio::test]
async fn test_failed_upload_removes_staged_file() -> anyhow::Result<()> {
    let (session, _store, _temp_dir) = logged_in_session().await;
    let staging = tempfile::TempDir::new()?;
    let engine = ScriptedEngine::new(vec![]);
    let analyzer = Analyzer::new(pipeline_with(engine.clone())).with_staging_dir(staging.path());

    let err = analyzer
        .analyze_upload(&session, "site.jpg", b"not an image at all")
        .await
        .unwrap_err();

    assert!(matches!(err, ShellError::Detection(DetectError::InvalidImage { .. })));
    assert!(err.user_message().starts_with("Error processing image: "));
    assert_eq!(engine.calls(), 0);
    assert_eq!(staged_files(&staging), 0);

    Ok(())
}

#[tokio::test]
async fn test_class_index_failure_removes_staged_file() -> anyhow::Result<()> {
    let (session, _store, _temp_dir) = logged_in_session().await;
    let staging = tempfile::TempDir::new()?;
    let engine = ScriptedEngine::new(vec![raw(9, 0.91, [10.0, 10.0, 50.0, 50.0])]);
    let analyzer = Analyzer::new(pipeline_with(engine)).with_staging_dir(staging.path());

    let err = analyzer
        .analyze_upload(&session, "site.webp", &test_image_bytes())
        .await
        .unwrap_err();

    assert!(matches!(err, ShellError::Detection(DetectError::ClassIndex { index: 9, .. })));
    assert_eq!(staged_files(&staging), 0);

    Ok(())
}

#[test]
fn test_not_logged_in_message_is_not_prefixed() {
    assert_eq!(
        ShellError::NotLoggedIn.user_message(),
        "Please log in or sign up to use the app."
    );
}
