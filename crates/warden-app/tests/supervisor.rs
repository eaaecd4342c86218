use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use httpmock::MockServer;
use httpmock::prelude::*;
use serde_json::json;
use tracing::instrument::WithSubscriber;
use tracing_subscriber::fmt::MakeWriter;
use warden_app::{AppError, LaunchError, run_with_env};
use warden_assets::{AssetError, RemoteFailureKind, StoreError};
use warden_config::ConfigError;
use warden_health::ShutdownSignal;
use warden_test_support::fixtures::{
    MALFORMED_TOKEN, VALID_TOKEN, Workspace, base_env, with_remote_asset,
};

/// Worker body that records it ran by touching `ran` in the workspace.
fn marker_body(workspace: &Workspace) -> String {
    format!("touch '{}'\nexit 0", workspace.path().join("ran").display())
}

fn supervised_env(workspace: &Workspace, entrypoint: &Path) -> HashMap<String, String> {
    let mut env = base_env();
    env.insert(
        "COOKIES_DIR".to_string(),
        workspace.cookies_dir().display().to_string(),
    );
    env.insert("WORKER_INTERPRETER".to_string(), "sh".to_string());
    env.insert(
        "WORKER_ENTRYPOINT".to_string(),
        entrypoint.display().to_string(),
    );
    env.insert("KEEP_ALIVE".to_string(), "off".to_string());
    env
}

fn worker_ran(workspace: &Workspace) -> bool {
    workspace.path().join("ran").exists()
}

/// In-memory sink for the formatted log output of one supervisor run.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish()
    }

    fn lines_with(&self, message: &str) -> Vec<String> {
        let contents = self
            .0
            .lock()
            .map(|buffer| String::from_utf8_lossy(&buffer).into_owned())
            .unwrap_or_default();
        contents
            .lines()
            .filter(|line| line.contains(message))
            .map(str::to_string)
            .collect()
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn asset_failure(err: &AppError) -> Option<RemoteFailureKind> {
    match err {
        AppError::Asset { source, .. } => source.remote_failure().map(|failure| failure.kind),
        _ => None,
    }
}

#[tokio::test]
async fn local_mode_launches_worker_without_network() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.seed_cookies(None)?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;

    let outcome = run_with_env(&supervised_env(&workspace, &script), ShutdownSignal::new()).await?;

    assert_eq!(outcome.exit_code, 0);
    assert!(worker_ran(&workspace));
    Ok(())
}

#[tokio::test]
async fn missing_credential_directory_is_fatal() -> Result<()> {
    let workspace = Workspace::new()?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;

    let err = run_with_env(&supervised_env(&workspace, &script), ShutdownSignal::new())
        .await
        .err();

    assert!(matches!(
        err,
        Some(AppError::Store {
            source: StoreError::DirectoryNotFound { .. },
            ..
        })
    ));
    assert!(!worker_ran(&workspace));
    Ok(())
}

#[tokio::test]
async fn partial_remote_configuration_is_rejected() -> Result<()> {
    let workspace = Workspace::new()?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let mut env = supervised_env(&workspace, &script);
    env.insert("GITHUB_TOKEN".to_string(), VALID_TOKEN.to_string());

    let err = run_with_env(&env, ShutdownSignal::new()).await.err();

    match err {
        Some(AppError::Config {
            source: ConfigError::PartialGroupConfig { missing, .. },
            ..
        }) => assert_eq!(missing, vec!["CJ_OWNER", "CJ_REPO", "CJ_FILE"]),
        other => bail!("expected partial group error, got {other:?}"),
    }
    assert!(!worker_ran(&workspace));
    Ok(())
}

#[tokio::test]
async fn malformed_token_halts_before_launch() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.seed_cookies(Some("session.pkl"))?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let mut env = with_remote_asset(
        supervised_env(&workspace, &script),
        MALFORMED_TOKEN,
        "session.pkl",
    );
    // Nothing listens here: only a local token check can produce the failure.
    env.insert("GITHUB_API_URL".to_string(), "http://127.0.0.1:1".to_string());

    let err = run_with_env(&env, ShutdownSignal::new())
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected failure"))?;

    assert_eq!(
        asset_failure(&err),
        Some(RemoteFailureKind::InvalidTokenFormat)
    );
    assert!(!worker_ran(&workspace));
    Ok(())
}

#[tokio::test]
async fn continue_policy_falls_back_to_local_credentials() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.seed_cookies(Some("session.pkl"))?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let mut env = with_remote_asset(
        supervised_env(&workspace, &script),
        MALFORMED_TOKEN,
        "vault/session.pkl",
    );
    env.insert("GITHUB_API_URL".to_string(), "http://127.0.0.1:1".to_string());
    env.insert("ON_FETCH_FAILURE".to_string(), "continue".to_string());

    let outcome = run_with_env(&env, ShutdownSignal::new()).await?;

    assert_eq!(outcome.exit_code, 0);
    assert!(worker_ran(&workspace));
    Ok(())
}

#[tokio::test]
async fn continue_policy_still_requires_expected_file() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.seed_cookies(None)?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let mut env = with_remote_asset(
        supervised_env(&workspace, &script),
        MALFORMED_TOKEN,
        "session.pkl",
    );
    env.insert("GITHUB_API_URL".to_string(), "http://127.0.0.1:1".to_string());
    env.insert("ON_FETCH_FAILURE".to_string(), "continue".to_string());

    let err = run_with_env(&env, ShutdownSignal::new()).await.err();

    assert!(matches!(
        err,
        Some(AppError::Store {
            source: StoreError::FileNotFound { .. },
            ..
        })
    ));
    assert!(!worker_ran(&workspace));
    Ok(())
}

#[tokio::test]
async fn remote_bundle_is_fetched_before_launch() -> Result<()> {
    let server = MockServer::start_async().await;
    let download_url = format!("{}/raw/session.pkl", server.base_url());
    let identity = server.mock(|when, then| {
        when.method(GET).path("/user");
        then.status(200).json_body(json!({ "login": "miner" }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/owner/vault/contents/session.pkl");
        then.status(200).json_body(json!({
            "name": "session.pkl",
            "download_url": download_url,
        }));
    });
    let download = server.mock(|when, then| {
        when.method(GET).path("/raw/session.pkl");
        then.status(200).body("fresh-session");
    });

    let workspace = Workspace::new()?;
    let cookie = workspace.cookies_dir().join("session.pkl");
    let script = workspace.worker_script(
        "run.sh",
        &format!("test -f '{}' || exit 9\nexit 0", cookie.display()),
    )?;
    let mut env = with_remote_asset(
        supervised_env(&workspace, &script),
        VALID_TOKEN,
        "session.pkl",
    );
    env.insert("GITHUB_API_URL".to_string(), server.base_url());

    let outcome = run_with_env(&env, ShutdownSignal::new()).await?;

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(std::fs::read(&cookie)?, b"fresh-session");
    identity.assert();
    download.assert();
    Ok(())
}

#[tokio::test]
async fn missing_remote_file_halts_by_default() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/user");
        then.status(200).json_body(json!({ "login": "miner" }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/owner/vault/contents/session.pkl");
        then.status(404);
    });

    let workspace = Workspace::new()?;
    workspace.seed_cookies(Some("session.pkl"))?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let mut env = with_remote_asset(
        supervised_env(&workspace, &script),
        VALID_TOKEN,
        "session.pkl",
    );
    env.insert("GITHUB_API_URL".to_string(), server.base_url());

    let err = run_with_env(&env, ShutdownSignal::new())
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected failure"))?;

    assert_eq!(asset_failure(&err), Some(RemoteFailureKind::AssetNotFound));
    assert!(!worker_ran(&workspace));
    Ok(())
}

#[tokio::test]
async fn rejected_token_halts_by_default() -> Result<()> {
    let server = MockServer::start_async().await;
    let identity = server.mock(|when, then| {
        when.method(GET).path("/user");
        then.status(401);
    });

    let workspace = Workspace::new()?;
    workspace.seed_cookies(Some("session.pkl"))?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let mut env = with_remote_asset(
        supervised_env(&workspace, &script),
        VALID_TOKEN,
        "session.pkl",
    );
    env.insert("GITHUB_API_URL".to_string(), server.base_url());

    let err = run_with_env(&env, ShutdownSignal::new())
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected failure"))?;

    assert_eq!(asset_failure(&err), Some(RemoteFailureKind::AuthInvalid));
    assert!(matches!(
        err,
        AppError::Asset {
            operation: "assets.validate_token",
            source: AssetError::Remote(_),
        }
    ));
    identity.assert();
    assert!(!worker_ran(&workspace));
    Ok(())
}

#[tokio::test]
async fn worker_failure_carries_exit_code_and_stderr() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.seed_cookies(None)?;
    let script = workspace.worker_script("run.sh", "echo 'login refused' >&2\nexit 4")?;

    let err = run_with_env(&supervised_env(&workspace, &script), ShutdownSignal::new())
        .await
        .err();

    match err {
        Some(AppError::Launch {
            source:
                LaunchError::WorkerFailure {
                    exit_code,
                    stderr_tail,
                },
            ..
        }) => {
            assert_eq!(exit_code, Some(4));
            assert_eq!(stderr_tail, vec!["login refused".to_string()]);
        }
        other => bail!("expected worker failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn missing_entrypoint_is_fatal() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.seed_cookies(None)?;
    let entrypoint = workspace.path().join("absent.py");

    let err = run_with_env(
        &supervised_env(&workspace, &entrypoint),
        ShutdownSignal::new(),
    )
    .await
    .err();

    assert!(matches!(
        err,
        Some(AppError::Launch {
            source: LaunchError::EntrypointMissing { .. },
            ..
        })
    ));
    Ok(())
}

#[tokio::test]
async fn invalid_worker_profile_blocks_launch() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.seed_cookies(None)?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let profile = workspace.profile("username: miner\nstreamers: []\n")?;
    let mut env = supervised_env(&workspace, &script);
    env.insert(
        "WORKER_PROFILE".to_string(),
        profile.display().to_string(),
    );

    let err = run_with_env(&env, ShutdownSignal::new()).await.err();

    assert!(matches!(
        err,
        Some(AppError::Config {
            operation: "profile.load",
            ..
        })
    ));
    assert!(!worker_ran(&workspace));
    Ok(())
}

#[tokio::test]
async fn health_service_runs_alongside_and_stops_afterwards() -> Result<()> {
    let port = {
        let reserved = std::net::TcpListener::bind("127.0.0.1:0")?;
        reserved.local_addr()?.port()
    };
    let workspace = Workspace::new()?;
    workspace.seed_cookies(None)?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let mut env = supervised_env(&workspace, &script);
    env.insert("KEEP_ALIVE".to_string(), "on".to_string());
    env.insert("HOST".to_string(), "127.0.0.1".to_string());
    env.insert("PORT".to_string(), port.to_string());

    let signal = ShutdownSignal::new();
    let outcome = run_with_env(&env, signal.clone()).await?;

    assert_eq!(outcome.exit_code, 0);
    assert!(signal.is_requested());
    assert!(std::net::TcpStream::connect(("127.0.0.1", port)).is_err());
    Ok(())
}

#[tokio::test]
async fn occupied_health_port_does_not_block_launch() -> Result<()> {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = occupied.local_addr()?.port();
    let workspace = Workspace::new()?;
    workspace.seed_cookies(None)?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let mut env = supervised_env(&workspace, &script);
    env.insert("KEEP_ALIVE".to_string(), "on".to_string());
    env.insert("HOST".to_string(), "127.0.0.1".to_string());
    env.insert("PORT".to_string(), port.to_string());

    let logs = CapturedLogs::default();
    let outcome = run_with_env(&env, ShutdownSignal::new())
        .with_subscriber(logs.subscriber())
        .await?;

    assert_eq!(outcome.exit_code, 0);
    assert!(worker_ran(&workspace));
    let failures = logs.lines_with("keep-alive service failed to start");
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("ERROR"));
    assert!(failures[0].contains(&format!("port={port}")));
    drop(occupied);
    Ok(())
}

#[tokio::test]
async fn worker_failure_logs_the_stderr_tail() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.seed_cookies(None)?;
    let script = workspace.worker_script(
        "run.sh",
        "echo 'connecting' >&2\necho 'login refused' >&2\nexit 4",
    )?;

    let logs = CapturedLogs::default();
    let result = run_with_env(&supervised_env(&workspace, &script), ShutdownSignal::new())
        .with_subscriber(logs.subscriber())
        .await;

    assert!(result.is_err());
    let reports = logs.lines_with("worker exited unsuccessfully");
    let report = reports
        .iter()
        .find(|line| line.contains("ERROR"))
        .ok_or_else(|| anyhow::anyhow!("no error report in {reports:?}"))?;
    assert!(report.contains("exit_code=Some(4)"));
    assert!(report.contains("stderr_tail=connecting"));
    assert!(logs.lines_with("login refused").len() >= 2);
    Ok(())
}

#[tokio::test]
async fn worker_profile_settings_are_resolved_per_streamer() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.seed_cookies(None)?;
    let script = workspace.worker_script("run.sh", &marker_body(&workspace))?;
    let profile = workspace.profile(
        "username: miner\nstreamer_defaults:\n  claim_drops: true\n  chat: online\nstreamers:\n  - name: warframe\n    settings:\n      chat: always\n  - ralumyst\n",
    )?;
    let mut env = supervised_env(&workspace, &script);
    env.insert(
        "WORKER_PROFILE".to_string(),
        profile.display().to_string(),
    );

    let logs = CapturedLogs::default();
    let outcome = run_with_env(&env, ShutdownSignal::new())
        .with_subscriber(logs.subscriber())
        .await?;

    assert_eq!(outcome.exit_code, 0);
    let resolved = logs.lines_with("streamer settings resolved");
    assert_eq!(resolved.len(), 2);
    assert!(resolved[0].contains("warframe"));
    assert!(resolved[0].contains("chat=Always"));
    assert!(resolved[0].contains("claim_drops=true"));
    assert!(resolved[1].contains("ralumyst"));
    assert!(resolved[1].contains("chat=Online"));
    Ok(())
}
