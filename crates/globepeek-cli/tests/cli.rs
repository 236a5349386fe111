//! End-to-end tests for the `globepeek` binary.
//!
//! Each test starts the in-process fake upstream, points the binary at it
//! through `GLOBEPEEK_*` variables and keeps the session file in a temp dir.
//! The runtime is multi-threaded so the fake keeps serving while the test
//! thread blocks on the child process.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

use globepeek_service_shared::test_utils::{FakeUpstream, PASSWORD};

struct TestEnv {
    upstream: FakeUpstream,
    temp_dir: TempDir,
    session_path: PathBuf,
}

impl TestEnv {
    async fn new() -> Self {
        let upstream = FakeUpstream::spawn().await;
        let temp_dir = TempDir::new().expect("create temp dir");
        let session_path = temp_dir.path().join("session.json");
        Self {
            upstream,
            temp_dir,
            session_path,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("globepeek").expect("binary exists");
        cmd.envs(self.upstream.env())
            .env("GLOBEPEEK_SESSION_FILE", &self.session_path)
            .env("NO_COLOR", "1")
            .env_remove("GLOBEPEEK_THEME")
            .env_remove("GLOBEPEEK_PASSWORD")
            .env_remove("RUST_LOG");
        cmd
    }

    fn login(&self) {
        self.cmd()
            .args(["login", "--email", "u1@example.com", "--password", PASSWORD])
            .assert()
            .success();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn countries_filters_by_region() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["countries", "--region", "Asia"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 countries (page 1 of 1)"))
        .stdout(predicate::str::contains("India (IND)"))
        .stdout(predicate::str::contains("France").not());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn countries_json_output() {
    let env = TestEnv::new().await;

    let output = env
        .cmd()
        .args(["--format", "json", "countries", "--language", "Spanish"])
        .output()
        .expect("run globepeek");
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(body["total_matches"], 1);
    assert_eq!(body["countries"][0]["name"], "Spain");
    assert_eq!(body["regions"], serde_json::json!(["Europe", "Asia"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn countries_rejects_page_zero() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["countries", "--page", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--page starts at 1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn suggest_prints_matching_names() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["suggest", "In"])
        .assert()
        .success()
        .stdout("Spain\nIndia\nBritish Indian Ocean Territory\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn show_prints_every_section() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["show", "France"])
        .assert()
        .success()
        .stdout(predicate::str::contains("France (FRA)"))
        .stdout(predicate::str::contains("Capital:       Paris"))
        .stdout(predicate::str::contains("12.5°C"))
        .stdout(predicate::str::contains("Spain (ESP), Belgium (BEL)"))
        .stdout(predicate::str::contains("Old Town"))
        .stdout(predicate::str::contains("https://www.youtube.com/embed/vid-1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn show_streams_json_events() {
    let env = TestEnv::new().await;

    let output = env
        .cmd()
        .args(["show", "Spain", "--format", "json"])
        .output()
        .expect("run globepeek");
    assert!(output.status.success());

    let events: Vec<Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(events.len(), 6);

    let weather = events
        .iter()
        .find(|e| e["section"] == "weather")
        .expect("weather event");
    assert_eq!(weather["result"]["status"], "failed");
    let country = events
        .iter()
        .find(|e| e["section"] == "country")
        .expect("country event");
    assert_eq!(country["result"]["data"]["code"], "ESP");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn show_unknown_country_fails() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["show", "Atlantis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown country: Atlantis"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_whoami_logout() {
    let env = TestEnv::new().await;

    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));

    env.cmd()
        .args(["login", "--email", "u1@example.com", "--password", PASSWORD])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as u1@example.com (id u1)"));
    assert!(env.session_path.exists());

    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("u1@example.com (id u1)"));

    env.cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out."));
    assert!(!env.session_path.exists());
    assert!(env.upstream.requests().contains(&"logout:u1".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_with_wrong_password_fails() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["login", "--email", "u1@example.com"])
        .env("GLOBEPEEK_PASSWORD", "not-the-password")
        .assert()
        .failure()
        .stderr(predicate::str::contains("sign-in failed"));
    assert!(!env.session_path.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn register_validates_password_locally() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["register", "--email", "new@example.com", "--password", "123"])
        .assert()
        .failure();
    assert!(env.upstream.requests().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn favorites_require_sign_in() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["favorites", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed in"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn favorites_add_list_toggle() {
    let env = TestEnv::new().await;
    env.login();

    env.cmd()
        .args(["favorites", "add", "France"])
        .assert()
        .success()
        .stdout(predicate::str::contains("France added to favorites."));

    env.cmd()
        .args(["favorites", "add", "France"])
        .assert()
        .success()
        .stdout(predicate::str::contains("France is already a favorite."));

    env.cmd()
        .args(["favorites", "toggle", "India"])
        .assert()
        .success();

    env.cmd()
        .args(["favorites", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("France (FRA)"))
        .stdout(predicate::str::contains("India (IND)"));

    env.cmd()
        .args(["favorites", "remove", "France"])
        .assert()
        .success();
    assert_eq!(
        env.upstream.favorites(),
        [("u1".to_string(), "India".to_string())]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn profile_update_and_avatar() {
    let env = TestEnv::new().await;
    env.login();

    env.cmd()
        .args(["profile", "update", "--full-name", "Ada Lovelace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Full name: Ada Lovelace"));

    let avatar = env.temp_dir.path().join("me.png");
    std::fs::write(&avatar, [0x89, b'P', b'N', b'G']).expect("write avatar");
    env.cmd()
        .args(["profile", "avatar"])
        .arg(&avatar)
        .assert()
        .success()
        .stdout(predicate::str::contains("Full name: Ada Lovelace"))
        .stdout(predicate::str::contains("/storage/v1/object/public/avatars/u1.png"));
    assert_eq!(env.upstream.avatars().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribe_twice() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["subscribe", "fan@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subscribed fan@example.com"));

    env.cmd()
        .args(["subscribe", "fan@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already subscribed"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oauth_url_is_printed() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["oauth-url", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/auth/v1/authorize?provider=github"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_theme_is_rejected() {
    let env = TestEnv::new().await;

    env.cmd()
        .args(["--theme", "sepia", "landing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown theme"));
}
