//! End-to-end CLI integration tests for the `strata` binary.
//!
//! Each test creates its own temporary project directory and exercises the
//! `strata` binary as a subprocess via `assert_cmd`.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` targeting the cargo-built `strata` binary, isolated
/// from any `STRATA_*` settings in the caller's environment.
fn strata() -> Command {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    for var in [
        "STRATA_CONFIG",
        "STRATA_ENV",
        "STRATA_DATABASE",
        "STRATA_MIGRATIONS",
        "STRATA_TABLE",
        "STRATA_VERIFY_CHECKSUMS",
        "STRATA_ALLOW_OUT_OF_ORDER",
        "RUST_LOG",
        "CLICOLOR_FORCE",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Initialize a fresh project in a temp directory and return the handle.
fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    strata()
        .args(["init", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();
    tmp
}

fn write_migration(dir: &Path, file: &str, sql: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(file), sql).unwrap();
}

/// Three reversible migrations: users, posts, comments.
fn write_standard_migrations(dir: &Path) {
    write_migration(dir, "1_create_users.up.sql", "CREATE TABLE users (id INTEGER PRIMARY KEY);");
    write_migration(dir, "1_create_users.down.sql", "DROP TABLE users;");
    write_migration(dir, "2_create_posts.up.sql", "CREATE TABLE posts (id INTEGER PRIMARY KEY);");
    write_migration(dir, "2_create_posts.down.sql", "DROP TABLE posts;");
    write_migration(
        dir,
        "3_create_comments.up.sql",
        "CREATE TABLE comments (id INTEGER PRIMARY KEY);",
    );
    write_migration(dir, "3_create_comments.down.sql", "DROP TABLE comments;");
}

/// Versions recorded in the history table of `db`.
fn applied_versions(db: &Path) -> Vec<String> {
    let conn = rusqlite::Connection::open(db).unwrap();
    let mut stmt = conn
        .prepare("SELECT version FROM schema_migration ORDER BY CAST(version AS INTEGER)")
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn table_exists(db: &Path, name: &str) -> bool {
    let conn = rusqlite::Connection::open(db).unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}

fn dev_db(tmp: &TempDir) -> std::path::PathBuf {
    tmp.path().join("db").join("development.sqlite3")
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_config_and_migrations_dir() {
    let tmp = init_project();
    let config = fs::read_to_string(tmp.path().join("strata.yaml")).unwrap();
    assert!(config.contains("db/development.sqlite3"));
    assert!(config.contains("schema_migration"));
    assert!(tmp.path().join("migrations").is_dir());
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let tmp = init_project();
    strata()
        .arg("init")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already initialized"));

    strata()
        .args(["init", "--force", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// migrate up
// ---------------------------------------------------------------------------

#[test]
fn up_with_step_applies_only_that_many() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));

    strata()
        .args(["migrate", "up", "--step=2"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("> 1_create_users.up.sql"))
        .stdout(predicate::str::contains("> 2_create_posts.up.sql"))
        .stdout(predicate::str::contains("3_create_comments").not())
        .stdout(predicate::str::contains("Successfully applied 2 migrations."));

    assert_eq!(applied_versions(&dev_db(&tmp)), vec!["1", "2"]);
    assert!(!table_exists(&dev_db(&tmp), "comments"));

    strata()
        .args(["migrate", "up", "-s", "0"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("> 3_create_comments.up.sql"))
        .stdout(predicate::str::contains("Successfully applied 1 migrations."));

    assert_eq!(applied_versions(&dev_db(&tmp)), vec!["1", "2", "3"]);
}

#[test]
fn up_when_nothing_pending_reports_up_to_date() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));

    strata()
        .args(["migrate", "up"])
        .current_dir(tmp.path())
        .assert()
        .success();

    strata()
        .args(["migrate", "up"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Migrations already up to date, nothing to apply.",
        ));
}

#[test]
fn bare_migrate_applies_everything() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));

    strata()
        .arg("migrate")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully applied 3 migrations."));

    assert!(table_exists(&dev_db(&tmp), "comments"));
}

#[test]
fn negative_step_applies_everything() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));

    strata()
        .args(["migrate", "up", "--step=-1"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully applied 3 migrations."));

    assert_eq!(applied_versions(&dev_db(&tmp)), vec!["1", "2", "3"]);
}

#[test]
fn failing_migration_keeps_earlier_ones_and_exits_1() {
    let tmp = init_project();
    let dir = tmp.path().join("migrations");
    write_migration(&dir, "1_create_users.up.sql", "CREATE TABLE users (id INTEGER);");
    write_migration(
        &dir,
        "2_broken.up.sql",
        "CREATE TABLE half (id INTEGER); INSERT INTO missing VALUES (1);",
    );
    write_migration(&dir, "3_never.up.sql", "CREATE TABLE never (id INTEGER);");

    strata()
        .args(["migrate", "up"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: "))
        .stderr(predicate::str::contains("2_broken.up.sql"));

    assert_eq!(applied_versions(&dev_db(&tmp)), vec!["1"]);
    assert!(!table_exists(&dev_db(&tmp), "half"));
    assert!(!table_exists(&dev_db(&tmp), "never"));
}

#[test]
fn out_of_order_migration_needs_flag() {
    let tmp = init_project();
    let dir = tmp.path().join("migrations");
    write_migration(&dir, "1_a.up.sql", "CREATE TABLE a (id INTEGER);");
    write_migration(&dir, "3_c.up.sql", "CREATE TABLE c (id INTEGER);");

    strata()
        .args(["migrate", "up"])
        .current_dir(tmp.path())
        .assert()
        .success();

    // A teammate's older migration lands after ours was applied.
    write_migration(&dir, "2_b.up.sql", "CREATE TABLE b (id INTEGER);");

    strata()
        .args(["migrate", "up"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--allow-out-of-order"));

    strata()
        .args(["migrate", "up", "--allow-out-of-order"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("> 2_b.up.sql"));

    assert_eq!(applied_versions(&dev_db(&tmp)), vec!["1", "2", "3"]);
}

#[test]
fn edited_applied_migration_blocks_up() {
    let tmp = init_project();
    let dir = tmp.path().join("migrations");
    write_migration(&dir, "1_a.up.sql", "CREATE TABLE a (id INTEGER);");

    strata()
        .args(["migrate", "up"])
        .current_dir(tmp.path())
        .assert()
        .success();

    write_migration(&dir, "1_a.up.sql", "CREATE TABLE a (id INTEGER, name TEXT);");

    strata()
        .args(["migrate", "up"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("checksum mismatch"));
}

// ---------------------------------------------------------------------------
// Connection and path resolution
// ---------------------------------------------------------------------------

#[test]
fn missing_database_is_reported() {
    let tmp = TempDir::new().unwrap();
    write_standard_migrations(&tmp.path().join("migrations"));

    strata()
        .args(["migrate", "up"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "no database configured for environment 'development'",
        ));
}

#[test]
fn missing_migration_dir_is_reported() {
    let tmp = init_project();
    strata()
        .args(["migrate", "up", "-p", "nowhere"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("migration directory not found"));
    assert!(!dev_db(&tmp).exists());
    assert!(!tmp.path().join("db").exists());
}

#[test]
fn json_errors_are_objects() {
    let tmp = TempDir::new().unwrap();
    let output = strata()
        .args(["migrate", "up", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert!(json["error"].as_str().unwrap().contains("no database configured"));
}

#[test]
fn database_and_path_flags_work_without_config() {
    let tmp = TempDir::new().unwrap();
    write_standard_migrations(&tmp.path().join("sql"));

    strata()
        .args(["--database", "app.db", "-p", "sql", "migrate", "up", "-s", "1"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully applied 1 migrations."));

    assert_eq!(applied_versions(&tmp.path().join("app.db")), vec!["1"]);
}

#[test]
fn environment_flag_selects_database() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));

    strata()
        .args(["migrate", "up", "-e", "test", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(tmp.path().join("db").join("test.sqlite3").exists());
    assert!(!dev_db(&tmp).exists());
}

#[test]
fn env_var_overrides_database() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));

    strata()
        .args(["migrate", "up", "--quiet"])
        .env("STRATA_DATABASE", "from_env.db")
        .current_dir(tmp.path())
        .assert()
        .success();

    assert_eq!(
        applied_versions(&tmp.path().join("from_env.db")),
        vec!["1", "2", "3"]
    );
}

#[test]
fn runs_from_a_subdirectory() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));
    let nested = tmp.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();

    strata()
        .args(["migrate", "up", "--quiet"])
        .current_dir(&nested)
        .assert()
        .success();

    assert_eq!(applied_versions(&dev_db(&tmp)), vec!["1", "2", "3"]);
}

// ---------------------------------------------------------------------------
// down / reset / status / create
// ---------------------------------------------------------------------------

#[test]
fn down_reverts_one_by_default_and_all_with_zero() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));
    strata()
        .args(["migrate", "up", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();

    strata()
        .args(["migrate", "down"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("< 3_create_comments.down.sql"))
        .stdout(predicate::str::contains("Successfully reverted 1 migrations."));
    assert_eq!(applied_versions(&dev_db(&tmp)), vec!["1", "2"]);
    assert!(!table_exists(&dev_db(&tmp), "comments"));

    strata()
        .args(["migrate", "down", "--step", "0"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully reverted 2 migrations."));
    assert!(applied_versions(&dev_db(&tmp)).is_empty());
    assert!(!table_exists(&dev_db(&tmp), "users"));
}

#[test]
fn reset_reverts_and_reapplies() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));
    strata()
        .args(["migrate", "up", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = strata()
        .args(["migrate", "reset", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["down"]["reverted"].as_array().unwrap().len(), 3);
    assert_eq!(json["up"]["applied"].as_array().unwrap().len(), 3);
    assert_eq!(applied_versions(&dev_db(&tmp)), vec!["1", "2", "3"]);
}

#[test]
fn status_json_lists_states() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));
    strata()
        .args(["migrate", "up", "-s", "1", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let output = strata()
        .args(["migrate", "status", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let states: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["applied", "pending", "pending"]);
    assert_eq!(json[0]["version"], "1");
    assert!(json[0]["applied_at"].is_string());
    assert!(json[1].get("applied_at").is_none());
}

#[test]
fn status_table_is_human_readable() {
    let tmp = init_project();
    write_standard_migrations(&tmp.path().join("migrations"));
    strata()
        .args(["migrate", "up", "-s", "2", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();

    strata()
        .args(["migrate", "status"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("VERSION"))
        .stdout(predicate::str::contains("create_comments"))
        .stdout(predicate::str::contains("2 applied, 1 pending"));
}

#[test]
fn create_writes_up_and_down_files() {
    let tmp = init_project();

    let output = strata()
        .args(["migrate", "create", "Add Users Table", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "add_users_table");

    let mut files: Vec<String> = fs::read_dir(tmp.path().join("migrations"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("_add_users_table.down.sql"));
    assert!(files[1].ends_with("_add_users_table.up.sql"));
    // Timestamp version: 14 digits.
    assert_eq!(files[1].split('_').next().unwrap().len(), 14);
}

// ---------------------------------------------------------------------------
// version / completion
// ---------------------------------------------------------------------------

#[test]
fn version_prints_package_version() {
    strata()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("strata version "));
}

#[test]
fn completion_generates_script() {
    strata()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strata"));
}

// ---------------------------------------------------------------------------
// interrupt
// ---------------------------------------------------------------------------

/// Like [`applied_versions`], but `None` while the database is not readable yet.
#[cfg(unix)]
fn try_applied_versions(db: &Path) -> Option<Vec<String>> {
    if !db.exists() {
        return None;
    }
    let conn = rusqlite::Connection::open(db).ok()?;
    let mut stmt = conn.prepare("SELECT version FROM schema_migration").ok()?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0)).ok()?;
    rows.collect::<Result<Vec<_>, _>>().ok()
}

#[cfg(unix)]
#[test]
fn ctrl_c_during_a_migration_exits_non_zero() {
    use std::process::{Command as StdCommand, Stdio};
    use std::time::{Duration, Instant};

    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("migrations");
    write_migration(&dir, "1_create_users.up.sql", "CREATE TABLE users (id INTEGER);");
    write_migration(
        &dir,
        "2_slow.up.sql",
        "CREATE TABLE slow AS WITH RECURSIVE c(x) AS \
         (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 2000000000) \
         SELECT count(*) AS n FROM c;",
    );
    write_migration(&dir, "3_create_posts.up.sql", "CREATE TABLE posts (id INTEGER);");
    let db = tmp.path().join("app.db");

    let child = StdCommand::new(env!("CARGO_BIN_EXE_strata"))
        .args(["--database", "app.db", "-p", "migrations", "migrate", "up"])
        .current_dir(tmp.path())
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Wait until the first migration is committed and the slow one is running.
    let deadline = Instant::now() + Duration::from_secs(30);
    while try_applied_versions(&db).is_none_or(|v| v.is_empty()) {
        assert!(Instant::now() < deadline, "first migration was never applied");
        std::thread::sleep(Duration::from_millis(50));
    }
    std::thread::sleep(Duration::from_millis(300));

    let killed = StdCommand::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(130));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Interrupted"));

    assert_eq!(applied_versions(&db), vec!["1"]);
    assert!(!table_exists(&db, "slow"));
    assert!(!table_exists(&db, "posts"));
}
