use std::process::Command;

use tempfile::TempDir;

use hpcl_core::{NewRoute, RoutePoint, RouteStatus, RouteStore, SqliteRouteStore};

fn batch_command(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_route-batch"));
    cmd.current_dir(dir.path())
        .env("HPCL_CONFIG", dir.path().join("missing.toml"))
        .env("RUST_LOG", "error");
    cmd
}

fn seed_database(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("routes.db");
    let store = SqliteRouteStore::new(&path).unwrap();
    store
        .create(NewRoute::new("1140", "4521").with_points(vec![
            RoutePoint::new(19.0760, 72.8777),
            RoutePoint::new(19.2183, 72.9781),
        ]))
        .unwrap();
    // No geometry: processing fails.
    store.create(NewRoute::new("1140", "4522")).unwrap();
    path
}

#[test]
fn test_missing_datastore_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nope.db");

    let output = batch_command(&dir)
        .args(["--pending", "--database"])
        .arg(&db_path)
        .output()
        .expect("Failed to run route-batch");

    assert_eq!(output.status.code(), Some(1));
    assert!(!db_path.exists(), "datastore check must not create the database");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("BATCH PROCESSING SUMMARY"));
}

#[test]
fn test_mode_is_required() {
    let dir = TempDir::new().unwrap();

    let output = batch_command(&dir)
        .output()
        .expect("Failed to run route-batch");

    assert!(!output.status.success());
}

#[test]
fn test_pending_run_prints_summary() {
    let dir = TempDir::new().unwrap();
    let db_path = seed_database(&dir);

    let output = batch_command(&dir)
        .args(["--pending", "--workers", "2", "--database"])
        .arg(&db_path)
        .output()
        .expect("Failed to run route-batch");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("BATCH PROCESSING SUMMARY"));
    assert!(stdout.contains("Total Routes: 2"), "{}", stdout);

    let store = SqliteRouteStore::new(&db_path).unwrap();
    let done = store.find_by_codes("1140", "4521").unwrap().unwrap();
    let failed = store.find_by_codes("1140", "4522").unwrap().unwrap();
    assert_eq!(done.status, RouteStatus::Completed);
    assert_eq!(failed.status, RouteStatus::Failed);

    // Working directories are created relative to the working directory.
    assert!(dir.path().join("uploads").is_dir());
}

#[test]
fn test_route_list_run() {
    let dir = TempDir::new().unwrap();
    let db_path = seed_database(&dir);
    let list_path = dir.path().join("routes.csv");
    std::fs::write(&list_path, "from_code,to_code\n1140,4521\n9999,0000\n").unwrap();

    let output = batch_command(&dir)
        .arg("--csv")
        .arg(&list_path)
        .arg("--database")
        .arg(&db_path)
        .output()
        .expect("Failed to run route-batch");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total Routes: 2"), "{}", stdout);
    assert!(stdout.contains("Failed: 1"), "{}", stdout);
}
