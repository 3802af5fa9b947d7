mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::TestWorkspace;
use predicates::str::contains;

fn count_rows(database: &std::path::Path, table: &str) -> i64 {
    let conn = duckdb::Connection::open(database).expect("open duckdb file");
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
        row.get(0)
    })
    .expect("count rows")
}

#[test]
fn import_creates_and_fills_tables() {
    let workspace = TestWorkspace::new();
    let folder = workspace.path().join("exports");
    std::fs::create_dir(&folder).expect("create folder");
    std::fs::write(folder.join("Orders.csv"), "UTF-8\nid,item,item\n1,pen,blue\n2,ink,\n")
        .expect("write csv");
    std::fs::write(folder.join("Out_Summary.csv"), "total\n2\n").expect("write csv");
    let database = workspace.path().join("warehouse.duckdb");

    cargo_bin_cmd!("csv-sql-loader")
        .args([
            "import",
            "--folder",
            folder.to_str().unwrap(),
            "--database",
            database.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(contains("Processing file"));

    assert_eq!(count_rows(&database, "Orders"), 2);
    let conn = duckdb::Connection::open(&database).expect("open duckdb file");
    let missing = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'Out_Summary'",
        [],
        |row| row.get::<_, i64>(0),
    );
    assert_eq!(missing.expect("catalog query"), 0);
}

#[test]
fn sync_then_load_matches_import() {
    let workspace = TestWorkspace::new();
    let folder = workspace.path().join("exports");
    std::fs::create_dir(&folder).expect("create folder");
    std::fs::write(folder.join("Items.csv"), "sku,qty\nA,1\nB,2\nC,3\n").expect("write csv");
    let database = workspace.path().join("items.duckdb");
    let args = |command: &str| {
        vec![
            command.to_string(),
            "-f".to_string(),
            folder.to_str().unwrap().to_string(),
            "-d".to_string(),
            database.to_str().unwrap().to_string(),
        ]
    };

    cargo_bin_cmd!("csv-sql-loader")
        .args(args("sync"))
        .assert()
        .success();
    assert_eq!(count_rows(&database, "Items"), 0);

    cargo_bin_cmd!("csv-sql-loader")
        .args(args("load"))
        .assert()
        .success();
    assert_eq!(count_rows(&database, "Items"), 3);
}

#[test]
fn profile_supplies_folder_and_database() {
    let workspace = TestWorkspace::new();
    let folder = workspace.path().join("exports");
    std::fs::create_dir(&folder).expect("create folder");
    std::fs::write(folder.join("Tabbed.csv"), "a\tb\n1\t2\n").expect("write csv");
    let database = workspace.path().join("profile.duckdb");
    let profile = workspace.write(
        "profile.yml",
        &format!(
            "backend: duckdb\ndatabase: {}\nfolder: {}\ndelimiter: tab\n",
            database.display(),
            folder.display()
        ),
    );

    cargo_bin_cmd!("csv-sql-loader")
        .args(["import", "--config", profile.to_str().unwrap()])
        .assert()
        .success();

    assert_eq!(count_rows(&database, "Tabbed"), 1);
}

#[test]
fn inspect_prints_disambiguated_columns() {
    let workspace = TestWorkspace::new();
    workspace.write("Dupes.csv", "utf-8\nA,B,A,A\n1,2,3,4\n");

    cargo_bin_cmd!("csv-sql-loader")
        .args(["inspect", "--folder", workspace.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Dupes (4 column(s)) [marker: utf-8]: A, B, A2, A3"));
}

#[test]
fn column_count_mismatch_exits_with_error() {
    let workspace = TestWorkspace::new();
    let folder = workspace.path().join("exports");
    std::fs::create_dir(&folder).expect("create folder");
    std::fs::write(folder.join("Wide.csv"), "a,b,c,d\n1,2,3,4\n").expect("write csv");
    let database = workspace.path().join("wide.duckdb");
    {
        let conn = duckdb::Connection::open(&database).expect("create duckdb file");
        conn.execute_batch("CREATE TABLE \"Wide\" (a VARCHAR, b VARCHAR, c VARCHAR);")
            .expect("create table");
    }

    cargo_bin_cmd!("csv-sql-loader")
        .args([
            "load",
            "--folder",
            folder.to_str().unwrap(),
            "--database",
            database.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("Column count mismatch"));
}

#[test]
fn missing_folder_is_reported() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("nope");

    cargo_bin_cmd!("csv-sql-loader")
        .args([
            "import",
            "--folder",
            missing.to_str().unwrap(),
            "--database",
            ":memory:",
        ])
        .assert()
        .failure()
        .stderr(contains("is not a directory"));
}

#[test]
fn mssql_backend_requires_a_server() {
    let workspace = TestWorkspace::new();

    cargo_bin_cmd!("csv-sql-loader")
        .args([
            "import",
            "--backend",
            "mssql",
            "--folder",
            workspace.path().to_str().unwrap(),
            "--database",
            "STAGING_DB",
        ])
        .assert()
        .failure()
        .stderr(contains("requires --server"));
}
