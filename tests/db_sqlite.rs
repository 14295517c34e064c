// Integration tests for the SQLite load.
//
// Each test creates its own database file in a temporary directory.

#![cfg(feature = "sqlite")]

use themescope::db;
use themescope::db::queries;
use themescope::records::models::{EnrichedRecord, ReviewRecord};
use themescope::themes::assign::ThemeSet;

fn record(text: &str, bank: &str, keywords: &[&str], themes: &[&str]) -> EnrichedRecord {
    EnrichedRecord {
        review: ReviewRecord {
            text: Some(text.to_string()),
            rating: Some(3),
            date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
            bank: bank.to_string(),
            source: "Google Play".to_string(),
            sentiment_label: "NEGATIVE".to_string(),
            sentiment_score: Some(0.7),
            columns: Vec::new(),
        },
        processed_review: text.to_lowercase(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        themes: ThemeSet::from_labels(themes.iter().map(|t| t.to_string()).collect()),
    }
}

fn temp_db() -> (tempfile::TempDir, rusqlite::Connection) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/themescope.db");
    let conn = db::initialize(path.to_str().unwrap()).unwrap();
    (dir, conn)
}

#[test]
fn initialize_reopens_an_existing_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("themescope.db");
    {
        let mut conn = db::initialize(&path).unwrap();
        queries::replace_reviews(&mut conn, &[record("slow", "CBE", &["slow"], &[])]).unwrap();
    }

    let conn = db::initialize(&path).unwrap();
    assert_eq!(queries::review_count(&conn).unwrap(), 1);
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn initialize_refuses_a_newer_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("themescope.db");
    {
        let conn = db::initialize(&path).unwrap();
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [db::schema::SCHEMA_VERSION + 1],
        )
        .unwrap();
    }

    let err = db::initialize(&path).unwrap_err();
    assert!(err.to_string().contains("newer"), "got {err}");
}

#[test]
fn load_stores_every_review() {
    let (_dir, mut conn) = temp_db();
    let records = vec![
        record("login error", "CBE", &["login", "error"], &["Account Access Issues"]),
        record("slow", "BOA", &["slow"], &["Transaction Performance"]),
        record("great", "Dashen", &[], &[]),
    ];

    let loaded = queries::replace_reviews(&mut conn, &records).unwrap();
    assert_eq!(loaded, 3);
    assert_eq!(queries::review_count(&conn).unwrap(), 3);
}

#[test]
fn reload_replaces_previous_reviews() {
    let (_dir, mut conn) = temp_db();
    let first = vec![
        record("a", "CBE", &[], &[]),
        record("b", "CBE", &[], &[]),
        record("c", "CBE", &[], &[]),
    ];
    let second = vec![record("d", "BOA", &["slow"], &["Transaction Performance"])];

    queries::replace_reviews(&mut conn, &first).unwrap();
    queries::replace_reviews(&mut conn, &second).unwrap();

    assert_eq!(queries::review_count(&conn).unwrap(), 1);
    assert_eq!(queries::get_keywords(&conn, 1).unwrap(), Some(vec!["slow".to_string()]));
    assert_eq!(queries::get_keywords(&conn, 2).unwrap(), None);
}

#[test]
fn banks_are_upserted_once() {
    let (_dir, mut conn) = temp_db();
    let records = vec![
        record("a", "CBE", &[], &[]),
        record("b", "cbe", &[], &[]),
        record("c", "Acme", &[], &[]),
    ];
    queries::replace_reviews(&mut conn, &records).unwrap();
    queries::replace_reviews(&mut conn, &records).unwrap();

    let banks: i64 = conn
        .query_row("SELECT COUNT(*) FROM banks", [], |row| row.get(0))
        .unwrap();
    assert_eq!(banks, 2);

    let (name, package): (String, Option<String>) = conn
        .query_row(
            "SELECT bank_name, app_package_id FROM banks WHERE code = 'CBE'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(name, "Commercial Bank of Ethiopia");
    assert_eq!(package.as_deref(), Some("com.combanketh"));

    let acme = queries::upsert_bank(&conn, "Acme").unwrap();
    let again = queries::upsert_bank(&conn, "Acme").unwrap();
    assert_eq!(acme, again);
}

#[test]
fn reviews_without_bank_have_null_bank_id() {
    let (_dir, mut conn) = temp_db();
    queries::replace_reviews(&mut conn, &[record("a", "", &[], &[])]).unwrap();

    let bank_id: Option<i64> = conn
        .query_row("SELECT bank_id FROM reviews WHERE review_id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(bank_id, None);
}

#[test]
fn theme_counts_split_multi_theme_reviews() {
    let (_dir, mut conn) = temp_db();
    let records = vec![
        record("a", "CBE", &[], &["Account Access Issues", "Transaction Performance"]),
        record("b", "CBE", &[], &["Account Access Issues"]),
        record("c", "BOA", &[], &[]),
    ];
    queries::replace_reviews(&mut conn, &records).unwrap();

    let counts = queries::theme_counts(&conn).unwrap();
    assert_eq!(
        counts,
        vec![
            ("Account Access Issues".to_string(), 2),
            ("Other".to_string(), 1),
            ("Transaction Performance".to_string(), 1),
        ]
    );
}

#[test]
fn stored_columns_match_record() {
    let (_dir, mut conn) = temp_db();
    queries::replace_reviews(
        &mut conn,
        &[record("login error", "CBE", &["login", "error"], &["Account Access Issues"])],
    )
    .unwrap();

    let (text, date, themes, keywords): (String, String, String, String) = conn
        .query_row(
            "SELECT review_text, review_date, identified_themes, keywords FROM reviews",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(text, "login error");
    assert_eq!(date, "2024-06-01");
    assert_eq!(themes, "Account Access Issues");
    assert_eq!(keywords, r#"["login","error"]"#);
}

#[test]
fn load_state_round_trips() {
    let (_dir, conn) = temp_db();
    assert_eq!(queries::get_state(&conn, "last_load_at").unwrap(), None);

    queries::set_state(&conn, "last_load_at", "2024-06-01T00:00:00Z").unwrap();
    queries::set_state(&conn, "last_load_at", "2024-06-02T00:00:00Z").unwrap();
    assert_eq!(
        queries::get_state(&conn, "last_load_at").unwrap().as_deref(),
        Some("2024-06-02T00:00:00Z")
    );
}
