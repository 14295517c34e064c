// Unit tests for review table I/O.
//
// Every test writes into its own temporary directory; nothing touches the
// real data/ tree.

use std::fs;

use themescope::records::models::{EnrichedRecord, ReviewRecord};
use themescope::records::table::{self, parse_keyword_field};
use themescope::themes::assign::ThemeSet;

fn review(text: Option<&str>, bank: &str, label: &str) -> ReviewRecord {
    ReviewRecord {
        text: text.map(str::to_string),
        rating: Some(4),
        date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1),
        bank: bank.to_string(),
        source: "Google Play".to_string(),
        sentiment_label: label.to_string(),
        sentiment_score: Some(0.91),
        columns: Vec::new(),
    }
}

// ============================================================
// Reading upstream tables
// ============================================================

#[test]
fn read_reviews_tolerates_messy_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.csv");
    fs::write(
        &path,
        "review,rating,date,bank,source,sentiment_label,sentiment_score,extra\n\
         Login failed,4.0,2024-05-01,CBE,Google Play,NEGATIVE,0.98,x\n\
         ,,not a date,BOA,Google Play,POSITIVE,oops,y\n",
    )
    .unwrap();

    let table = table::read_reviews(&path).unwrap();
    assert_eq!(table.headers.last().map(String::as_str), Some("extra"));
    let reviews = table.reviews;
    assert_eq!(reviews.len(), 2);

    assert_eq!(reviews[0].text.as_deref(), Some("Login failed"));
    assert_eq!(reviews[0].rating, Some(4));
    assert_eq!(reviews[0].date, chrono::NaiveDate::from_ymd_opt(2024, 5, 1));
    assert_eq!(reviews[0].sentiment_score, Some(0.98));

    assert_eq!(reviews[1].text_or_empty(), "");
    assert_eq!(reviews[1].rating, None);
    assert_eq!(reviews[1].date, None);
    assert_eq!(reviews[1].sentiment_score, None);
    assert_eq!(reviews[1].bank, "BOA");
    assert_eq!(reviews[1].columns[2], "not a date");
}

#[test]
fn read_reviews_with_only_a_review_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.csv");
    fs::write(&path, "review\nslow transfer\n").unwrap();

    let reviews = table::read_reviews(&path).unwrap().reviews;
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].bank, "");
    assert_eq!(reviews[0].rating, None);
}

#[test]
fn read_reviews_without_review_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.csv");
    fs::write(&path, "text,rating\nhello,5\n").unwrap();

    let err = table::read_reviews(&path).unwrap_err();
    assert!(err.to_string().contains("review"));
}

#[test]
fn read_reviews_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(table::read_reviews(&dir.path().join("nope.csv")).is_err());
}

// ============================================================
// Writing and re-reading enriched tables
// ============================================================

#[test]
fn enriched_table_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/out.csv");

    let records = vec![
        EnrichedRecord {
            review: review(Some("Login failed, error!"), "CBE", "NEGATIVE"),
            processed_review: "login fail error".to_string(),
            keywords: vec!["error".into(), "fail".into(), "fail error".into()],
            themes: ThemeSet::from_labels(vec!["Account Access Issues".into()]),
        },
        EnrichedRecord {
            review: review(None, "BOA", "POSITIVE"),
            processed_review: String::new(),
            keywords: vec![],
            themes: ThemeSet::default(),
        },
    ];

    table::write_enriched(&path, &table::standard_headers(), &records).unwrap();
    let back = table::read_enriched(&path).unwrap();

    assert_eq!(back.len(), 2);
    assert_eq!(back[0].keywords, records[0].keywords);
    assert_eq!(back[0].themes.to_string(), "Account Access Issues");
    assert_eq!(back[0].processed_review, "login fail error");
    assert_eq!(back[0].review.rating, Some(4));

    assert!(back[1].keywords.is_empty());
    assert!(back[1].themes.is_fallback());
    assert_eq!(back[1].review.text_or_empty(), "");
}

#[test]
fn enriched_table_has_expected_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    table::write_enriched(&path, &table::standard_headers(), &[]).unwrap();
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents.lines().next().unwrap(),
        "review,rating,date,bank,source,sentiment_label,sentiment_score,processed_review,keywords,identified_theme(s)"
    );
}

#[test]
fn keywords_are_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    let records = vec![EnrichedRecord {
        review: review(Some("slow"), "Dashen", "NEGATIVE"),
        processed_review: "slow".to_string(),
        keywords: vec!["slow".into()],
        themes: ThemeSet::from_labels(vec!["Transaction Performance".into()]),
    }];
    table::write_enriched(&path, &table::standard_headers(), &records).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains(r#"[""slow""]"#), "got {contents}");
}

#[test]
fn write_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    table::write_enriched(&path, &table::standard_headers(), &[]).unwrap();
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["out.csv"]);
}

#[test]
fn unknown_columns_and_raw_values_pass_through() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    fs::write(
        &input,
        "review,rating,app_version,sentiment_score\n\
         \"slow, very slow\",4.0,5.2.1,0.9870\n\
         short row\n",
    )
    .unwrap();

    let source = table::read_reviews(&input).unwrap();
    let records: Vec<EnrichedRecord> = source
        .reviews
        .into_iter()
        .map(|review| EnrichedRecord {
            review,
            processed_review: "slow".to_string(),
            keywords: vec!["slow".into()],
            themes: ThemeSet::from_labels(vec!["Transaction Performance".into()]),
        })
        .collect();
    table::write_enriched(&output, &source.headers, &records).unwrap();

    let contents = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines[0],
        "review,rating,app_version,sentiment_score,processed_review,keywords,identified_theme(s)"
    );
    assert!(lines[1].starts_with("\"slow, very slow\",4.0,5.2.1,0.9870,slow,"), "got {}", lines[1]);
    assert!(lines[2].starts_with("short row,,,,slow,"), "got {}", lines[2]);
}

#[test]
fn rewriting_an_enriched_table_replaces_derived_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    fs::write(
        &path,
        "review,bank,processed_review,keywords,identified_theme(s)\n\
         slow,CBE,old,[],Other\n",
    )
    .unwrap();

    let mut records = table::read_enriched(&path).unwrap();
    records[0].processed_review = "slow".to_string();
    records[0].keywords = vec!["slow".into()];
    records[0].themes = ThemeSet::from_labels(vec!["Transaction Performance".into()]);
    let headers: Vec<String> = ["review", "bank", "processed_review", "keywords", "identified_theme(s)"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    table::write_enriched(&path, &headers, &records).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "review,bank,processed_review,keywords,identified_theme(s)\n\
         slow,CBE,slow,\"[\"\"slow\"\"]\",Transaction Performance\n"
    );
}

#[test]
fn read_enriched_accepts_legacy_keyword_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.csv");
    fs::write(
        &path,
        "review,bank,keywords,identified_theme(s)\n\
         slow transfer,CBE,\"['slow', 'transfer']\",Transaction Performance\n\
         nice,BOA,\"nice, app\",Other\n",
    )
    .unwrap();

    let records = table::read_enriched(&path).unwrap();
    assert_eq!(records[0].keywords, vec!["slow", "transfer"]);
    assert_eq!(records[1].keywords, vec!["nice", "app"]);
    assert!(records[1].themes.is_fallback());
}

// ============================================================
// Keyword field parsing
// ============================================================

#[test]
fn keyword_field_formats() {
    assert_eq!(parse_keyword_field(r#"["login","error"]"#), vec!["login", "error"]);
    assert_eq!(parse_keyword_field(r#"["otp code"]"#), vec!["otp code"]);
    assert_eq!(parse_keyword_field("['otp code']"), vec!["otp code"]);
    assert_eq!(parse_keyword_field("login"), vec!["login"]);
    assert!(parse_keyword_field("[").is_empty());
}
