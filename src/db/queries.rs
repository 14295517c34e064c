// Database queries — loading enriched reviews and reading them back.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::records::models::{find_bank, EnrichedRecord};

// --- Load state ---

/// Get a load state value by key (e.g., "last_load_at").
pub fn get_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM load_state WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a load state value (upsert).
pub fn set_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO load_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Banks ---

/// Insert or refresh a bank row by code and return its id.
///
/// Known banks get their full name and app package; any other non-empty
/// code is stored with the code as its name.
pub fn upsert_bank(conn: &Connection, code: &str) -> Result<i64> {
    let (code, name, package) = match find_bank(code) {
        Some(bank) => (bank.code, bank.name, Some(bank.app_package)),
        None => (code.trim(), code.trim(), None),
    };

    conn.execute(
        "INSERT INTO banks (code, bank_name, app_package_id)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(code) DO UPDATE SET
            bank_name = ?2,
            app_package_id = COALESCE(?3, app_package_id)",
        params![code, name, package],
    )?;

    let id = conn.query_row(
        "SELECT bank_id FROM banks WHERE code = ?1",
        params![code],
        |row| row.get(0),
    )?;
    Ok(id)
}

// --- Reviews ---

/// Replace every stored review with `records`, in one transaction.
///
/// Matches the batch model: each load mirrors the latest enriched table.
/// If any insert fails, the previous contents stay untouched.
pub fn replace_reviews(conn: &mut Connection, records: &[EnrichedRecord]) -> Result<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM reviews", [])?;

    let mut bank_ids: HashMap<String, i64> = HashMap::new();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO reviews
                (review_id, bank_id, review_text, rating, review_date,
                 sentiment_label, sentiment_score, keywords, identified_themes, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;

        for (i, record) in records.iter().enumerate() {
            let review = &record.review;

            let bank_id = if review.bank.trim().is_empty() {
                None
            } else if let Some(&id) = bank_ids.get(&review.bank) {
                Some(id)
            } else {
                let id = upsert_bank(&tx, &review.bank)?;
                bank_ids.insert(review.bank.clone(), id);
                Some(id)
            };

            stmt.execute(params![
                (i + 1) as i64,
                bank_id,
                review.text_or_empty(),
                review.rating,
                review.date.map(|d| d.format("%Y-%m-%d").to_string()),
                review.sentiment_label,
                review.sentiment_score,
                serde_json::to_string(&record.keywords)?,
                record.themes.to_string(),
                review.source,
            ])?;
        }
    }

    tx.commit()?;
    Ok(records.len())
}

/// Number of stored reviews.
pub fn review_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
    Ok(count)
}

/// Per-theme review counts, each label of a multi-theme review counted
/// once. Ordered by count descending, then label.
pub fn theme_counts(conn: &Connection) -> Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare("SELECT identified_themes FROM reviews")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut counts: HashMap<String, i64> = HashMap::new();
    for row in rows {
        let themes = row?;
        for label in themes.split(',').map(str::trim).filter(|l| !l.is_empty()) {
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<(String, i64)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

/// Stored keyword list for a review (1-based row number).
pub fn get_keywords(conn: &Connection, review_id: i64) -> Result<Option<Vec<String>>> {
    let mut stmt = conn.prepare("SELECT keywords FROM reviews WHERE review_id = ?1")?;
    let result: Option<String> = stmt.query_row(params![review_id], |row| row.get(0)).optional()?;

    match result {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}
