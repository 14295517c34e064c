// Colored terminal output for pipeline runs, theme dictionaries and reports.
//
// main.rs delegates all display here so the commands stay thin.

use colored::Colorize;

use super::insights::{BankInsights, InsightsReport, Ranked};
use crate::pipeline::thematic::RunSummary;
use crate::themes::assign::{ThemeDictionary, FALLBACK_THEME};

/// Display the outcome of a `run`.
pub fn display_run_summary(summary: &RunSummary) {
    println!(
        "\n{}",
        format!("=== Thematic Analysis ({} reviews) ===", summary.records).bold()
    );
    if summary.empty_texts > 0 {
        println!(
            "  {} {} reviews had no usable text",
            "~".yellow(),
            summary.empty_texts
        );
    }
    println!();

    for (label, count) in &summary.theme_counts {
        println!(
            "  {:<32} {:>6}  {}",
            label,
            count,
            share(*count, summary.records).dimmed()
        );
    }
    println!(
        "  {:<32} {:>6}  {}",
        FALLBACK_THEME.dimmed(),
        summary.unthemed,
        share(summary.unthemed, summary.records).dimmed()
    );
}

/// Display the theme dictionary in match order.
pub fn display_dictionary(dictionary: &ThemeDictionary) {
    println!(
        "\n{}",
        format!("=== Theme Dictionary ({} themes) ===", dictionary.len()).bold()
    );
    println!();

    for (i, theme) in dictionary.themes().iter().enumerate() {
        println!("  {}. {}", i + 1, theme.label.bold());
        let triggers = super::truncate_chars(&theme.triggers.join(", "), 100);
        println!("     {}", triggers.dimmed());
    }

    println!(
        "\n  Reviews matching none of these are labeled {}.",
        FALLBACK_THEME.italic()
    );
}

/// Display the full insights report.
pub fn display_report(report: &InsightsReport) {
    if report.total_reviews == 0 {
        println!("No reviews to report on. Run `themescope run` first.");
        return;
    }

    println!("\n{}", "=== Insights Report ===".bold());
    println!("  Total reviews analyzed: {}", report.total_reviews);

    if !report.sentiment_distribution.is_empty() {
        println!("\n  {}", "Sentiment distribution".bold());
        for share in &report.sentiment_distribution {
            println!(
                "    {:<12} {:>6}  ({:.1}%)",
                colorize_sentiment(&share.label),
                share.count,
                share.percentage
            );
        }
    }

    for bank in &report.banks {
        display_bank(bank);
    }

    let h = &report.highlights;
    if h.highest_rated.is_some() || h.highest_positive_pct.is_some() {
        println!("\n  {}", "Comparison".bold());
        if let Some(name) = &h.highest_rated {
            println!("    Highest rated:            {}", name);
        }
        if let Some(name) = &h.most_positive_sentiment {
            println!("    Most positive sentiment:  {}", name);
        }
        if let Some(name) = &h.highest_positive_pct {
            println!("    Highest % positive:       {}", name);
        }
    }
    println!();
}

fn display_bank(bank: &BankInsights) {
    println!(
        "\n  {} ({})",
        bank.name.bold(),
        bank.code.dimmed()
    );
    println!("    Reviews: {}", bank.reviews);
    match bank.average_rating {
        Some(r) => println!("    Average rating: {}", colorize_rating(r)),
        None => println!("    Average rating: {}", "n/a".dimmed()),
    }
    if let Some(s) = bank.average_sentiment_score {
        println!("    Average sentiment score: {:.3}", s);
    }
    println!("    Positive reviews: {:.1}%", bank.positive_pct);
    println!("    Top themes:      {}", ranked_list(&bank.top_themes));
    println!("    Top drivers:     {}", ranked_list(&bank.top_drivers).green());
    println!("    Top pain points: {}", ranked_list(&bank.top_pain_points).red());

    for rec in &bank.recommendations {
        println!("    {} {}", "->".cyan(), rec);
    }
}

fn ranked_list(items: &[Ranked]) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items
        .iter()
        .map(|r| format!("{} ({})", r.name, r.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn share(count: usize, total: usize) -> String {
    if total == 0 {
        return String::new();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}

/// Colorize a star rating: red below 3, yellow below 4, green otherwise.
fn colorize_rating(rating: f64) -> colored::ColoredString {
    let text = format!("{:.2} stars", rating);
    if rating < 3.0 {
        text.red().bold()
    } else if rating < 4.0 {
        text.yellow()
    } else {
        text.green()
    }
}

/// Colorize a sentiment label.
fn colorize_sentiment(label: &str) -> colored::ColoredString {
    match label.to_ascii_uppercase().as_str() {
        "POSITIVE" => label.green(),
        "NEGATIVE" => label.red(),
        _ => label.dimmed(),
    }
}
