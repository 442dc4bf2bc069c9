//! Terminal rendering for questions and leaderboard snapshots

use shared::{LeaderboardEntry, Question};

/// Renders a question prompt with its choice tokens.
pub fn format_question(question: &Question) -> String {
    format!(
        "\n=== {} ===\nChoices: {}\nType a choice and press Enter.",
        question.prompt,
        question.choices.join(", ")
    )
}

/// Renders a ranked leaderboard snapshot as a numbered table.
pub fn format_leaderboard(entries: &[LeaderboardEntry]) -> String {
    let mut out = String::from("--- Leaderboard ---");
    for (position, entry) in entries.iter().enumerate() {
        out.push_str(&format!("\n{:>2}. {:<20} {}", position + 1, entry.name, entry.score));
    }
    out
}
