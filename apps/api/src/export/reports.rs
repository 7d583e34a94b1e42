use crate::export::Document;
use crate::history::ledger::{most_recent_first, HistoryEntry};
use crate::matching::engine::MatchResult;

pub const CAREER_REPORT_FILE: &str = "career_report.pdf";

pub fn history_file_name(username: &str) -> String {
    format!("{}_ai_recommendations_history.pdf", super::file_stem(username))
}

pub fn matches_file_name(username: &str) -> String {
    format!("{}_peer_matches.pdf", super::file_stem(username))
}

fn entry_fields(doc: Document, entry: &HistoryEntry) -> Document {
    doc.field("Education", &entry.education)
        .field("Skills", &entry.skills)
        .field("Interests", &entry.interests)
        .field("Goal", &entry.goal)
}

/// Report for a single advisory exchange.
pub fn career_report(entry: &HistoryEntry) -> Document {
    let doc = Document::new().title("AI Career Advisor Report").spacer();
    entry_fields(doc, entry)
        .spacer()
        .heading("AI Recommendations:")
        .paragraph(&entry.response)
}

/// Every stored recommendation, newest first, numbered from 1.
pub fn history_report(entries: &[HistoryEntry]) -> Document {
    let mut doc = Document::new().title("AI Recommendations History").spacer();
    if entries.is_empty() {
        return doc.paragraph("No past recommendations found.");
    }
    for (i, entry) in most_recent_first(entries).into_iter().enumerate() {
        doc = doc.heading(format!("Recommendation #{}", i + 1));
        doc = entry_fields(doc, entry)
            .spacer()
            .heading("AI Recommendation:")
            .paragraph(&entry.response)
            .spacer();
    }
    doc
}

/// One block per peer; the caller decides how many peers to include.
pub fn matches_report(matches: &[MatchResult]) -> Document {
    let mut doc = Document::new().title("Peer Matching Report").spacer();
    if matches.is_empty() {
        return doc.paragraph("No matching peers found.");
    }
    for m in matches {
        doc = doc
            .heading(format!("Name: {}", m.display_name))
            .field("Username", format!("@{}", m.candidate_username));
        if !m.shared_interests.is_empty() {
            doc = doc.field("Shared Interests", m.shared_interests_joined());
        }
        if !m.shared_skills.is_empty() {
            doc = doc.field("Shared Skills", m.shared_skills_joined());
        }
        doc = doc.field("Match Score", m.score.to_string()).spacer();
    }
    doc
}
