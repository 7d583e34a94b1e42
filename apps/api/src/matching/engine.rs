//! Peer matching: ranks other users by how much of a profile they share.
//!
//! Pure: takes the requester's profile and the full profile collection, never
//! touches the store. Truncation to top-K is the caller's business.
//!
//! Algorithm:
//! 1. For every other username: shared interests = set intersection of the
//!    interest tags; shared skills = set intersection of the skill strings
//!    (exact, case-sensitive).
//! 2. score = 2 × |shared interests| + 1 × |shared skills|
//! 3. Drop the requester and every zero-score candidate.
//! 4. Sort by score descending, then username ascending.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::profile::models::{CareerInterest, Profile};

pub const INTEREST_WEIGHT: u32 = 2;
pub const SKILL_WEIGHT: u32 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub candidate_username: String,
    pub display_name: String,
    pub shared_interests: BTreeSet<CareerInterest>,
    pub shared_skills: BTreeSet<String>,
    pub score: u32,
}

impl MatchResult {
    pub fn shared_interests_joined(&self) -> String {
        self.shared_interests
            .iter()
            .map(|i| i.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn shared_skills_joined(&self) -> String {
        self.shared_skills
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

pub fn match_score(shared_interests: usize, shared_skills: usize) -> u32 {
    INTEREST_WEIGHT * shared_interests as u32 + SKILL_WEIGHT * shared_skills as u32
}

/// Scores one candidate against `me`. `None` when nothing overlaps.
pub fn score_candidate(
    me: &Profile,
    candidate_username: &str,
    candidate: &Profile,
) -> Option<MatchResult> {
    let my_interests: BTreeSet<CareerInterest> = me.interests.iter().copied().collect();
    let their_interests: BTreeSet<CareerInterest> = candidate.interests.iter().copied().collect();
    let shared_interests: BTreeSet<CareerInterest> = my_interests
        .intersection(&their_interests)
        .copied()
        .collect();

    let my_skills: BTreeSet<&str> = me.skills.iter().map(String::as_str).collect();
    let shared_skills: BTreeSet<String> = candidate
        .skills
        .iter()
        .filter(|s| my_skills.contains(s.as_str()))
        .cloned()
        .collect();

    let score = match_score(shared_interests.len(), shared_skills.len());
    if score == 0 {
        return None;
    }

    Some(MatchResult {
        candidate_username: candidate_username.to_string(),
        display_name: candidate.display_name_or(candidate_username).to_string(),
        shared_interests,
        shared_skills,
        score,
    })
}

/// Every candidate with a positive score, best first. Equal scores are
/// ordered by username so the ranking is stable across runs.
pub fn find_matches(
    self_username: &str,
    self_profile: &Profile,
    all_profiles: &BTreeMap<String, Profile>,
) -> Vec<MatchResult> {
    let mut matches: Vec<MatchResult> = all_profiles
        .iter()
        .filter(|(username, _)| username.as_str() != self_username)
        .filter_map(|(username, profile)| score_candidate(self_profile, username, profile))
        .collect();

    matches.sort_by(|a, b| match b.score.cmp(&a.score) {
        Ordering::Equal => a.candidate_username.cmp(&b.candidate_username),
        other => other,
    });
    matches
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
