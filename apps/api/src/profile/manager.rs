use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::profile::models::{CareerInterest, EducationLevel, Profile, MAX_AGE, MIN_AGE};
use crate::store::{Collection, Persisted, RecordStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("Age must be between {MIN_AGE} and {MAX_AGE}, got {0}")]
    AgeOutOfRange(u32),

    #[error("Unknown education level '{0}'")]
    UnknownEducation(String),
}

/// Raw profile form as submitted by the owner.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub name: String,
    pub age: u32,
    pub education: String,
    #[serde(default)]
    pub interests: Vec<String>,
    /// Comma-separated free text.
    #[serde(default)]
    pub skills: String,
}

/// Splits comma-separated skills, trimming each and dropping empties.
/// Case and duplicates are kept as typed.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validates a submitted form into a full replacement profile.
pub fn build_profile(username: &str, input: &ProfileInput) -> Result<Profile, ProfileError> {
    if !(MIN_AGE..=MAX_AGE).contains(&input.age) {
        return Err(ProfileError::AgeOutOfRange(input.age));
    }
    let education = input
        .education
        .parse::<EducationLevel>()
        .map_err(|_| ProfileError::UnknownEducation(input.education.clone()))?;

    let name = input.name.trim();
    Ok(Profile {
        display_name: if name.is_empty() {
            username.to_string()
        } else {
            name.to_string()
        },
        age: input.age,
        education,
        interests: CareerInterest::filter_known(input.interests.iter().map(String::as_str)),
        skills: parse_skills(&input.skills),
    })
}

pub fn find_profile(store: &RecordStore, username: &str) -> Option<Profile> {
    store.get(Collection::Profiles, username)
}

/// Every well-formed stored profile, keyed by username.
pub fn all_profiles(store: &RecordStore) -> BTreeMap<String, Profile> {
    store.load_keyed(Collection::Profiles)
}

/// Returns the user's profile, writing the default one first if no record is
/// stored. A record that exists but cannot be read is left on disk untouched
/// and the default is used for this session only.
pub fn get_or_bootstrap(store: &RecordStore, username: &str) -> Persisted<Profile> {
    let Some(raw) = store.load(Collection::Profiles).remove(username) else {
        return bootstrap_profile(store, username);
    };
    match serde_json::from_value::<Profile>(raw) {
        Ok(profile) => Persisted::clean(profile),
        Err(e) => {
            warn!("profile for {username} is unreadable ({e}); keeping stored record");
            Persisted::clean(Profile::bootstrap(username))
        }
    }
}

fn bootstrap_profile(store: &RecordStore, username: &str) -> Persisted<Profile> {
    let profile = Profile::bootstrap(username);
    match serde_json::to_value(&profile) {
        Ok(value) => store.modify(Collection::Profiles, |records| {
            // Another request may have stored a profile since the check.
            let stored = records.entry(username.to_string()).or_insert(value);
            serde_json::from_value::<Profile>(stored.clone()).unwrap_or(profile)
        }),
        Err(e) => Persisted::new(profile, Err(e.into())),
    }
}

/// Validates and stores the owner's form, replacing the previous profile
/// wholesale.
pub fn update_profile(
    store: &RecordStore,
    username: &str,
    input: &ProfileInput,
) -> Result<Persisted<Profile>, ProfileError> {
    let profile = build_profile(username, input)?;
    info!("Saving profile for {username}");
    Ok(save_profile(store, username, profile))
}

pub fn save_profile(store: &RecordStore, username: &str, profile: Profile) -> Persisted<Profile> {
    match serde_json::to_value(&profile) {
        Ok(value) => store
            .modify(Collection::Profiles, |records| {
                records.insert(username.to_string(), value);
            })
            .map(|()| profile),
        Err(e) => Persisted::new(profile, Err(e.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(age: u32, education: &str, interests: &[&str], skills: &str) -> ProfileInput {
        ProfileInput {
            name: "  Alice A. ".to_string(),
            age,
            education: education.to_string(),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            skills: skills.to_string(),
        }
    }

    #[test]
    fn test_parse_skills_trims_drops_empty_keeps_duplicates() {
        assert_eq!(parse_skills(" Python, ,Go ,Go"), vec!["Python", "Go", "Go"]);
    }

    #[test]
    fn test_parse_skills_keeps_case() {
        assert_eq!(parse_skills("rust,Rust"), vec!["rust", "Rust"]);
        assert!(parse_skills(" , ,").is_empty());
    }

    #[test]
    fn test_build_profile_drops_unknown_interests() {
        let profile = build_profile(
            "alice",
            &input(30, "Postgraduate", &["AI/ML", "Knitting", "Cybersecurity"], "Python"),
        )
        .unwrap();
        assert_eq!(profile.display_name, "Alice A.");
        assert_eq!(profile.education, EducationLevel::Postgraduate);
        assert_eq!(
            profile.interests,
            vec![CareerInterest::AiMl, CareerInterest::Cybersecurity]
        );
    }

    #[test]
    fn test_build_profile_rejects_age_outside_bounds() {
        assert_eq!(
            build_profile("alice", &input(9, "Other", &[], "")),
            Err(ProfileError::AgeOutOfRange(9))
        );
        assert_eq!(
            build_profile("alice", &input(101, "Other", &[], "")),
            Err(ProfileError::AgeOutOfRange(101))
        );
        assert!(build_profile("alice", &input(10, "Other", &[], "")).is_ok());
        assert!(build_profile("alice", &input(100, "Other", &[], "")).is_ok());
    }

    #[test]
    fn test_build_profile_rejects_unknown_education() {
        assert_eq!(
            build_profile("alice", &input(20, "Bootcamp", &[], "")),
            Err(ProfileError::UnknownEducation("Bootcamp".into()))
        );
    }

    #[test]
    fn test_blank_name_falls_back_to_username() {
        let mut form = input(20, "Undergraduate", &[], "");
        form.name = "   ".into();
        assert_eq!(build_profile("alice", &form).unwrap().display_name, "alice");
    }

    #[test]
    fn test_get_or_bootstrap_persists_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());

        let got = get_or_bootstrap(&store, "alice");
        assert!(got.warning.is_none());
        assert_eq!(got.value, Profile::bootstrap("alice"));
        assert_eq!(find_profile(&store, "alice"), Some(Profile::bootstrap("alice")));
    }

    #[test]
    fn test_get_or_bootstrap_keeps_partly_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let stored = serde_json::json!({
            "bob": {
                "Age": null,
                "Education": "PhD",
                "Career Interests": ["AI/ML"],
                "Skills": ["Python", "Go"]
            }
        });
        store.save(Collection::Profiles, &stored).unwrap();

        let got = get_or_bootstrap(&store, "bob");
        assert_eq!(got.value.interests, vec![CareerInterest::AiMl]);
        assert_eq!(got.value.skills, vec!["Python", "Go"]);
        assert_eq!(
            serde_json::Value::Object(RecordStore::new(dir.path()).load(Collection::Profiles)),
            stored
        );
        assert!(all_profiles(&store).contains_key("bob"));
    }

    #[test]
    fn test_get_or_bootstrap_never_overwrites_unreadable_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let stored = serde_json::json!({"bob": "legacy"});
        store.save(Collection::Profiles, &stored).unwrap();

        let got = get_or_bootstrap(&store, "bob");
        assert!(got.warning.is_none());
        assert_eq!(got.value, Profile::bootstrap("bob"));
        assert_eq!(
            serde_json::Value::Object(store.load(Collection::Profiles)),
            stored
        );
    }

    #[test]
    fn test_update_replaces_whole_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        update_profile(&store, "alice", &input(30, "Other", &["AI/ML"], "Python, Go")).unwrap();
        update_profile(&store, "alice", &input(31, "Other", &[], "")).unwrap();

        let stored = find_profile(&store, "alice").unwrap();
        assert_eq!(stored.age, 31);
        assert!(stored.interests.is_empty());
        assert!(stored.skills.is_empty());
    }

    #[test]
    fn test_invalid_update_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        assert!(update_profile(&store, "alice", &input(5, "Other", &[], "")).is_err());
        assert!(find_profile(&store, "alice").is_none());
    }
}
