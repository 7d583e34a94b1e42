use std::fmt;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const MIN_AGE: u32 = 10;
pub const MAX_AGE: u32 = 100;
pub const DEFAULT_AGE: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "High School")]
    HighSchool,
    #[default]
    Undergraduate,
    Postgraduate,
    Other,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 4] = [
        EducationLevel::HighSchool,
        EducationLevel::Undergraduate,
        EducationLevel::Postgraduate,
        EducationLevel::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EducationLevel::HighSchool => "High School",
            EducationLevel::Undergraduate => "Undergraduate",
            EducationLevel::Postgraduate => "Postgraduate",
            EducationLevel::Other => "Other",
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EducationLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EducationLevel::ALL
            .into_iter()
            .find(|e| e.as_str() == s.trim())
            .ok_or(())
    }
}

/// Fixed career-interest vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CareerInterest {
    #[serde(rename = "AI/ML")]
    AiMl,
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Data Science")]
    DataScience,
    #[serde(rename = "Cloud Computing")]
    CloudComputing,
    Cybersecurity,
    Other,
}

impl CareerInterest {
    pub const ALL: [CareerInterest; 6] = [
        CareerInterest::AiMl,
        CareerInterest::WebDevelopment,
        CareerInterest::DataScience,
        CareerInterest::CloudComputing,
        CareerInterest::Cybersecurity,
        CareerInterest::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CareerInterest::AiMl => "AI/ML",
            CareerInterest::WebDevelopment => "Web Development",
            CareerInterest::DataScience => "Data Science",
            CareerInterest::CloudComputing => "Cloud Computing",
            CareerInterest::Cybersecurity => "Cybersecurity",
            CareerInterest::Other => "Other",
        }
    }

    /// Keeps known tags in first-seen order, dropping unknown ones and repeats.
    pub fn filter_known<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<CareerInterest> {
        let mut out: Vec<CareerInterest> = Vec::new();
        for tag in tags {
            if let Ok(interest) = tag.parse::<CareerInterest>() {
                if !out.contains(&interest) {
                    out.push(interest);
                }
            }
        }
        out
    }
}

impl fmt::Display for CareerInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CareerInterest {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CareerInterest::ALL
            .into_iter()
            .find(|i| i.as_str() == s.trim())
            .ok_or(())
    }
}

/// A user's structured self-description. Field names match the stored
/// `profile.json` records.
///
/// Decoding is per field: a stored value of the wrong shape falls back to that
/// field's default and leaves the rest of the record intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "Name", default, deserialize_with = "or_default")]
    pub display_name: String,
    #[serde(rename = "Age", default = "default_age", deserialize_with = "stored_age")]
    pub age: u32,
    #[serde(rename = "Education", default, deserialize_with = "or_default")]
    pub education: EducationLevel,
    #[serde(
        rename = "Career Interests",
        default,
        deserialize_with = "known_interests"
    )]
    pub interests: Vec<CareerInterest>,
    #[serde(rename = "Skills", default, deserialize_with = "string_items")]
    pub skills: Vec<String>,
}

impl Profile {
    /// The profile every new or profile-less account starts with.
    pub fn bootstrap(username: &str) -> Self {
        Self {
            display_name: username.to_string(),
            age: DEFAULT_AGE,
            education: EducationLevel::default(),
            interests: Vec::new(),
            skills: Vec::new(),
        }
    }

    pub fn display_name_or<'a>(&'a self, username: &'a str) -> &'a str {
        if self.display_name.trim().is_empty() {
            username
        } else {
            &self.display_name
        }
    }

    pub fn skills_joined(&self) -> String {
        self.skills.join(",")
    }

    pub fn interests_joined(&self) -> String {
        self.interests
            .iter()
            .map(|i| i.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn default_age() -> u32 {
    DEFAULT_AGE
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

fn stored_age<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or(DEFAULT_AGE))
}

fn string_items<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Stored interest lists may contain tags outside the vocabulary; those are
/// dropped instead of invalidating the whole profile.
fn known_interests<'de, D>(deserializer: D) -> Result<Vec<CareerInterest>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = string_items(deserializer)?;
    Ok(CareerInterest::filter_known(tags.iter().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_reads_stored_record() {
        let profile: Profile = serde_json::from_value(json!({
            "Name": "Alice",
            "Age": 24,
            "Education": "High School",
            "Career Interests": ["AI/ML", "Cloud Computing"],
            "Skills": ["Python", "Go"]
        }))
        .unwrap();

        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.education, EducationLevel::HighSchool);
        assert_eq!(
            profile.interests,
            vec![CareerInterest::AiMl, CareerInterest::CloudComputing]
        );
        assert_eq!(profile.skills, vec!["Python", "Go"]);
    }

    #[test]
    fn test_profile_writes_stored_field_names() {
        let value = serde_json::to_value(Profile::bootstrap("bob")).unwrap();
        assert_eq!(
            value,
            json!({
                "Name": "bob",
                "Age": 18,
                "Education": "Undergraduate",
                "Career Interests": [],
                "Skills": []
            })
        );
    }

    #[test]
    fn test_unknown_stored_interests_are_dropped() {
        let profile: Profile = serde_json::from_value(json!({
            "Career Interests": ["Basket Weaving", "Cybersecurity", 7, "Cybersecurity"]
        }))
        .unwrap();
        assert_eq!(profile.interests, vec![CareerInterest::Cybersecurity]);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let profile: Profile = serde_json::from_value(json!({})).unwrap();
        assert_eq!(profile.age, DEFAULT_AGE);
        assert_eq!(profile.education, EducationLevel::Undergraduate);
        assert_eq!(profile.display_name_or("carol"), "carol");
    }

    #[test]
    fn test_bad_field_falls_back_without_losing_the_rest() {
        let profile: Profile = serde_json::from_value(json!({
            "Name": 42,
            "Age": null,
            "Education": "PhD",
            "Career Interests": ["AI/ML"],
            "Skills": ["Python", null, "Go"]
        }))
        .unwrap();

        assert_eq!(profile.display_name, "");
        assert_eq!(profile.age, DEFAULT_AGE);
        assert_eq!(profile.education, EducationLevel::Undergraduate);
        assert_eq!(profile.interests, vec![CareerInterest::AiMl]);
        assert_eq!(profile.skills, vec!["Python", "Go"]);
    }

    #[test]
    fn test_non_integer_age_and_scalar_lists_take_defaults() {
        let profile: Profile = serde_json::from_value(json!({
            "Age": "twenty",
            "Career Interests": "AI/ML",
            "Skills": "Python"
        }))
        .unwrap();
        assert_eq!(profile.age, DEFAULT_AGE);
        assert!(profile.interests.is_empty());
        assert!(profile.skills.is_empty());
    }

    #[test]
    fn test_non_object_record_does_not_decode() {
        assert!(serde_json::from_value::<Profile>(json!("bob")).is_err());
        assert!(serde_json::from_value::<Profile>(json!([1, 2])).is_err());
    }

    #[test]
    fn test_education_parse() {
        assert_eq!("Postgraduate".parse::<EducationLevel>(), Ok(EducationLevel::Postgraduate));
        assert_eq!("High School".parse::<EducationLevel>(), Ok(EducationLevel::HighSchool));
        assert!("PhD".parse::<EducationLevel>().is_err());
    }
}
