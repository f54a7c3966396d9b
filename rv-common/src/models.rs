//! Recipe model types
//!
//! `Recipe` is the only persisted entity. `RecipeDraft` is what the scraper
//! hands back, `RecipePatch` is the partial-update payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Stored recipe, serialized in the camelCase shape the frontend consumes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i64,
    pub source_url: String,
    pub title: String,
    #[serde(serialize_with = "empty_if_none")]
    pub description: Option<String>,
    #[serde(rename = "image", serialize_with = "empty_if_none")]
    pub image_url: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub servings: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub prep_time: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub cook_time: Option<String>,
    #[serde(serialize_with = "empty_if_none")]
    pub total_time: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    /// `None` while the recipe is active
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Merge a partial update into this recipe.
    ///
    /// Absent keys keep the stored value. Present keys replace it, including
    /// with an empty string; `null` clears the optional text fields. The
    /// title only changes to a non-blank value, and the two lists only change
    /// when the payload carried a well-formed list of strings.
    pub fn apply_patch(&mut self, patch: RecipePatch) {
        if let Field::Value(title) = patch.title {
            let title = title.trim();
            if title.is_empty() {
                debug!(id = self.id, "Ignoring blank title in update");
            } else {
                self.title = title.to_string();
            }
        }

        self.description = patch.description.apply(self.description.take());
        self.image_url = patch.image.apply(self.image_url.take());
        self.servings = patch.servings.apply(self.servings.take());
        self.prep_time = patch.prep_time.apply(self.prep_time.take());
        self.cook_time = patch.cook_time.apply(self.cook_time.take());
        self.total_time = patch.total_time.apply(self.total_time.take());

        if let Field::Value(ingredients) = patch.ingredients {
            self.ingredients = ingredients;
        }
        if let Field::Value(instructions) = patch.instructions {
            self.instructions = instructions;
        }
    }
}

/// Recipe fields extracted from a third-party page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "image")]
    pub image_url: Option<String>,
    pub servings: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// A single field of a partial update
///
/// Distinguishes a key that was never sent from one sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Field<T> {
    /// Resolve against the currently stored value
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Field::Absent => current,
            Field::Null => None,
            Field::Value(value) => Some(value),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Value(value),
            None => Field::Null,
        })
    }
}

/// Partial update payload for `PUT /api/recipes/:id`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipePatch {
    pub title: Field<String>,
    pub description: Field<String>,
    pub image: Field<String>,
    pub servings: Field<String>,
    pub prep_time: Field<String>,
    pub cook_time: Field<String>,
    pub total_time: Field<String>,
    #[serde(deserialize_with = "lenient_string_list")]
    pub ingredients: Field<Vec<String>>,
    #[serde(deserialize_with = "lenient_string_list")]
    pub instructions: Field<Vec<String>>,
}

/// Accept any JSON for a list field; only an array of strings counts.
///
/// Anything else degrades to `Absent` so the stored list is kept instead of
/// failing the whole request.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Field<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    match serde_json::from_value::<Vec<String>>(raw) {
        Ok(list) => Ok(Field::Value(list)),
        Err(e) => {
            debug!("Ignoring malformed list in update: {}", e);
            Ok(Field::Absent)
        }
    }
}

fn empty_if_none<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

/// Serialize a string list for a TEXT column
pub fn encode_string_list(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| String::from("[]"))
}

/// Read a string list back from a TEXT column
///
/// Legacy free text, non-array JSON and arrays holding anything other than
/// strings all read as an empty list.
pub fn decode_string_list(raw: Option<&str>) -> Vec<String> {
    match raw.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(text) => serde_json::from_str::<Vec<String>>(text).unwrap_or_default(),
    }
}
