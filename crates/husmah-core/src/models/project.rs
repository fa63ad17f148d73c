use serde::{Deserialize, Deserializer, Serialize};

use crate::validation::ValidationError;

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A project record as returned by `GET /api/Project`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    // The backend has been seen returning either `_id` or `id`
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(rename = "mainImage", default, deserialize_with = "null_as_default")]
    pub main_image: String,
    #[serde(rename = "allImages", default, deserialize_with = "null_as_default")]
    pub all_images: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub area: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flow: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bedrooms: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bathrooms: u32,
    #[serde(rename = "customerFeedback", default, deserialize_with = "null_as_default")]
    pub customer_feedback: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(rename = "createdBy", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Project {
    /// Identifier used in `/api/Project/{id}` paths
    pub fn key(&self) -> Option<&str> {
        self.mongo_id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// The subset of fields the backend accepts on update
    pub fn to_draft(&self) -> ProjectDraft {
        ProjectDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status.clone(),
            main_image: self.main_image.clone(),
            all_images: self.all_images.clone(),
            area: self.area,
            flow: self.flow,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            customer_feedback: self.customer_feedback.clone(),
        }
    }

    /// Total number of images including the main one
    pub fn image_count(&self) -> usize {
        let main = if self.main_image.is_empty() { 0 } else { 1 };
        main + self.all_images.len()
    }
}

/// Create/update payload for `POST /api/Project` and `PUT /api/Project/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
    pub status: String,
    #[serde(rename = "mainImage")]
    pub main_image: String,
    #[serde(rename = "allImages")]
    pub all_images: Vec<String>,
    pub area: f64,
    pub flow: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    #[serde(rename = "customerFeedback")]
    pub customer_feedback: String,
}

/// Optional structured attributes that can be toggled on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Area,
    Flow,
    Bedrooms,
    Bathrooms,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Area,
        Attribute::Flow,
        Attribute::Bedrooms,
        Attribute::Bathrooms,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Area => "Area",
            Attribute::Flow => "Flow",
            Attribute::Bedrooms => "Bedrooms",
            Attribute::Bathrooms => "Bathrooms",
        }
    }

    /// Current value formatted for an input field. Zero means "not set".
    pub fn value_text(&self, draft: &ProjectDraft) -> String {
        match self {
            Attribute::Area => format_number(draft.area),
            Attribute::Flow => format_number(draft.flow),
            Attribute::Bedrooms => draft.bedrooms.to_string(),
            Attribute::Bathrooms => draft.bathrooms.to_string(),
        }
    }

    pub fn is_set(&self, draft: &ProjectDraft) -> bool {
        match self {
            Attribute::Area => draft.area != 0.0,
            Attribute::Flow => draft.flow != 0.0,
            Attribute::Bedrooms => draft.bedrooms != 0,
            Attribute::Bathrooms => draft.bathrooms != 0,
        }
    }

    /// Parse `input` and store it on the draft. Empty input clears the attribute.
    pub fn apply(&self, draft: &mut ProjectDraft, input: &str) -> Result<(), ValidationError> {
        let input = input.trim();
        let invalid = || ValidationError::InvalidNumber(self.label().to_string());
        match self {
            Attribute::Area | Attribute::Flow => {
                let value = if input.is_empty() {
                    0.0
                } else {
                    input.parse::<f64>().map_err(|_| invalid())?
                };
                if !value.is_finite() || value < 0.0 {
                    return Err(invalid());
                }
                if *self == Attribute::Area {
                    draft.area = value;
                } else {
                    draft.flow = value;
                }
            }
            Attribute::Bedrooms | Attribute::Bathrooms => {
                let value = if input.is_empty() {
                    0
                } else {
                    input.parse::<u32>().map_err(|_| invalid())?
                };
                if *self == Attribute::Bedrooms {
                    draft.bedrooms = value;
                } else {
                    draft.bathrooms = value;
                }
            }
        }
        Ok(())
    }

    /// Disabled attributes are sent as zero
    pub fn clear(&self, draft: &mut ProjectDraft) {
        match self {
            Attribute::Area => draft.area = 0.0,
            Attribute::Flow => draft.flow = 0.0,
            Attribute::Bedrooms => draft.bedrooms = 0,
            Attribute::Bathrooms => draft.bathrooms = 0,
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
