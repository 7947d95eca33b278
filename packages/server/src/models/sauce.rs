use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::sauce;
use crate::error::AppError;

/// Descriptive fields of a sauce, shared by create and update payloads.
///
/// The owner id is never part of the payload; it always comes from the
/// authenticated caller. Unknown fields are ignored, so a client-supplied
/// `user_id` is dropped on the floor.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SaucePayload {
    pub name: String,
    pub manufacturer: String,
    pub description: String,
    pub main_pepper: String,
    pub heat: i32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct VoteRequest {
    /// `1` = like, `-1` = dislike, `0` = retract the current vote.
    pub like: i8,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SauceResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub manufacturer: String,
    pub description: String,
    pub main_pepper: String,
    pub heat: i32,
    pub image_url: String,
    pub likes: i32,
    pub dislikes: i32,
    pub users_liked: Vec<i32>,
    pub users_disliked: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Acknowledgement envelope for operations that report a message only.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl From<sauce::Model> for SauceResponse {
    fn from(m: sauce::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            manufacturer: m.manufacturer,
            description: m.description,
            main_pepper: m.main_pepper,
            heat: m.heat,
            image_url: m.image_url,
            likes: m.likes,
            dislikes: m.dislikes,
            users_liked: m.users_liked.iter().collect(),
            users_disliked: m.users_disliked.iter().collect(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_sauce_payload(payload: &SaucePayload) -> Result<(), AppError> {
    validate_text_field("name", &payload.name)?;
    validate_text_field("manufacturer", &payload.manufacturer)?;
    validate_text_field("main_pepper", &payload.main_pepper)?;

    let description = payload.description.trim();
    if description.is_empty() || description.chars().count() > 2048 {
        return Err(AppError::Validation(
            "description must be 1-2048 characters".into(),
        ));
    }
    if !(1..=10).contains(&payload.heat) {
        return Err(AppError::Validation("heat must be 1-10".into()));
    }
    Ok(())
}

fn validate_text_field(name: &str, value: &str) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > 256 {
        return Err(AppError::Validation(format!(
            "{name} must be 1-256 characters"
        )));
    }
    Ok(())
}
