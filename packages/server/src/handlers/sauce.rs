use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use common::storage::{self, ImageStore};
use sea_orm::*;
use tracing::instrument;

use crate::entity::sauce;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::sauce::{
    MessageResponse, SaucePayload, SauceResponse, VoteRequest, validate_sauce_payload,
};
use crate::state::AppState;
use crate::utils::asset;
use crate::utils::ownership::require_owner;
use crate::vote::{self, VoteIntent, VoteOutcome};

/// Body limit layer for image upload routes (16MB).
pub fn image_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024)
}

#[utoipa::path(
    post,
    path = "/api/sauces",
    tag = "Sauces",
    operation_id = "createSauce",
    summary = "Create a new sauce",
    description = "Creates a sauce from a multipart form: a `sauce` field holding the JSON \
        payload and an `image` file (required). The owner is always the authenticated caller; \
        an owner id in the payload is ignored.",
    request_body(content_type = "multipart/form-data", description = "`sauce` JSON field plus `image` file"),
    responses(
        (status = 201, description = "Sauce created", body = SauceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_sauce(
    auth_user: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_sauce_form(multipart, &*state.images).await?;

    let outcome = async {
        let payload = form
            .payload
            .as_ref()
            .ok_or_else(|| AppError::Validation("Missing 'sauce' field".into()))?;
        validate_sauce_payload(payload)?;

        let image_key = form
            .image_key
            .as_deref()
            .ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;
        let image_url = asset::build_image_url(&request_base(&headers, &state), image_key);

        let now = chrono::Utc::now();
        let new_sauce = sauce::ActiveModel {
            user_id: Set(auth_user.user_id),
            name: Set(payload.name.trim().to_string()),
            manufacturer: Set(payload.manufacturer.trim().to_string()),
            description: Set(payload.description.trim().to_string()),
            main_pepper: Set(payload.main_pepper.trim().to_string()),
            heat: Set(payload.heat),
            image_url: Set(image_url),
            likes: Set(0),
            dislikes: Set(0),
            users_liked: Set(sauce::UserIdSet::new()),
            users_disliked: Set(sauce::UserIdSet::new()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = new_sauce.insert(&state.db).await?;

        Ok((StatusCode::CREATED, Json(SauceResponse::from(model))))
    }
    .await;

    // A failed create must not leave the fresh upload behind.
    if outcome.is_err()
        && let Some(key) = &form.image_key
    {
        discard_upload(&*state.images, key).await;
    }

    outcome
}

#[utoipa::path(
    get,
    path = "/api/sauces",
    tag = "Sauces",
    operation_id = "listSauces",
    summary = "List all sauces",
    responses(
        (status = 200, description = "All sauces", body = Vec<SauceResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_sauces(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SauceResponse>>, AppError> {
    let sauces = sauce::Entity::find().all(&state.db).await?;
    Ok(Json(sauces.into_iter().map(SauceResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/sauces/{id}",
    tag = "Sauces",
    operation_id = "getSauce",
    summary = "Get a sauce by ID",
    params(("id" = i32, Path, description = "Sauce ID")),
    responses(
        (status = 200, description = "Sauce details", body = SauceResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Sauce not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_sauce(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SauceResponse>, AppError> {
    let model = find_sauce(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/api/sauces/{id}",
    tag = "Sauces",
    operation_id = "updateSauce",
    summary = "Replace a sauce's descriptive fields",
    description = "Full replacement of the descriptive fields, allowed only for the creator. \
        Send multipart (`sauce` field plus `image` file) to replace the image as well, or a bare \
        JSON body to keep it. When the image is replaced, deletion of the old file is attempted \
        but never fails the update. Votes are untouched.",
    params(("id" = i32, Path, description = "Sauce ID")),
    responses(
        (status = 200, description = "Sauce updated", body = SauceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Sauce not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, req), fields(id, user_id = auth_user.user_id))]
pub async fn update_sauce(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    req: Request,
) -> Result<Json<SauceResponse>, AppError> {
    // Authorization precedes body parsing and any asset work.
    let existing = find_sauce(&state.db, id).await?;
    require_owner(&existing, auth_user.user_id)?;

    let headers = req.headers().clone();
    let (payload, new_image_key) = read_update_body(req, &state).await?;

    let outcome = async {
        let payload =
            payload.ok_or_else(|| AppError::Validation("Missing 'sauce' field".into()))?;
        validate_sauce_payload(&payload)?;

        let old_image_url = existing.image_url.clone();

        let mut active: sauce::ActiveModel = existing.into();
        active.name = Set(payload.name.trim().to_string());
        active.manufacturer = Set(payload.manufacturer.trim().to_string());
        active.description = Set(payload.description.trim().to_string());
        active.main_pepper = Set(payload.main_pepper.trim().to_string());
        active.heat = Set(payload.heat);
        if let Some(key) = &new_image_key {
            active.image_url = Set(asset::build_image_url(&request_base(&headers, &state), key));
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&state.db).await?;

        // The record now points at the new file; the old one is stale.
        if new_image_key.is_some() {
            asset::release_image(&*state.images, &old_image_url).await;
        }

        Ok(Json(SauceResponse::from(model)))
    }
    .await;

    if outcome.is_err()
        && let Some(key) = &new_image_key
    {
        discard_upload(&*state.images, key).await;
    }

    outcome
}

#[utoipa::path(
    delete,
    path = "/api/sauces/{id}",
    tag = "Sauces",
    operation_id = "deleteSauce",
    summary = "Delete a sauce",
    description = "Deletes a sauce and attempts to remove its image. Allowed only for the \
        creator. An undeletable image never leaves the record behind.",
    params(("id" = i32, Path, description = "Sauce ID")),
    responses(
        (status = 204, description = "Sauce deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Sauce not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_sauce(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_sauce(&state.db, id).await?;
    require_owner(&existing, auth_user.user_id)?;

    // Best effort; an orphaned file is acceptable, a dangling record is not.
    asset::release_image(&*state.images, &existing.image_url).await;

    sauce::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/sauces/{id}/like",
    tag = "Sauces",
    operation_id = "voteSauce",
    summary = "Like, dislike, or retract a vote on a sauce",
    description = "Applies the caller's vote intent: `1` likes, `-1` dislikes, `0` retracts. \
        Repeating the current vote is a no-op; voting the opposite way switches atomically. \
        Membership sets and counters change together or not at all.",
    params(("id" = i32, Path, description = "Sauce ID")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote applied", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Sauce not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn vote_sauce(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload?;
    let intent = VoteIntent::from_wire(payload.like)?;

    let txn = state.db.begin().await?;
    let sauce = find_sauce_for_update(&txn, id).await?;

    let transition = vote::apply(
        &sauce.users_liked,
        &sauce.users_disliked,
        auth_user.user_id,
        intent,
    );
    let outcome = transition.outcome;

    if outcome != VoteOutcome::Unchanged {
        // Sets and counters land in one row update; votes touch nothing else.
        let mut active: sauce::ActiveModel = sauce.into();
        active.users_liked = Set(transition.users_liked);
        active.users_disliked = Set(transition.users_disliked);
        active.likes = Set(transition.likes);
        active.dislikes = Set(transition.dislikes);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    Ok(Json(MessageResponse {
        message: outcome.message().to_string(),
    }))
}

/// Parsed `sauce` + `image` multipart form. The image, when present, has
/// already been stored; callers own releasing it when the surrounding
/// operation fails.
struct SauceForm {
    payload: Option<SaucePayload>,
    image_key: Option<String>,
}

async fn read_sauce_form(
    mut multipart: Multipart,
    store: &dyn ImageStore,
) -> Result<SauceForm, AppError> {
    let mut payload: Option<SaucePayload> = None;
    let mut image_key: Option<String> = None;

    let result = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some("sauce") => {
                    let text = field.text().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read sauce payload: {e}"))
                    })?;
                    payload = Some(serde_json::from_str(&text).map_err(|e| {
                        AppError::Validation(format!("Malformed sauce payload: {e}"))
                    })?);
                }
                Some("image") => {
                    if image_key.is_some() {
                        return Err(AppError::Validation("Duplicate 'image' field".into()));
                    }
                    let extension = field
                        .file_name()
                        .and_then(storage::file_extension)
                        .map(str::to_owned);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
                    image_key = Some(store.put(extension.as_deref(), &data).await?);
                }
                _ => {} // Ignore unknown fields.
            }
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => Ok(SauceForm { payload, image_key }),
        Err(e) => {
            if let Some(key) = &image_key {
                discard_upload(store, key).await;
            }
            Err(e)
        }
    }
}

/// Update bodies come in two shapes: multipart when the client replaces the
/// image, bare JSON when it keeps it.
async fn read_update_body(
    req: Request,
    state: &AppState,
) -> Result<(Option<SaucePayload>, Option<String>), AppError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;
        let form = read_sauce_form(multipart, &*state.images).await?;
        Ok((form.payload, form.image_key))
    } else {
        let Json(payload) = Json::<SaucePayload>::from_request(req, &()).await?;
        Ok((Some(payload), None))
    }
}

/// Remove a freshly stored upload after the surrounding operation failed.
async fn discard_upload(store: &dyn ImageStore, key: &str) {
    if let Err(e) = store.delete(key).await {
        tracing::warn!(key, error = %e, "failed to clean up image after aborted mutation");
    }
}

/// URL base for image references: the request's Host header, falling back
/// to the configured public URL.
fn request_base(headers: &HeaderMap, state: &AppState) -> String {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| format!("http://{host}"))
        .unwrap_or_else(|| state.config.server.public_url.clone())
}

async fn find_sauce<C: ConnectionTrait>(db: &C, id: i32) -> Result<sauce::Model, AppError> {
    sauce::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sauce not found".into()))
}

/// Load a sauce under a row lock so a vote transition reads and writes it
/// without interleaving with a concurrent transition on the same record.
async fn find_sauce_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<sauce::Model, AppError> {
    use sea_orm::sea_query::LockType;
    sauce::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Sauce not found".into()))
}
