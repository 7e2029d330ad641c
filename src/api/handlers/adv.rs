use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    Json,
};
use serde_json::Value;

use crate::{
    advertisement::{self, AdvError, Deleted},
    api::error::{ErrorEnvelope, ROUTE_NOT_FOUND},
    schema::ValidationFailure,
    session::SessionScope,
    store::{Advertisement, NewAdvertisement},
};

/// Path ids that are not integers match no resource.
fn parse_id(raw: &str) -> Result<i64, AdvError> {
    raw.parse()
        .map_err(|_| AdvError::NotFound(ROUTE_NOT_FOUND.to_string()))
}

#[utoipa::path(
    post,
    path = "/adv/",
    request_body = NewAdvertisement,
    responses(
        (status = 200, description = "Advertisement created.", body = Advertisement),
        (status = 400, description = "Invalid payload, or the title is already taken.", body = ErrorEnvelope),
    ),
    tag = "adv"
)]
/// Creates an advertisement; `id` and `creationDate` are assigned by the store.
pub async fn create_advertisement(
    scope: Extension<SessionScope>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Advertisement>, AdvError> {
    let Json(payload) =
        payload.map_err(|rejection| ValidationFailure::json_invalid(rejection.body_text()))?;

    scope
        .run(move |session| Box::pin(advertisement::create(session, payload)))
        .await
        .map(Json)
}

#[utoipa::path(
    get,
    path = "/adv/{id}/",
    params(("id" = i64, Path, description = "Advertisement id")),
    responses(
        (status = 200, description = "Advertisement found.", body = Advertisement),
        (status = 404, description = "No advertisement with this id.", body = ErrorEnvelope),
    ),
    tag = "adv"
)]
pub async fn get_advertisement(
    Path(id): Path<String>,
    scope: Extension<SessionScope>,
) -> Result<Json<Advertisement>, AdvError> {
    let id = parse_id(&id)?;

    scope
        .run(move |session| Box::pin(advertisement::get(session, id)))
        .await
        .map(Json)
}

#[utoipa::path(
    delete,
    path = "/adv/{id}/",
    params(("id" = i64, Path, description = "Advertisement id")),
    responses(
        (status = 200, description = "Advertisement deleted.", body = Deleted),
        (status = 404, description = "No advertisement with this id.", body = ErrorEnvelope),
    ),
    tag = "adv"
)]
/// Deletes an advertisement and echoes its title.
pub async fn delete_advertisement(
    Path(id): Path<String>,
    scope: Extension<SessionScope>,
) -> Result<Json<Deleted>, AdvError> {
    let id = parse_id(&id)?;

    scope
        .run(move |session| Box::pin(advertisement::delete(session, id)))
        .await
        .map(Json)
}
