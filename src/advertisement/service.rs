use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{AdvError, Deleted, ALREADY_EXISTS};
use crate::{
    schema::CREATE_ADVERTISEMENT,
    store::{Advertisement, NewAdvertisement, Session, StoreError},
};

/// Validate `payload`, insert it and commit.
///
/// A title collision at insert or commit rolls the transaction back and
/// returns [`AdvError::Conflict`]; nothing is retried.
/// # Errors
/// `Validation` for a bad payload, `Conflict` for a taken title,
/// `Unrecoverable` for any other store failure.
#[instrument(skip_all)]
pub async fn create<S>(session: &mut S, payload: Value) -> Result<Advertisement, AdvError>
where
    S: Session + ?Sized,
{
    let fields = CREATE_ADVERTISEMENT.validate(&payload)?;
    let new: NewAdvertisement = serde_json::from_value(Value::Object(fields))
        .map_err(|err| AdvError::Unrecoverable(err.into()))?;

    let written = match session.insert(&new).await {
        Ok(record) => session.commit().await.map(|()| record),
        Err(err) => Err(err),
    };

    match written {
        Ok(record) => {
            info!(id = record.id, "advertisement created");
            Ok(record)
        }
        Err(err) => {
            if let Err(rollback) = session.rollback().await {
                warn!("rollback after failed insert: {rollback}");
            }
            if err.is_unique_violation() {
                debug!(title = %new.title, "title already taken");
                Err(AdvError::Conflict(ALREADY_EXISTS))
            } else {
                Err(err.into())
            }
        }
    }
}

/// Fetch one advertisement.
/// # Errors
/// `NotFound` when no record has `id`.
#[instrument(skip(session))]
pub async fn get<S>(session: &mut S, id: i64) -> Result<Advertisement, AdvError>
where
    S: Session + ?Sized,
{
    session
        .find(id)
        .await?
        .ok_or_else(|| AdvError::not_found(id))
}

/// Delete one advertisement and commit.
/// # Errors
/// `NotFound` when no record has `id`, including when a concurrent request
/// deleted it between lookup and delete.
#[instrument(skip(session))]
pub async fn delete<S>(session: &mut S, id: i64) -> Result<Deleted, AdvError>
where
    S: Session + ?Sized,
{
    let record = get(session, id).await?;

    if !session.delete(id).await? {
        return Err(AdvError::not_found(id));
    }
    if let Err(err) = session.commit().await {
        let vanished = matches!(err, StoreError::Vanished(_));
        let err = rolled_back(session, err).await;
        return Err(if vanished { AdvError::not_found(id) } else { err });
    }
    info!(id, "advertisement deleted");

    Ok(Deleted::new(record.title))
}

async fn rolled_back<S>(session: &mut S, err: StoreError) -> AdvError
where
    S: Session + ?Sized,
{
    if let Err(rollback) = session.rollback().await {
        warn!("rollback after failed commit: {rollback}");
    }
    err.into()
}
