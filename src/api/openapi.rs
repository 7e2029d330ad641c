use axum::Json;
use utoipa::{
    openapi::{Contact, InfoBuilder, License, OpenApi as OpenApiDoc},
    OpenApi,
};

use super::{
    error::ErrorEnvelope,
    handlers::{adv, health},
};
use crate::{
    advertisement::Deleted,
    schema::ValidationFailure,
    store::{Advertisement, NewAdvertisement},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        adv::create_advertisement,
        adv::get_advertisement,
        adv::delete_advertisement,
        health::health,
    ),
    components(schemas(
        Advertisement,
        NewAdvertisement,
        Deleted,
        ErrorEnvelope,
        ValidationFailure,
        health::Health,
    )),
    tags(
        (name = "adv", description = "Create, fetch and delete advertisements"),
        (name = "health", description = "Service and database status"),
    )
)]
struct ApiDoc;

/// The `OpenAPI` document, with info taken from Cargo metadata.
#[must_use]
pub fn openapi() -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();
    doc.info = cargo_info();
    doc
}

/// GET `/api-docs/openapi.json`
pub async fn serve() -> Json<OpenApiDoc> {
    Json(openapi())
}

fn cargo_info() -> utoipa::openapi::Info {
    // Use Cargo.toml metadata instead of the utoipa crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();
    info
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.find('<') {
        Some(start) => (
            non_empty(author[..start].trim()),
            non_empty(author[start + 1..].trim_end_matches('>').trim()),
        ),
        None => (non_empty(author.trim()), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));

        let contact = spec.info.contact.unwrap_or_default();
        assert_eq!(contact.name.as_deref(), Some("Team Adverts"));
        assert_eq!(contact.email.as_deref(), Some("team@adverts.dev"));

        let license = spec.info.license.map(|license| license.name);
        assert_eq!(license.as_deref(), Some("BSD-3-Clause"));
    }

    #[test]
    fn openapi_documents_every_route() {
        let spec = openapi();
        assert!(spec.paths.paths.contains_key("/adv/"));
        assert!(spec.paths.paths.contains_key("/adv/{id}/"));
        assert!(spec.paths.paths.contains_key("/health"));

        let tags = spec.tags.unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "adv"));
    }

    #[test]
    fn parse_author_variants() {
        assert_eq!(
            parse_author("Team <team@x.dev>"),
            (Some("Team"), Some("team@x.dev"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
        assert_eq!(parse_author("<only@x.dev>"), (None, Some("only@x.dev")));
    }
}
