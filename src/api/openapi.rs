use super::handlers::{auth, health};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI document.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` document. `/` is added outside and stays
/// undocumented.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::authenticate::authenticate))
        .routes(routes!(auth::refresh::refresh))
        .routes(routes!(auth::validate::validate))
        .routes(routes!(auth::signout::signout))
        .routes(routes!(auth::invalidate::invalidate));

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service and token store status".to_string());

    let mut authserver_tag = Tag::new("authserver");
    authserver_tag.description = Some("Yggdrasil session protocol".to_string());

    router.get_openapi_mut().tags = Some(vec![authserver_tag, health_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
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

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    let Some(start) = author.find('<') else {
        let name = author.trim();
        return ((!name.is_empty()).then_some(name), None);
    };
    let name = author[..start].trim();
    let email = author[start + 1..].trim_end_matches('>').trim();
    (
        (!name.is_empty()).then_some(name),
        (!email.is_empty()).then_some(email),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            doc.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );

        let contact = doc.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Yggauth"));
            assert_eq!(contact.email.as_deref(), Some("team@yggauth.dev"));
        }

        let license = doc.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
            assert_eq!(license.identifier.as_deref(), Some("BSD-3-Clause"));
        }
    }

    #[test]
    fn openapi_documents_every_protocol_endpoint() {
        let doc = openapi();
        let tags = doc.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "authserver"));
        assert!(tags.iter().any(|tag| tag.name == "health"));
        for path in [
            "/health",
            "/authserver/authenticate",
            "/authserver/refresh",
            "/authserver/validate",
            "/authserver/signout",
            "/authserver/invalidate",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
        assert!(!doc.paths.paths.contains_key("/"));
    }

    #[test]
    fn parse_author_variants() {
        assert_eq!(
            parse_author("Jane Doe <jane@example.com>"),
            (Some("Jane Doe"), Some("jane@example.com"))
        );
        assert_eq!(parse_author("Jane Doe"), (Some("Jane Doe"), None));
        assert_eq!(
            parse_author("<jane@example.com>"),
            (None, Some("jane@example.com"))
        );
    }
}
