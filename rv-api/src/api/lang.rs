//! Per-request language negotiation

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::ACCEPT_LANGUAGE, request::Parts},
};
use rv_common::Language;
use std::convert::Infallible;

/// Language for localized response messages
///
/// Taken from the `lang` query parameter, then `Accept-Language`, then the
/// default. Never rejects a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLanguage(pub Language);

#[async_trait]
impl<S> FromRequestParts<S> for RequestLanguage
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let explicit = parts.uri.query().and_then(lang_param);
        let accept_language = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());

        Ok(Self(Language::negotiate(explicit.as_deref(), accept_language)))
    }
}

fn lang_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "lang")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn negotiate(uri: &str, accept: Option<&str>) -> Language {
        let mut builder = Request::builder().uri(uri);
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT_LANGUAGE, accept);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        let RequestLanguage(lang) = RequestLanguage::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        lang
    }

    #[tokio::test]
    async fn test_query_parameter_wins() {
        assert_eq!(negotiate("/api/recipes?lang=sv", Some("en")).await, Language::Sv);
    }

    #[tokio::test]
    async fn test_unsupported_query_falls_back_to_header() {
        assert_eq!(
            negotiate("/api/recipes?q=x&lang=xx", Some("de-DE, sv;q=0.8")).await,
            Language::Sv
        );
    }

    #[tokio::test]
    async fn test_query_parameter_with_region_is_unsupported() {
        assert_eq!(negotiate("/api/recipes?lang=sv-SE", None).await, Language::En);
        assert_eq!(negotiate("/api/recipes?lang=sv-SE", Some("sv")).await, Language::Sv);
    }

    #[tokio::test]
    async fn test_default_without_hints() {
        assert_eq!(negotiate("/api/recipes", None).await, Language::En);
    }

    #[test]
    fn test_lang_param() {
        assert_eq!(lang_param("a=1&lang=sv").as_deref(), Some("sv"));
        assert_eq!(lang_param("language=sv"), None);
    }
}
