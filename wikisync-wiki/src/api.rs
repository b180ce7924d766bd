//! Typed access to the MediaWiki action API.
//!
//! Every action has an explicit response schema. A body carrying an
//! `error` envelope becomes [`WikiError::Api`] (or [`WikiError::AuthExpired`]
//! for `badtoken`); a body that does not match the schema becomes
//! [`WikiError::MalformedResponse`].

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::WikiError;
use crate::transport::Transport;

/// Error code MediaWiki uses for a rejected CSRF / session token.
const BAD_TOKEN: &str = "badtoken";

// ---------------------------------------------------------------------------
// Response schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokensResponse {
    pub query: TokensQuery,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokensQuery {
    pub tokens: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub login: LoginResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResult {
    pub result: String,
    #[serde(default)]
    pub reason: Option<Value>,
}

impl LoginResult {
    pub fn reason(&self) -> String {
        match &self.reason {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => "unknown".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditResponse {
    pub edit: EditResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditResult {
    pub result: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteResponse {
    pub delete: DeleteResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteResult {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevisionsResponse {
    pub query: RevisionsQuery,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevisionsQuery {
    #[serde(default)]
    pub pages: HashMap<String, RevisionPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevisionPage {
    #[serde(default)]
    pub missing: Option<Value>,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Revision {
    pub slots: RevisionSlots,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevisionSlots {
    pub main: MainSlot,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MainSlot {
    #[serde(rename = "*")]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllPagesResponse {
    pub query: AllPagesQuery,
    #[serde(rename = "continue", default)]
    pub cont: Option<AllPagesContinue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllPagesQuery {
    pub allpages: Vec<PageRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageRef {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllPagesContinue {
    #[serde(default)]
    pub apcontinue: Option<String>,
}

// ---------------------------------------------------------------------------
// MediaWikiApi
// ---------------------------------------------------------------------------

/// Envelope-checking wrapper around a [`Transport`].
#[derive(Debug)]
pub struct MediaWikiApi<T> {
    transport: T,
}

impl<T: Transport> MediaWikiApi<T> {
    pub fn new(transport: T) -> Self {
        MediaWikiApi { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `params` (plus `format=json`) and decode the body as `R`.
    pub fn call<R: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<R, WikiError> {
        let action = params
            .iter()
            .find(|(k, _)| *k == "action")
            .map(|(_, v)| *v)
            .unwrap_or("unknown");

        let mut form: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        form.extend_from_slice(params);
        form.push(("format", "json"));

        let body = self.transport.post_form(&form)?;
        check_envelope(&body, action)?;
        serde_json::from_value(body).map_err(|e| WikiError::malformed(action, e.to_string()))
    }
}

fn check_envelope(body: &Value, action: &str) -> Result<(), WikiError> {
    if !body.is_object() {
        return Err(WikiError::malformed(action, "top-level value is not an object"));
    }
    let Some(raw) = body.get("error") else {
        return Ok(());
    };
    let envelope: ErrorEnvelope = serde_json::from_value(raw.clone())
        .map_err(|e| WikiError::malformed(action, format!("error envelope: {e}")))?;
    if envelope.code == BAD_TOKEN {
        return Err(WikiError::AuthExpired(envelope.info));
    }
    Err(WikiError::Api {
        code: envelope.code,
        info: envelope.info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Canned(Value);

    impl Transport for Canned {
        fn post_form(&self, params: &[(&str, &str)]) -> Result<Value, WikiError> {
            assert!(params.contains(&("format", "json")), "format=json must be sent");
            Ok(self.0.clone())
        }
    }

    #[test]
    fn badtoken_maps_to_auth_expired() {
        let api = MediaWikiApi::new(Canned(json!({
            "error": {"code": "badtoken", "info": "Invalid CSRF token."}
        })));
        let err = api.call::<EditResponse>(&[("action", "edit")]).unwrap_err();
        assert!(matches!(err, WikiError::AuthExpired(info) if info == "Invalid CSRF token."));
    }

    #[test]
    fn other_error_codes_surface_as_api_errors() {
        let api = MediaWikiApi::new(Canned(json!({
            "error": {"code": "protectedpage", "info": "This page has been protected."}
        })));
        let err = api.call::<EditResponse>(&[("action", "edit")]).unwrap_err();
        assert!(matches!(err, WikiError::Api { code, .. } if code == "protectedpage"));
    }

    #[test]
    fn shape_mismatch_is_malformed() {
        let api = MediaWikiApi::new(Canned(json!({"query": {"unexpected": true}})));
        let err = api.call::<TokensResponse>(&[("action", "query")]).unwrap_err();
        assert!(matches!(err, WikiError::MalformedResponse { action, .. } if action == "query"));
    }

    #[test]
    fn decodes_revision_content() {
        let api = MediaWikiApi::new(Canned(json!({
            "query": {"pages": {"42": {"revisions": [{"slots": {"main": {"*": "1.2.3"}}}]}}}
        })));
        let resp: RevisionsResponse = api.call(&[("action", "query")]).unwrap();
        let page = resp.query.pages.into_values().next().unwrap();
        assert!(page.missing.is_none());
        assert_eq!(page.revisions[0].slots.main.content, "1.2.3");
    }

    #[test]
    fn login_reason_defaults_to_unknown() {
        let result = LoginResult {
            result: "Failed".into(),
            reason: None,
        };
        assert_eq!(result.reason(), "unknown");
    }
}
