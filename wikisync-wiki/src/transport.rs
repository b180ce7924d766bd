//! Form-encoded POST transport to the MediaWiki action API.

use serde_json::Value;

use wikisync_core::config::{ExtraHeader, HTTP_TIMEOUT};

use crate::error::WikiError;

/// Product user agent sent with every wiki request.
pub fn user_agent() -> String {
    format!(
        "VPMM-WikiSync/{} hackebein@gmail.com",
        env!("CARGO_PKG_VERSION")
    )
}

/// One request/response round trip against the action API.
///
/// Implementations return the decoded JSON body; envelope inspection happens
/// in [`crate::api::MediaWikiApi`].
pub trait Transport: Send + Sync {
    fn post_form(&self, params: &[(&str, &str)]) -> Result<Value, WikiError>;
}

/// ureq-backed transport with a session cookie store.
#[derive(Debug)]
pub struct HttpTransport {
    agent: ureq::Agent,
    api_url: String,
    extra_header: Option<ExtraHeader>,
}

impl HttpTransport {
    pub fn new(api_url: impl Into<String>, extra_header: Option<ExtraHeader>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(HTTP_TIMEOUT)
            .user_agent(&user_agent())
            .build();
        HttpTransport {
            agent,
            api_url: api_url.into(),
            extra_header,
        }
    }
}

impl Transport for HttpTransport {
    fn post_form(&self, params: &[(&str, &str)]) -> Result<Value, WikiError> {
        let mut request = self.agent.post(&self.api_url);
        if let Some(header) = &self.extra_header {
            request = request.set(&header.name, &header.value);
        }
        let response = request.send_form(params).map_err(|err| match err {
            ureq::Error::Status(status, _) => {
                WikiError::Transport(format!("HTTP {status} from {}", self.api_url))
            }
            ureq::Error::Transport(t) => WikiError::Transport(t.to_string()),
        })?;
        response
            .into_json::<Value>()
            .map_err(|e| WikiError::malformed("http", format!("body is not JSON: {e}")))
    }
}
