//! Live MediaWiki backend with token management and login.
//!
//! ## Write retry
//!
//! Every mutating call runs inside [`LiveWiki::with_csrf_retry`]:
//!
//! 1. Fetch (or reuse) the CSRF token and run the operation.
//! 2. On [`WikiError::AuthExpired`]: drop the CSRF token, log in again when
//!    credentials are configured, and run the operation once more.
//! 3. A second failure is returned to the caller as-is.

use wikisync_core::config::Credentials;

use crate::api::{
    AllPagesResponse, DeleteResponse, EditResponse, LoginResponse, MediaWikiApi,
    RevisionsResponse, TokensResponse,
};
use crate::error::WikiError;
use crate::tokens::{TokenCache, TokenKind};
use crate::transport::Transport;
use crate::{plan_edit, WikiGateway, WriteResult};

/// Write attempts per operation: the first try plus one after re-login.
const MAX_WRITE_ATTEMPTS: usize = 2;

/// `apnamespace` value for the `Template:` namespace.
const TEMPLATE_NAMESPACE: &str = "10";
const MAIN_NAMESPACE: &str = "0";
const TEMPLATE_PREFIX: &str = "Template:";

#[derive(Debug)]
pub struct LiveWiki<T> {
    api: MediaWikiApi<T>,
    tokens: TokenCache,
    credentials: Option<Credentials>,
}

impl<T: Transport> LiveWiki<T> {
    /// Build a client without logging in.
    pub fn new(transport: T, credentials: Option<Credentials>) -> Self {
        LiveWiki {
            api: MediaWikiApi::new(transport),
            tokens: TokenCache::new(),
            credentials,
        }
    }

    /// Build a client and log in when credentials are present.
    pub fn connect(transport: T, credentials: Option<Credentials>) -> Result<Self, WikiError> {
        let wiki = Self::new(transport, credentials);
        if wiki.credentials.is_some() {
            wiki.login()?;
        }
        Ok(wiki)
    }

    pub fn api(&self) -> &MediaWikiApi<T> {
        &self.api
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Cached token for `kind`, fetched through `meta=tokens` on first use.
    pub fn token(&self, kind: TokenKind) -> Result<String, WikiError> {
        self.tokens.get_or_fetch(kind, || {
            let resp: TokensResponse = self.api.call(&[
                ("action", "query"),
                ("meta", "tokens"),
                ("type", kind.as_str()),
            ])?;
            resp.query
                .tokens
                .get(kind.response_key())
                .cloned()
                .ok_or_else(|| {
                    WikiError::malformed("query", format!("missing {}", kind.response_key()))
                })
        })
    }

    /// Log in with the configured credentials and reset the token cache.
    pub fn login(&self) -> Result<(), WikiError> {
        let Some(creds) = &self.credentials else {
            return Err(WikiError::LoginFailed {
                reason: "no credentials configured".to_string(),
            });
        };
        let login_token = self.token(TokenKind::Login)?;
        let resp: LoginResponse = self.api.call(&[
            ("action", "login"),
            ("lgname", &creds.username),
            ("lgpassword", &creds.password),
            ("lgtoken", &login_token),
        ])?;
        if resp.login.result != "Success" {
            return Err(WikiError::LoginFailed {
                reason: resp.login.reason(),
            });
        }
        // The new session invalidates every token issued to the old one.
        self.tokens.clear();
        tracing::info!(user = %creds.username, "wiki login success");
        Ok(())
    }

    fn relogin_if_possible(&self) -> Result<(), WikiError> {
        if self.credentials.is_none() {
            return Ok(());
        }
        self.tokens.invalidate(TokenKind::Login);
        self.login()
    }

    /// Run a CSRF-protected operation with one re-login retry on
    /// [`WikiError::AuthExpired`].
    pub fn with_csrf_retry<R, F>(&self, op: F) -> Result<R, WikiError>
    where
        F: Fn(&str) -> Result<R, WikiError>,
    {
        let mut attempt = 1;
        loop {
            let csrf = self.token(TokenKind::Csrf)?;
            match op(&csrf) {
                Err(WikiError::AuthExpired(info)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!(attempt, info = %info, "csrf token rejected, re-authenticating");
                    self.tokens.invalidate(TokenKind::Csrf);
                    self.relogin_if_possible()?;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl<T: Transport> WikiGateway for LiveWiki<T> {
    fn get_content(&self, title: &str) -> Result<String, WikiError> {
        let resp: RevisionsResponse = self.api.call(&[
            ("action", "query"),
            ("titles", title),
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("rvslots", "main"),
        ])?;
        let page = resp
            .query
            .pages
            .into_values()
            .next()
            .ok_or_else(|| WikiError::malformed("query", format!("no pages for {title}")))?;
        if page.missing.is_some() {
            return Err(WikiError::NotFound {
                title: title.to_string(),
            });
        }
        let revision = page
            .revisions
            .into_iter()
            .next()
            .ok_or_else(|| WikiError::malformed("query", format!("no revisions for {title}")))?;
        Ok(revision.slots.main.content)
    }

    fn edit_page(&self, title: &str, text: &str, bot: bool) -> Result<WriteResult, WikiError> {
        let current = match self.get_content(title) {
            Ok(content) => Some(content),
            Err(WikiError::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        let Some((summary, result)) = plan_edit(title, current.as_deref(), text) else {
            return Ok(WriteResult::Unchanged {
                title: title.to_string(),
            });
        };

        self.with_csrf_retry(|csrf| {
            let mut params = vec![
                ("action", "edit"),
                ("title", title),
                ("text", text),
                ("summary", summary.as_str()),
                ("token", csrf),
            ];
            if bot {
                params.push(("bot", "true"));
            }
            let resp: EditResponse = self.api.call(&params)?;
            if resp.edit.result != "Success" {
                return Err(WikiError::EditRejected {
                    title: title.to_string(),
                    result: resp.edit.result,
                });
            }
            Ok(())
        })?;

        tracing::info!(title, bot, "wiki edit success");
        Ok(result)
    }

    fn delete_page(&self, title: &str, reason: &str) -> Result<WriteResult, WikiError> {
        let reason = reason.trim();
        self.with_csrf_retry(|csrf| {
            let mut params = vec![("action", "delete"), ("title", title), ("token", csrf)];
            if !reason.is_empty() {
                params.push(("reason", reason));
            }
            let resp: DeleteResponse = self.api.call(&params)?;
            tracing::info!(title = %resp.delete.title, reason, "wiki delete success");
            Ok(())
        })?;
        Ok(WriteResult::Deleted {
            title: title.to_string(),
        })
    }

    fn list_pages(&self, prefix: &str) -> Result<Vec<String>, WikiError> {
        let (namespace, apprefix) = match prefix.strip_prefix(TEMPLATE_PREFIX) {
            Some(rest) => (TEMPLATE_NAMESPACE, rest),
            None => (MAIN_NAMESPACE, prefix),
        };

        let mut titles = Vec::new();
        let mut apcontinue: Option<String> = None;
        loop {
            let mut params = vec![
                ("action", "query"),
                ("list", "allpages"),
                ("apnamespace", namespace),
                ("apprefix", apprefix),
                ("aplimit", "500"),
            ];
            if let Some(cont) = apcontinue.as_deref() {
                params.push(("apcontinue", cont));
            }
            let resp: AllPagesResponse = self.api.call(&params)?;
            titles.extend(
                resp.query
                    .allpages
                    .into_iter()
                    .map(|p| p.title)
                    .filter(|t| !t.is_empty()),
            );
            match resp.cont.and_then(|c| c.apcontinue).filter(|c| !c.is_empty()) {
                Some(next) => apcontinue = Some(next),
                None => break,
            }
        }
        tracing::debug!(prefix, count = titles.len(), "listed wiki pages");
        Ok(titles)
    }
}
