//! Draft-mode capability. The content layer only consumes the resulting
//! boolean; deciding whether a caller may see drafts happens here, behind a
//! trait so page handlers and tests can swap the policy.
use subtle::ConstantTimeEq;

use crate::locale::{Locale, RequestContext};

pub trait PreviewAuthorizer: Send + Sync {
    /// Whether `token` unlocks draft mode.
    fn authorize(&self, token: Option<&str>) -> bool;
}

/// Never grants draft mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyPreview;

impl PreviewAuthorizer for DenyPreview {
    fn authorize(&self, _token: Option<&str>) -> bool {
        false
    }
}

/// Grants draft mode when the caller presents the configured secret. A blank
/// or missing secret disables preview altogether.
#[derive(Clone)]
pub struct SharedSecret {
    secret: Option<String>,
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("enabled", &self.secret.is_some())
            .finish()
    }
}

impl SharedSecret {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.trim().is_empty()),
        }
    }
}

impl PreviewAuthorizer for SharedSecret {
    fn authorize(&self, token: Option<&str>) -> bool {
        match (&self.secret, token) {
            (Some(secret), Some(token)) => secret.as_bytes().ct_eq(token.as_bytes()).into(),
            _ => false,
        }
    }
}

/// Request context for a page: locale from the path, preview only when the
/// authorizer accepts the presented token.
pub fn request_context(
    authorizer: &dyn PreviewAuthorizer,
    path: &str,
    token: Option<&str>,
) -> RequestContext {
    RequestContext::new(Locale::from_path(path), authorizer.authorize(token))
}
