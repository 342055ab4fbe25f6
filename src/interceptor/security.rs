use http::StatusCode;
use tracing::{debug, info};

use super::Interceptor;
use crate::mapping::HandlerInfo;
use crate::server::{Request, Response};

/// Default request parameter carrying the caller identity.
pub const DEFAULT_IDENTITY_PARAM: &str = "username";

/// Body written when a caller is rejected.
pub const REJECTION_MESSAGE: &str = "No Access Permission";

/// Authorization by permitted caller identity.
///
/// Looks at the handler's method-level identity list, falling back to the
/// controller's list when the method has none. Handlers with neither are
/// open. The caller identity is read from a request parameter.
#[derive(Debug, Clone)]
pub struct SecurityInterceptor {
    identity_param: String,
}

impl Default for SecurityInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityInterceptor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            identity_param: DEFAULT_IDENTITY_PARAM.to_string(),
        }
    }

    #[must_use]
    pub fn with_identity_param(mut self, name: impl Into<String>) -> Self {
        self.identity_param = name.into();
        self
    }

    #[must_use]
    pub fn identity_param(&self) -> &str {
        &self.identity_param
    }
}

impl Interceptor for SecurityInterceptor {
    fn name(&self) -> &str {
        "SecurityInterceptor"
    }

    fn pre_handle(
        &self,
        req: &Request,
        res: &Response,
        handler: &HandlerInfo,
    ) -> anyhow::Result<bool> {
        let Some(permitted) = handler.permitted_identities() else {
            return Ok(true);
        };

        let caller = req.param(&self.identity_param);
        let pass = caller.is_some_and(|c| permitted.iter().any(|p| p == c));
        if pass {
            debug!(handler = %handler, caller = ?caller, "Caller permitted");
        } else {
            info!(
                handler = %handler,
                caller = ?caller,
                permitted = ?permitted,
                "Caller rejected"
            );
            res.set_status(StatusCode::FORBIDDEN);
            res.set_header("content-type", "text/plain; charset=utf-8");
            res.write(REJECTION_MESSAGE);
        }
        Ok(pass)
    }
}
