use serde_json::Value;
use tracing::{debug, warn};

use super::Interceptor;
use crate::mapping::HandlerInfo;
use crate::server::{Request, Response};

/// Logs every hook invocation at debug level, and handler failures seen
/// during cleanup at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInterceptor;

impl Interceptor for TracingInterceptor {
    fn name(&self) -> &str {
        "TracingInterceptor"
    }

    fn pre_handle(&self, req: &Request, _res: &Response, handler: &HandlerInfo) -> anyhow::Result<bool> {
        debug!(
            method = %req.method(),
            path = %req.path(),
            handler = %handler,
            "pre_handle"
        );
        Ok(true)
    }

    fn post_handle(
        &self,
        _req: &Request,
        res: &Response,
        handler: &HandlerInfo,
        result: &Value,
    ) -> anyhow::Result<()> {
        debug!(
            handler = %handler,
            status = res.status().as_u16(),
            has_result = !result.is_null(),
            "post_handle"
        );
        Ok(())
    }

    fn after_completion(
        &self,
        req: &Request,
        res: &Response,
        handler: &HandlerInfo,
        failure: Option<&anyhow::Error>,
    ) -> anyhow::Result<()> {
        match failure {
            Some(e) => warn!(
                path = %req.path(),
                handler = %handler,
                error = %e,
                "after_completion with failure"
            ),
            None => debug!(
                path = %req.path(),
                handler = %handler,
                status = res.status().as_u16(),
                "after_completion"
            ),
        }
        Ok(())
    }
}
