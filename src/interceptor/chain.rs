use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use super::Interceptor;
use crate::error::CleanupError;
use crate::mapping::HandlerInfo;
use crate::server::{Request, Response};

/// Where a request currently is in the interceptor pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    NotStarted,
    PreRunning,
    Rejected,
    PreComplete,
    PostComplete,
    Cleanup,
}

/// Per-request driver of the interceptor hooks for one route.
///
/// `interceptor_index` is the high-water mark of pre-hooks reached (the
/// rejecting or failing interceptor included); cleanup runs from there back
/// to the first interceptor. Never shared between requests.
pub struct HandlerExecutionChain<'r> {
    handler: &'r HandlerInfo,
    interceptors: &'r [Arc<dyn Interceptor>],
    interceptor_index: Option<usize>,
    state: ChainState,
    completion: Option<Result<(), CleanupError>>,
}

impl<'r> HandlerExecutionChain<'r> {
    #[must_use]
    pub fn new(handler: &'r HandlerInfo, interceptors: &'r [Arc<dyn Interceptor>]) -> Self {
        Self {
            handler,
            interceptors,
            interceptor_index: None,
            state: ChainState::NotStarted,
            completion: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ChainState {
        self.state
    }

    #[must_use]
    pub fn interceptor_index(&self) -> Option<usize> {
        self.interceptor_index
    }

    /// Run pre-hooks in registration order, stopping at the first rejection.
    ///
    /// On rejection the cleanup hooks of every interceptor reached run before
    /// `Ok(false)` is returned; the cleanup outcome is kept and replayed by the
    /// next [`trigger_after_completion`](Self::trigger_after_completion). A
    /// pre-hook `Err` is propagated without running cleanup; the caller owns
    /// the failure path.
    pub fn apply_pre_handle(&mut self, req: &Request, res: &Response) -> anyhow::Result<bool> {
        self.state = ChainState::PreRunning;
        let interceptors = self.interceptors;
        for (i, interceptor) in interceptors.iter().enumerate() {
            self.interceptor_index = Some(i);
            if !interceptor.pre_handle(req, res, self.handler)? {
                debug!(
                    interceptor = interceptor.name(),
                    position = i,
                    handler = %self.handler,
                    "Pre-handle rejected request"
                );
                self.state = ChainState::Rejected;
                // a broken cleanup phase is not a pre-handle failure; the
                // dispatcher replays the stored outcome
                if let Err(e) = self.trigger_after_completion(req, res, None) {
                    debug!(error = %e, "Cleanup phase aborted after rejection");
                }
                return Ok(false);
            }
        }
        self.state = ChainState::PreComplete;
        Ok(true)
    }

    /// Run post-hooks in reverse registration order.
    pub fn apply_post_handle(
        &mut self,
        req: &Request,
        res: &Response,
        result: &Value,
    ) -> anyhow::Result<()> {
        for interceptor in self.interceptors.iter().rev() {
            interceptor.post_handle(req, res, self.handler, result)?;
        }
        self.state = ChainState::PostComplete;
        Ok(())
    }

    /// Run cleanup hooks from the high-water mark down to the first
    /// interceptor.
    ///
    /// Each hook is isolated: an `Err` or a panic is logged and discarded and
    /// the remaining hooks still run. `Err` is returned only when the cleanup
    /// phase itself breaks down outside a hook. Only the first call does any
    /// work; later calls return the first outcome.
    pub fn trigger_after_completion(
        &mut self,
        req: &Request,
        res: &Response,
        failure: Option<&anyhow::Error>,
    ) -> Result<(), CleanupError> {
        if let Some(done) = &self.completion {
            return done.clone();
        }
        self.state = ChainState::Cleanup;

        let handler = self.handler;
        let interceptors = self.interceptors;
        let reached = match self.interceptor_index {
            Some(high) => interceptors.get(..=high).unwrap_or(interceptors),
            None => &[],
        };

        let result = catch_unwind(AssertUnwindSafe(|| {
            for interceptor in reached.iter().rev() {
                run_cleanup_hook(interceptor.as_ref(), req, res, handler, failure);
            }
        }))
        .map_err(|payload| CleanupError {
            reason: panic_message(payload.as_ref()),
        });
        self.completion = Some(result.clone());
        result
    }
}

fn run_cleanup_hook(
    interceptor: &dyn Interceptor,
    req: &Request,
    res: &Response,
    handler: &HandlerInfo,
    failure: Option<&anyhow::Error>,
) {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        interceptor.after_completion(req, res, handler, failure)
    }));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(
            interceptor = interceptor.name(),
            handler = %handler,
            error = %e,
            "Cleanup hook failed, continuing"
        ),
        Err(payload) => error!(
            interceptor = interceptor.name(),
            handler = %handler,
            panic_message = %panic_message(payload.as_ref()),
            "Cleanup hook panicked, continuing"
        ),
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        allow: bool,
        fail_cleanup: bool,
        log: Log,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                allow: true,
                fail_cleanup: false,
                log: Arc::clone(log),
            }
        }
    }

    impl Interceptor for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn pre_handle(&self, _: &Request, _: &Response, _: &HandlerInfo) -> anyhow::Result<bool> {
            self.log.lock().push(format!("{}.pre", self.name));
            Ok(self.allow)
        }

        fn post_handle(
            &self,
            _: &Request,
            _: &Response,
            _: &HandlerInfo,
            _: &Value,
        ) -> anyhow::Result<()> {
            self.log.lock().push(format!("{}.post", self.name));
            Ok(())
        }

        fn after_completion(
            &self,
            _: &Request,
            _: &Response,
            _: &HandlerInfo,
            failure: Option<&anyhow::Error>,
        ) -> anyhow::Result<()> {
            let tag = if failure.is_some() { "after(err)" } else { "after" };
            self.log.lock().push(format!("{}.{tag}", self.name));
            if self.fail_cleanup {
                anyhow::bail!("cleanup of {} failed", self.name);
            }
            Ok(())
        }
    }

    fn handler() -> HandlerInfo {
        HandlerInfo {
            controller: "demoController".into(),
            method: "query",
            pattern: "/demo/query".into(),
            method_security: None,
            class_security: None,
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().clone()
    }

    #[test]
    fn test_short_circuit_stops_and_cleans_up_reached() {
        let log = Log::default();
        let mut b = Recorder::new("B", &log);
        b.allow = false;
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Recorder::new("A", &log)),
            Arc::new(b),
            Arc::new(Recorder::new("C", &log)),
        ];
        let info = handler();
        let req = Request::get("/demo/query");
        let res = Response::new();
        let mut chain = HandlerExecutionChain::new(&info, &interceptors);

        assert!(!chain.apply_pre_handle(&req, &res).unwrap());
        assert_eq!(chain.interceptor_index(), Some(1));
        assert_eq!(chain.state(), ChainState::Cleanup);
        assert_eq!(entries(&log), ["A.pre", "B.pre", "B.after", "A.after"]);

        // a second trigger is a no-op
        chain.trigger_after_completion(&req, &res, None).unwrap();
        assert_eq!(entries(&log).len(), 4);
    }

    #[test]
    fn test_full_pass_runs_post_in_reverse() {
        let log = Log::default();
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(Recorder::new("A", &log)),
            Arc::new(Recorder::new("B", &log)),
        ];
        let info = handler();
        let req = Request::get("/demo/query");
        let res = Response::new();
        let mut chain = HandlerExecutionChain::new(&info, &interceptors);

        assert!(chain.apply_pre_handle(&req, &res).unwrap());
        assert_eq!(chain.state(), ChainState::PreComplete);
        chain.apply_post_handle(&req, &res, &Value::Null).unwrap();
        assert_eq!(chain.state(), ChainState::PostComplete);
        chain.trigger_after_completion(&req, &res, None).unwrap();
        assert_eq!(
            entries(&log),
            ["A.pre", "B.pre", "B.post", "A.post", "B.after", "A.after"]
        );
    }

    #[test]
    fn test_cleanup_error_does_not_stop_siblings() {
        let log = Log::default();
        let mut a = Recorder::new("A", &log);
        a.fail_cleanup = true;
        let mut b = Recorder::new("B", &log);
        b.fail_cleanup = true;
        let interceptors: Vec<Arc<dyn Interceptor>> =
            vec![Arc::new(a), Arc::new(b), Arc::new(Recorder::new("C", &log))];
        let info = handler();
        let req = Request::get("/");
        let res = Response::new();
        let mut chain = HandlerExecutionChain::new(&info, &interceptors);

        assert!(chain.apply_pre_handle(&req, &res).unwrap());
        let failure = anyhow::anyhow!("handler blew up");
        chain
            .trigger_after_completion(&req, &res, Some(&failure))
            .unwrap();
        assert_eq!(
            &entries(&log)[3..],
            ["C.after(err)", "B.after(err)", "A.after(err)"]
        );
    }

    #[test]
    fn test_cleanup_panic_is_discarded_and_siblings_run() {
        struct Panicky;
        impl Interceptor for Panicky {
            fn name(&self) -> &str {
                "Panicky"
            }
            fn after_completion(
                &self,
                _: &Request,
                _: &Response,
                _: &HandlerInfo,
                _: Option<&anyhow::Error>,
            ) -> anyhow::Result<()> {
                panic!("boom");
            }
        }

        let log = Log::default();
        let interceptors: Vec<Arc<dyn Interceptor>> =
            vec![Arc::new(Recorder::new("A", &log)), Arc::new(Panicky)];
        let info = handler();
        let req = Request::get("/");
        let res = Response::new();
        let mut chain = HandlerExecutionChain::new(&info, &interceptors);

        assert!(chain.apply_pre_handle(&req, &res).unwrap());
        chain.trigger_after_completion(&req, &res, None).unwrap();
        assert_eq!(entries(&log), ["A.pre", "A.after"]);
    }

    #[test]
    fn test_cleanup_panic_on_rejection_still_rejects() {
        struct RejectAndPanic;
        impl Interceptor for RejectAndPanic {
            fn name(&self) -> &str {
                "RejectAndPanic"
            }
            fn pre_handle(
                &self,
                _: &Request,
                _: &Response,
                _: &HandlerInfo,
            ) -> anyhow::Result<bool> {
                Ok(false)
            }
            fn after_completion(
                &self,
                _: &Request,
                _: &Response,
                _: &HandlerInfo,
                _: Option<&anyhow::Error>,
            ) -> anyhow::Result<()> {
                panic!("boom");
            }
        }

        let log = Log::default();
        let interceptors: Vec<Arc<dyn Interceptor>> =
            vec![Arc::new(Recorder::new("A", &log)), Arc::new(RejectAndPanic)];
        let info = handler();
        let req = Request::get("/");
        let res = Response::new();
        let mut chain = HandlerExecutionChain::new(&info, &interceptors);

        assert!(!chain.apply_pre_handle(&req, &res).unwrap());
        assert_eq!(entries(&log), ["A.pre", "A.after"]);
        chain.trigger_after_completion(&req, &res, None).unwrap();
    }

    #[test]
    fn test_no_interceptors_is_a_pass() {
        let info = handler();
        let req = Request::get("/");
        let res = Response::new();
        let mut chain = HandlerExecutionChain::new(&info, &[]);
        assert!(chain.apply_pre_handle(&req, &res).unwrap());
        assert_eq!(chain.interceptor_index(), None);
        chain.trigger_after_completion(&req, &res, None).unwrap();
    }
}
