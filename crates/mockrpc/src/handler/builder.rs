//! ResponseBuilder - declares a programmatic handler from a closure.

use super::context::{HandlerContext, Values};
use super::{Handler, ProgrammaticHandler};
use crate::types::{Fault, Params, Response};
use serde_json::Value;
use std::sync::Arc;

type BodyFn = dyn Fn(&HandlerContext<'_>) -> Result<Response, Fault> + Send + Sync;

/// Builds a [`ProgrammaticHandler`] from a closure and a set of named values.
///
/// The closure receives a [`HandlerContext`] with the call's params bound.
/// Assertions on the context return `Err(Fault)` so the body can bail out
/// with `?`; whatever the body returns in `Ok` becomes the response.
///
/// ```
/// use mockrpc::{Expect, ResponseBuilder, ABSENT};
/// use serde_json::json;
///
/// let handler = ResponseBuilder::new(|ctx| {
///     ctx.assert_bugzilla_auth("calvin", "hobbes")?;
///     ctx.assert_params([("ids", Expect::from(json!([1]))), ("limit", ABSENT)])?;
///     Ok(json!({"bugs": [ctx.value("bug")?]}))
/// })
/// .with_value("bug", json!({"id": 1}))
/// .build();
/// # let _ = handler;
/// ```
pub struct ResponseBuilder {
    body: Arc<BodyFn>,
    values: Values,
}

impl ResponseBuilder {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&HandlerContext<'_>) -> Result<Response, Fault> + Send + Sync + 'static,
    {
        Self {
            body: Arc::new(body),
            values: Values::new(),
        }
    }

    /// Make `value` available inside the body as `ctx.value(name)`.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_values(mut self, values: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.values.extend(values);
        self
    }

    pub fn build(self) -> ProgrammaticHandler {
        ProgrammaticHandler::new(ClosureHandler {
            body: self.body,
            values: self.values,
        })
    }
}

struct ClosureHandler {
    body: Arc<BodyFn>,
    values: Values,
}

impl Handler for ClosureHandler {
    fn call(&self, params: &Params) -> Result<Response, Fault> {
        let ctx = HandlerContext::new(params, &self.values);
        (self.body)(&ctx)
    }
}
