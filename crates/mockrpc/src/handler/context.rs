//! Evaluation context and assertion primitives for programmatic handlers.
//!
//! Assertions return `Err(Fault)` on the first mismatch so handler bodies can
//! short-circuit with `?`.

use crate::types::{Fault, Params};
use serde_json::Value;
use std::collections::HashMap;

/// Named values supplied when a handler is declared.
pub type Values = HashMap<String, Value>;

/// Expected state of a single param.
#[derive(Debug, Clone, PartialEq)]
pub enum Expect {
    /// The key must not be passed at all
    Absent,
    /// The key must be passed with a deep-equal value
    Value(Value),
}

/// Shorthand for [`Expect::Absent`].
pub const ABSENT: Expect = Expect::Absent;

impl From<Value> for Expect {
    fn from(value: Value) -> Self {
        Expect::Value(value)
    }
}

impl From<&str> for Expect {
    fn from(value: &str) -> Self {
        Expect::Value(Value::from(value))
    }
}

impl From<String> for Expect {
    fn from(value: String) -> Self {
        Expect::Value(Value::from(value))
    }
}

impl From<i64> for Expect {
    fn from(value: i64) -> Self {
        Expect::Value(Value::from(value))
    }
}

impl From<bool> for Expect {
    fn from(value: bool) -> Self {
        Expect::Value(Value::from(value))
    }
}

/// Read-only view of one call: the inbound params plus the handler's named
/// values.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    params: &'a Params,
    values: &'a Values,
}

impl<'a> HandlerContext<'a> {
    pub fn new(params: &'a Params, values: &'a Values) -> Self {
        Self { params, values }
    }

    pub fn params(&self) -> &'a Params {
        self.params
    }

    pub fn param(&self, key: &str) -> Option<&'a Value> {
        self.params.get(key)
    }

    pub fn values(&self) -> &'a Values {
        self.values
    }

    /// Named value supplied at declaration time. Unknown names are a fault
    /// rather than a panic so a typo shows up in the client's error.
    pub fn value(&self, name: &str) -> Result<&'a Value, Fault> {
        self.values
            .get(name)
            .ok_or_else(|| Fault::halt(format!("undefined value {}", quote(name))))
    }

    /// Check each key in order; the first mismatch aborts with a fault.
    pub fn assert_params<I, K, E>(&self, expected: I) -> Result<(), Fault>
    where
        I: IntoIterator<Item = (K, E)>,
        K: AsRef<str>,
        E: Into<Expect>,
    {
        for (key, expect) in expected {
            check_param(self.params, key.as_ref(), &expect.into())?;
        }
        Ok(())
    }

    /// Check `Bugzilla_login`, then `Bugzilla_password`.
    pub fn assert_bugzilla_auth(&self, user: &str, password: &str) -> Result<(), Fault> {
        check_bugzilla_auth(self.params, user, password)
    }

    /// Abort evaluation with `message`.
    pub fn halt<T>(&self, message: impl Into<String>) -> Result<T, Fault> {
        halt(message)
    }
}

/// Abort evaluation with a fault carrying `message`.
pub fn halt<T>(message: impl Into<String>) -> Result<T, Fault> {
    Err(Fault::halt(message))
}

/// Assert a single param against its expected state.
pub fn check_param(params: &Params, key: &str, expect: &Expect) -> Result<(), Fault> {
    let actual = params.get(key);
    match (expect, actual) {
        (Expect::Absent, None) => Ok(()),
        (Expect::Absent, Some(actual)) => halt(format!(
            "expected {} not to be passed; got {}",
            quote(key),
            actual
        )),
        (Expect::Value(expected), Some(actual)) if actual == expected => Ok(()),
        (Expect::Value(expected), actual) => halt(format!(
            "expected {} to be {}; got {}",
            quote(key),
            expected,
            actual.unwrap_or(&Value::Null)
        )),
    }
}

pub fn check_bugzilla_auth(params: &Params, user: &str, password: &str) -> Result<(), Fault> {
    check_param(params, "Bugzilla_login", &Expect::from(user))?;
    check_param(params, "Bugzilla_password", &Expect::from(password))
}

fn quote(s: &str) -> String {
    Value::from(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn message<T: std::fmt::Debug>(result: Result<T, Fault>) -> String {
        let fault = result.unwrap_err();
        assert_eq!(fault.code, 1);
        fault.message
    }

    #[test]
    fn test_assert_params_value_mismatch() {
        let values = Values::new();
        let p = params(json!({"foo": "baz"}));
        let ctx = HandlerContext::new(&p, &values);
        assert_eq!(
            message(ctx.assert_params([("foo", "foo")])),
            r#"expected "foo" to be "foo"; got "baz""#
        );
    }

    #[test]
    fn test_assert_params_value_missing() {
        let values = Values::new();
        let p = Params::new();
        let ctx = HandlerContext::new(&p, &values);
        assert_eq!(
            message(ctx.assert_params([("ids", json!([1, 2]))])),
            r#"expected "ids" to be [1,2]; got null"#
        );
    }

    #[test]
    fn test_assert_params_absent() {
        let values = Values::new();
        let present = params(json!({"foo": "bar"}));
        let ctx = HandlerContext::new(&present, &values);
        assert_eq!(
            message(ctx.assert_params([("foo", ABSENT)])),
            r#"expected "foo" not to be passed; got "bar""#
        );

        let missing = params(json!({"other": 1}));
        let ctx = HandlerContext::new(&missing, &values);
        assert!(ctx.assert_params([("foo", ABSENT)]).is_ok());
    }

    #[test]
    fn test_assert_params_explicit_null_is_not_absent() {
        let values = Values::new();
        let p = params(json!({"foo": null}));
        let ctx = HandlerContext::new(&p, &values);
        assert_eq!(
            message(ctx.assert_params([("foo", ABSENT)])),
            r#"expected "foo" not to be passed; got null"#
        );
    }

    #[test]
    fn test_assert_params_first_failure_wins() {
        let values = Values::new();
        let p = params(json!({"a": 1, "b": 2}));
        let ctx = HandlerContext::new(&p, &values);
        let err = message(ctx.assert_params([
            ("a", Expect::from(1)),
            ("b", Expect::from(3)),
            ("c", Expect::from(4)),
        ]));
        assert_eq!(err, r#"expected "b" to be 3; got 2"#);
    }

    #[test]
    fn test_assert_params_passes() {
        let values = Values::new();
        let p = params(json!({"foo": "bar", "ids": [1]}));
        let ctx = HandlerContext::new(&p, &values);
        assert!(ctx
            .assert_params([
                ("foo", Expect::from("bar")),
                ("ids", Expect::from(json!([1]))),
                ("missing", ABSENT),
            ])
            .is_ok());
    }

    #[test]
    fn test_bugzilla_auth_checks_login_first() {
        let values = Values::new();
        let p = params(json!({"Bugzilla_login": "susie", "Bugzilla_password": "wrong"}));
        let ctx = HandlerContext::new(&p, &values);
        assert_eq!(
            message(ctx.assert_bugzilla_auth("calvin", "hobbes")),
            r#"expected "Bugzilla_login" to be "calvin"; got "susie""#
        );
    }

    #[test]
    fn test_bugzilla_auth_password() {
        let values = Values::new();
        let p = params(json!({"Bugzilla_login": "calvin", "Bugzilla_password": "tiger"}));
        let ctx = HandlerContext::new(&p, &values);
        assert_eq!(
            message(ctx.assert_bugzilla_auth("calvin", "hobbes")),
            r#"expected "Bugzilla_password" to be "hobbes"; got "tiger""#
        );
    }

    #[test]
    fn test_bugzilla_auth_passes() {
        let values = Values::new();
        let p = params(json!({"Bugzilla_login": "calvin", "Bugzilla_password": "hobbes"}));
        let ctx = HandlerContext::new(&p, &values);
        assert!(ctx.assert_bugzilla_auth("calvin", "hobbes").is_ok());
    }

    #[test]
    fn test_value_lookup() {
        let values: Values = [("user".to_string(), json!("calvin"))].into_iter().collect();
        let p = Params::new();
        let ctx = HandlerContext::new(&p, &values);
        assert_eq!(ctx.value("user").unwrap(), &json!("calvin"));
        assert_eq!(message(ctx.value("nope")), r#"undefined value "nope""#);
    }

    #[test]
    fn test_halt() {
        let result: Result<(), Fault> = halt("stop right there");
        assert_eq!(result.unwrap_err(), Fault::new(1, "stop right there"));
    }
}
