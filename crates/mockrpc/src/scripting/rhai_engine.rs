use crate::handler::{check_bugzilla_auth, check_param, Expect, Handler, Values};
use crate::types::{Fault, Params, Response};
use rhai::{Dynamic, Engine, EvalAltResult, Map, Position, Scope, AST};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Sentinel exposed to scripts as `ABSENT`.
#[derive(Debug, Clone, Copy)]
struct Absent;

/// Rhai script answering one action
#[derive(Clone)]
pub struct ScriptHandler {
    ast: Arc<AST>,
    action: String,
    values: Arc<Values>,
}

impl ScriptHandler {
    pub fn compile(action: &str, script: &str, values: Arc<Values>) -> Result<Self, String> {
        let ast = Engine::new()
            .compile(script)
            .map_err(|e| format!("Failed to compile script: {e}"))?;

        Ok(Self {
            ast: Arc::new(ast),
            action: action.to_string(),
            values,
        })
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Engine with the assertion primitives bound to this call's params.
    fn create_engine(params: Arc<Params>) -> Engine {
        let mut engine = Engine::new();
        engine.register_type_with_name::<Absent>("Absent");

        let bound = Arc::clone(&params);
        engine.register_fn(
            "assert_params",
            move |expected: Map| -> Result<(), Box<EvalAltResult>> {
                for (key, value) in expected {
                    let expect = if value.is::<Absent>() {
                        Expect::Absent
                    } else {
                        let value = dynamic_to_json(value).map_err(|e| {
                            fault_to_eval(Fault::halt(format!("assert_params \"{key}\": {e}")))
                        })?;
                        Expect::Value(value)
                    };
                    check_param(&bound, key.as_str(), &expect).map_err(fault_to_eval)?;
                }
                Ok(())
            },
        );

        let bound = params;
        engine.register_fn(
            "assert_bugzilla_auth",
            move |user: &str, password: &str| -> Result<(), Box<EvalAltResult>> {
                check_bugzilla_auth(&bound, user, password).map_err(fault_to_eval)
            },
        );

        engine.register_fn(
            "halt",
            |message: &str| -> Result<(), Box<EvalAltResult>> {
                Err(fault_to_eval(Fault::halt(message)))
            },
        );

        engine
    }
}

impl Handler for ScriptHandler {
    fn call(&self, params: &Params) -> Result<Response, Fault> {
        let engine = Self::create_engine(Arc::new(params.clone()));
        let mut scope = Scope::new();

        let values: serde_json::Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        // Not constants: non-pure map methods such as `contains` need a variable.
        scope.push("params", json_to_dynamic(Value::Object(params.clone())));
        scope.push("values", json_to_dynamic(Value::Object(values)));
        scope.push_constant("ABSENT", Absent);

        match engine.eval_ast_with_scope::<Dynamic>(&mut scope, self.ast.as_ref()) {
            Ok(result) => dynamic_to_json(result).map_err(|e| {
                Fault::halt(format!("invalid response from script for {}: {e}", self.action))
            }),
            Err(err) => Err(fault_from_eval(&self.action, *err)),
        }
    }
}

fn fault_to_eval(fault: Fault) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(Dynamic::from(fault), Position::NONE).into()
}

/// Faults raised by the primitives travel as runtime errors; `throw` with any
/// other value halts with its string form.
fn fault_from_eval(action: &str, err: EvalAltResult) -> Fault {
    match err {
        EvalAltResult::ErrorRuntime(value, _) if value.is::<Fault>() => value.cast::<Fault>(),
        EvalAltResult::ErrorRuntime(value, _) => Fault::halt(value.to_string()),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => fault_from_eval(action, *inner),
        other => {
            warn!("Script for {} failed: {}", action, other);
            Fault::halt(format!("script error: {other}"))
        }
    }
}

pub(super) fn json_to_dynamic(value: Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else if let Some(f) = n.as_f64() {
                Dynamic::from(f)
            } else {
                Dynamic::UNIT
            }
        }
        Value::String(s) => Dynamic::from(s),
        Value::Array(arr) => {
            let vec: Vec<Dynamic> = arr.into_iter().map(json_to_dynamic).collect();
            Dynamic::from(vec)
        }
        Value::Object(obj) => {
            let mut map = Map::new();
            for (k, v) in obj {
                map.insert(k.into(), json_to_dynamic(v));
            }
            Dynamic::from(map)
        }
    }
}

/// Convert a script value back to JSON. `ABSENT` and other values with no
/// JSON form (function pointers, ranges, timestamps) are rejected.
pub(super) fn dynamic_to_json(value: Dynamic) -> Result<Value, String> {
    if value.is_unit() {
        Ok(Value::Null)
    } else if let Ok(b) = value.as_bool() {
        Ok(Value::Bool(b))
    } else if let Ok(i) = value.as_int() {
        Ok(Value::Number(i.into()))
    } else if let Ok(f) = value.as_float() {
        Ok(serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null))
    } else if let Ok(c) = value.as_char() {
        Ok(Value::String(c.to_string()))
    } else if value.is::<Absent>() {
        Err("ABSENT is only allowed as a top-level assert_params value".to_string())
    } else if let Some(s) = value.clone().try_cast::<String>() {
        Ok(Value::String(s))
    } else if let Some(arr) = value.clone().try_cast::<Vec<Dynamic>>() {
        arr.into_iter()
            .map(dynamic_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    } else if let Some(map) = value.clone().try_cast::<Map>() {
        let mut obj = serde_json::Map::new();
        for (k, v) in map {
            obj.insert(k.to_string(), dynamic_to_json(v)?);
        }
        Ok(Value::Object(obj))
    } else {
        Err(format!("a value of type {} that has no JSON form", value.type_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handler(script: &str) -> ScriptHandler {
        let values: Values = [
            ("user".to_string(), json!("calvin")),
            ("password".to_string(), json!("hobbes")),
        ]
        .into_iter()
        .collect();
        ScriptHandler::compile("Test.action", script, Arc::new(values)).unwrap()
    }

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_final_expression_is_response() {
        let h = handler(r#"#{ foo: "foo", ids: [1, 2], ok: true }"#);
        assert_eq!(
            h.call(&Params::new()).unwrap(),
            json!({"foo": "foo", "ids": [1, 2], "ok": true})
        );
        assert_eq!(h.action(), "Test.action");
    }

    #[test]
    fn test_assert_params_mismatch() {
        let h = handler(
            r#"
            assert_params(#{ foo: "foo" });
            #{ foo: "foo" }
            "#,
        );
        assert_eq!(
            h.call(&params(json!({"foo": "baz"}))).unwrap_err(),
            Fault::new(1, r#"expected "foo" to be "foo"; got "baz""#)
        );
        assert_eq!(
            h.call(&params(json!({"foo": "foo"}))).unwrap(),
            json!({"foo": "foo"})
        );
    }

    #[test]
    fn test_assert_params_absent() {
        let h = handler(
            r#"
            assert_params(#{ limit: ABSENT });
            "ok"
            "#,
        );
        assert_eq!(
            h.call(&params(json!({"limit": 5}))).unwrap_err().message,
            r#"expected "limit" not to be passed; got 5"#
        );
        assert_eq!(h.call(&Params::new()).unwrap(), json!("ok"));
    }

    #[test]
    fn test_assert_params_nested_values() {
        let h = handler(
            r#"
            assert_params(#{ ids: [123] });
            #{ bugs: [] }
            "#,
        );
        assert_eq!(
            h.call(&params(json!({"ids": [123]}))).unwrap(),
            json!({"bugs": []})
        );
        assert_eq!(
            h.call(&params(json!({"ids": [999]}))).unwrap_err().message,
            r#"expected "ids" to be [123]; got [999]"#
        );
    }

    #[test]
    fn test_bugzilla_auth_with_values() {
        let h = handler(
            r#"
            assert_bugzilla_auth(values.user, values.password);
            #{ id: 1 }
            "#,
        );
        assert_eq!(
            h.call(&params(json!({"Bugzilla_login": "susie"})))
                .unwrap_err()
                .message,
            r#"expected "Bugzilla_login" to be "calvin"; got "susie""#
        );
        assert_eq!(
            h.call(&params(
                json!({"Bugzilla_login": "calvin", "Bugzilla_password": "hobbes"})
            ))
            .unwrap(),
            json!({"id": 1})
        );
    }

    #[test]
    fn test_halt_and_throw() {
        let h = handler(r#"halt("nope"); 1"#);
        assert_eq!(h.call(&Params::new()).unwrap_err(), Fault::new(1, "nope"));

        let h = handler(r#"throw "thrown""#);
        assert_eq!(h.call(&Params::new()).unwrap_err(), Fault::new(1, "thrown"));
    }

    #[test]
    fn test_halt_inside_script_function() {
        let h = handler(
            r#"
            fn check(p) {
                if p.foo != "foo" { halt("bad foo"); }
            }
            check(params);
            "ok"
            "#,
        );
        assert_eq!(
            h.call(&params(json!({"foo": "bar"}))).unwrap_err(),
            Fault::new(1, "bad foo")
        );
    }

    #[test]
    fn test_runtime_error_becomes_fault() {
        let h = handler("undefined_function()");
        let fault = h.call(&Params::new()).unwrap_err();
        assert_eq!(fault.code, 1);
        assert!(fault.message.starts_with("script error:"), "{}", fault.message);
    }

    #[test]
    fn test_json_round_trip_preserves_types() {
        let value = json!({"s": "x", "i": 3, "f": 1.5, "b": false, "n": null, "a": [1, "two"]});
        assert_eq!(dynamic_to_json(json_to_dynamic(value.clone())).unwrap(), value);
    }

    #[test]
    fn test_map_methods_on_params() {
        let h = handler(
            r#"
            if !params.contains("summary") {
                halt("summary is required");
            }
            params.remove("summary");
            #{ rest: params.keys(), user: values.user }
            "#,
        );
        assert_eq!(
            h.call(&params(json!({"summary": "x", "product": "Firefox"}))).unwrap(),
            json!({"rest": ["product"], "user": "calvin"})
        );
        assert_eq!(
            h.call(&params(json!({"product": "Firefox"}))).unwrap_err().message,
            "summary is required"
        );
    }

    #[test]
    fn test_nested_absent_is_rejected() {
        let h = handler(
            r#"
            assert_params(#{ ids: [ABSENT] });
            "ok"
            "#,
        );
        assert_eq!(
            h.call(&params(json!({"ids": [1]}))).unwrap_err(),
            Fault::new(
                1,
                r#"assert_params "ids": ABSENT is only allowed as a top-level assert_params value"#
            )
        );

        let h = handler("#{ ids: [ABSENT] }");
        let fault = h.call(&Params::new()).unwrap_err();
        assert_eq!(
            fault.message,
            "invalid response from script for Test.action: ABSENT is only allowed as a top-level assert_params value"
        );
        assert!(!fault.message.contains("rhai_engine"));
    }

    #[test]
    fn test_assert_params_checks_keys_alphabetically() {
        let h = handler(
            r#"
            assert_params(#{ zeta: 1, alpha: 2 });
            "ok"
            "#,
        );
        assert_eq!(
            h.call(&params(json!({"zeta": 0, "alpha": 0}))).unwrap_err().message,
            r#"expected "alpha" to be 2; got 0"#
        );
    }
}
