//! Fault construction for fixture misses.

use crate::fixture::Fixture;
use crate::types::{Fault, Params};

/// Fault returned when no entry of `fixture` matches `params`.
///
/// Uses the fixture's `error_message` template when present, otherwise the
/// generic "missing or invalid params" message.
pub fn not_found(action: &str, fixture: &Fixture, params: &Params) -> Fault {
    match &fixture.error_message {
        Some(template) => Fault::halt(template.render(action, params)),
        None => Fault::halt(format!("Method \"{action}\" missing or invalid params!")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MessageTemplate;
    use serde_json::json;

    #[test]
    fn test_default_message() {
        let fault = not_found("Bug.get", &Fixture::default(), &Params::new());
        assert_eq!(fault.code, 1);
        assert_eq!(fault.message, r#"Method "Bug.get" missing or invalid params!"#);
    }

    #[test]
    fn test_template_message() {
        let fixture = Fixture {
            valid_requests: vec![],
            error_message: Some(
                MessageTemplate::parse("Bug #${params.ids.0} does not exist (${action})").unwrap(),
            ),
        };
        let params = json!({"ids": [999]}).as_object().cloned().unwrap();
        let fault = not_found("Bug.get", &fixture, &params);
        assert_eq!(fault.code, 1);
        assert_eq!(fault.message, "Bug #999 does not exist (Bug.get)");
    }
}
