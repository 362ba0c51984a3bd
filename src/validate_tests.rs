//! Schema validation: one error, at the first offending location.

#[cfg(test)]
mod tests {
    use crate::ast::{InitialValue, PropValue, ViewNode};
    use crate::error::ErrorCode;
    use crate::options::CompileOptions;
    use crate::validate::{validate, validate_layout_with_options, validate_with_options};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn program(view: Value) -> Value {
        json!({
            "version": "1.0",
            "state": { "count": { "type": "number", "initial": 0 } },
            "actions": [],
            "view": view
        })
    }

    fn text(value: Value) -> Value {
        json!({ "kind": "text", "value": { "expr": "lit", "value": value } })
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Accepted programs
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_minimal_program() {
        let parsed = validate(&program(text(json!("hi")))).unwrap();
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.state.len(), 1);
        assert!(matches!(parsed.view, ViewNode::Text(_)));
    }

    #[test]
    fn test_null_optional_sections_are_absent() {
        let mut raw = program(text(json!("hi")));
        raw["route"] = Value::Null;
        raw["components"] = Value::Null;
        let parsed = validate(&raw).unwrap();
        assert!(parsed.route.is_none());
        assert!(parsed.components.is_empty());
    }

    #[test]
    fn test_cookie_initial_is_threaded_through() {
        let raw = json!({
            "version": "1.0",
            "state": {
                "theme": {
                    "type": "string",
                    "initial": { "expr": "cookie", "key": "theme", "default": "dark" }
                }
            },
            "actions": [],
            "view": text(json!("x"))
        });
        let parsed = validate(&raw).unwrap();
        assert!(matches!(parsed.state["theme"].initial, InitialValue::Deferred(_)));
    }

    #[test]
    fn test_object_initial_with_expr_key_is_a_literal() {
        let raw = json!({
            "version": "1.0",
            "state": {
                "filter": { "type": "object", "initial": { "expr": "x > 1" } }
            },
            "actions": [],
            "view": text(json!("x"))
        });
        let parsed = validate(&raw).unwrap();
        assert_eq!(
            parsed.state["filter"].initial,
            InitialValue::Literal(json!({ "expr": "x > 1" }))
        );
    }

    #[test]
    fn test_event_handler_prop_is_told_apart_by_event_key() {
        let raw = json!({
            "version": "1.0",
            "state": {},
            "actions": [{ "name": "go", "steps": [] }],
            "view": {
                "kind": "element",
                "tag": "button",
                "props": {
                    "onClick": { "event": "click", "action": "go", "debounce": 200 },
                    "class": { "expr": "lit", "value": "btn" }
                }
            }
        });
        let parsed = validate(&raw).unwrap();
        let ViewNode::Element(button) = &parsed.view else {
            panic!("expected element");
        };
        assert!(matches!(button.props["onClick"], PropValue::Handler(_)));
        assert!(matches!(button.props["class"], PropValue::Expr(_)));
    }

    #[test]
    fn test_transition_without_duration_validates() {
        let raw = program(json!({
            "kind": "if",
            "condition": { "expr": "lit", "value": true },
            "then": text(json!("shown")),
            "transition": { "enter": "a", "enterActive": "b", "exit": "c", "exitActive": "d" }
        }));
        let parsed = validate(&raw).unwrap();
        let ViewNode::If(node) = &parsed.view else {
            panic!("expected if");
        };
        assert_eq!(node.transition.as_ref().and_then(|t| t.duration.clone()), None);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Rejected programs
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_missing_view_is_reported_at_its_path() {
        let err = validate(&json!({ "version": "1.0", "state": {}, "actions": [] })).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaInvalid);
        assert_eq!(err.path.as_deref(), Some("/view"));
        assert_eq!(err.message, "Missing required field 'view'");
    }

    #[test]
    fn test_non_object_root() {
        let err = validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaInvalid);
        assert_eq!(err.path.as_deref(), Some(""));
    }

    #[test]
    fn test_unsupported_version() {
        let mut raw = program(text(json!("x")));
        raw["version"] = json!("2.0");
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedVersion);
        assert_eq!(err.path.as_deref(), Some("/version"));
    }

    #[test]
    fn test_unknown_expression_type_lists_known_types() {
        let raw = program(json!({ "kind": "text", "value": { "expr": "magic" } }));
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("/view/value/expr"));
        assert_eq!(err.message, "Unknown expression type 'magic'");
        let expected = err.context.as_ref().and_then(|c| c.get("expected")).unwrap();
        assert!(expected.as_str().unwrap().contains("lambda"));
    }

    #[test]
    fn test_unknown_step_type() {
        let mut raw = program(text(json!("x")));
        raw["actions"] = json!([{ "name": "a", "steps": [{ "do": "teleport" }] }]);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("/actions/0/steps/0/do"));
    }

    #[test]
    fn test_initial_value_must_match_state_type() {
        let raw = json!({
            "version": "1.0",
            "state": { "count": { "type": "number", "initial": "zero" } },
            "actions": [],
            "view": text(json!("x"))
        });
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("/state/count/initial"));
    }

    #[test]
    fn test_negative_transition_duration() {
        let raw = program(json!({
            "kind": "if",
            "condition": { "expr": "lit", "value": true },
            "then": text(json!("x")),
            "transition": {
                "enter": "a", "enterActive": "b", "exit": "c", "exitActive": "d",
                "duration": -5
            }
        }));
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("/view/transition/duration"));
    }

    #[test]
    fn test_only_the_first_error_is_reported() {
        let raw = json!({
            "version": "1.0",
            "state": { "count": { "type": "bogus", "initial": 0 } },
            "actions": "not-an-array",
            "view": { "kind": "nope" }
        });
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("/state/count/type"));
    }

    #[test]
    fn test_json_pointer_escapes_keys() {
        let raw = json!({
            "version": "1.0",
            "state": { "a/b~c": { "type": "number", "initial": "x" } },
            "actions": [],
            "view": text(json!("x"))
        });
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("/state/a~1b~0c/initial"));
    }

    #[test]
    fn test_depth_limit_is_enforced_without_overflow() {
        let mut view = text(json!("leaf"));
        for _ in 0..10 {
            view = json!({ "kind": "element", "tag": "div", "children": [view] });
        }
        let options = CompileOptions::default().with_max_depth(5);
        let err = validate_with_options(&program(view), &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxNestingExceeded);
        assert_eq!(
            err.path.as_deref(),
            Some("/view/children/0/children/0/children/0/children/0/children/0")
        );
    }

    #[test]
    fn test_deep_expression_chain_is_rejected_at_default_limit() {
        let mut expr = json!({ "expr": "lit", "value": true });
        for _ in 0..500 {
            expr = json!({ "expr": "not", "operand": expr });
        }
        let err = validate(&program(json!({ "kind": "text", "value": expr }))).unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxNestingExceeded);
    }

    #[test]
    fn test_layout_marker_must_be_layout() {
        let raw = json!({ "version": "1.0", "type": "page", "view": { "kind": "slot" } });
        let err = validate_layout_with_options(&raw, &CompileOptions::default()).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("/type"));
    }

    #[test]
    fn test_layout_state_and_actions_are_optional() {
        let raw = json!({ "version": "1.0", "view": { "kind": "slot" } });
        let layout = validate_layout_with_options(&raw, &CompileOptions::default()).unwrap();
        assert!(layout.state.is_empty());
        assert!(layout.actions.is_empty());
    }
}
