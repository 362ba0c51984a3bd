//! End-to-end behaviour of `compile` and its JSON envelope.

#[cfg(test)]
mod tests {
    use crate::compile::{compile, compile_str, CompileOutput};
    use crate::error::{CompileError, ErrorCode, InternalError};
    use crate::ir::CompiledNode;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn counter() -> Value {
        json!({
            "version": "1.0",
            "route": { "path": "/counter/:id" },
            "state": {
                "count": { "type": "number", "initial": 0 },
                "history": { "type": "list", "initial": [] }
            },
            "actions": [
                { "name": "increment", "steps": [
                    { "do": "update", "target": "count", "operation": "increment" },
                    { "do": "update", "target": "history", "operation": "push",
                      "value": { "expr": "state", "name": "count" } }
                ]}
            ],
            "view": { "kind": "element", "tag": "div", "children": [
                { "kind": "component", "name": "Label", "props": {
                    "text": { "expr": "route", "name": "id" }
                }},
                { "kind": "element", "tag": "button", "props": {
                    "onClick": { "event": "click", "action": "increment" }
                }, "children": [
                    { "kind": "text", "value": { "expr": "state", "name": "count" } }
                ]}
            ]},
            "components": {
                "Label": {
                    "params": { "text": { "type": "string" } },
                    "view": { "kind": "element", "tag": "span", "children": [
                        { "kind": "text", "value": { "expr": "param", "name": "text" } }
                    ]}
                }
            }
        })
    }

    fn codes(err: &CompileError) -> Vec<ErrorCode> {
        err.diagnostics().iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_compiling_twice_is_identical() {
        let first = compile(&counter()).unwrap();
        let second = compile(&counter()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_schema_errors_short_circuit_analysis() {
        let raw = json!({
            "version": "1.0",
            "state": {},
            "actions": [],
            "view": { "kind": "element", "tag": "div", "children": [
                { "kind": "text", "value": { "expr": "state", "name": "missing" } },
                { "kind": "text" }
            ]}
        });
        let err = compile(&raw).unwrap_err();
        assert_eq!(codes(&err), vec![ErrorCode::SchemaInvalid]);
        assert_eq!(err.diagnostics()[0].path.as_deref(), Some("/view/children/1/value"));
    }

    #[test]
    fn test_semantic_errors_accumulate() {
        let raw = json!({
            "version": "1.0",
            "state": {},
            "actions": [],
            "view": { "kind": "element", "tag": "p", "children": [
                { "kind": "text", "value": { "expr": "state", "name": "a" } },
                { "kind": "text", "value": { "expr": "state", "name": "b" } },
                { "kind": "text", "value": { "expr": "state", "name": "c" } }
            ]}
        });
        let err = compile(&raw).unwrap_err();
        assert_eq!(codes(&err), vec![ErrorCode::UndefinedState; 3]);
    }

    #[test]
    fn test_route_scoping_through_envelope() {
        let mut raw = counter();
        raw["view"]["children"][0]["props"]["text"] = json!({ "expr": "route", "name": "name" });

        let output = CompileOutput::from_result(compile(&raw)).unwrap();
        assert!(!output.ok);
        let errors = output.errors.unwrap();
        assert_eq!(errors[0].code, ErrorCode::UndefinedRouteParam);
    }

    #[test]
    fn test_duplicate_action_through_compile() {
        let mut raw = counter();
        raw["actions"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "name": "increment", "steps": [] }));
        let err = compile(&raw).unwrap_err();
        assert!(codes(&err).contains(&ErrorCode::DuplicateAction));
    }

    #[test]
    fn test_cycle_through_compile() {
        let raw = json!({
            "version": "1.0",
            "state": {},
            "actions": [],
            "view": { "kind": "component", "name": "A" },
            "components": {
                "A": { "view": { "kind": "component", "name": "B" } },
                "B": { "view": { "kind": "component", "name": "A" } }
            }
        });
        let err = compile(&raw).unwrap_err();
        assert_eq!(codes(&err), vec![ErrorCode::ComponentCycle]);
    }

    #[test]
    fn test_operation_mismatch_through_compile() {
        let raw = json!({
            "version": "1.0",
            "state": { "count": { "type": "number", "initial": 0 } },
            "actions": [{ "name": "add", "steps": [
                { "do": "update", "target": "count", "operation": "push" }
            ]}],
            "view": { "kind": "text", "value": { "expr": "state", "name": "count" } }
        });
        let err = compile(&raw).unwrap_err();
        assert_eq!(err.diagnostics()[0].code, ErrorCode::OperationInvalidForType);
    }

    #[test]
    fn test_compiled_counter_shape() {
        let program = compile(&counter()).unwrap();
        assert_eq!(program.route.as_ref().unwrap().params, vec!["id"]);
        let CompiledNode::Element(div) = &program.view else {
            panic!("expected element root");
        };
        assert_eq!(
            serde_json::to_value(&div.children[0]).unwrap(),
            json!({ "kind": "element", "tag": "span", "children": [
                { "kind": "text", "value": { "expr": "route", "name": "id", "source": "param" } }
            ]})
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // JSON surface
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_invalid_json_text_is_a_schema_error_at_root() {
        let err = compile_str("{\"version\": ").unwrap_err();
        assert_eq!(codes(&err), vec![ErrorCode::SchemaInvalid]);
        assert_eq!(err.diagnostics()[0].path.as_deref(), Some(""));
    }

    #[test]
    fn test_compile_str_matches_compile() {
        let text = serde_json::to_string(&counter()).unwrap();
        assert_eq!(compile_str(&text).unwrap(), compile(&counter()).unwrap());
    }

    #[test]
    fn test_success_envelope() {
        let output = CompileOutput::from_result(compile(&counter())).unwrap();
        let value: Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(value["ok"], json!(true));
        assert_eq!(value["program"]["version"], json!("1.0"));
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_failure_envelope() {
        let output = CompileOutput::from_result(compile(&json!({ "version": "9" }))).unwrap();
        let value: Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "ok": false,
                "errors": [{
                    "code": "UNSUPPORTED_VERSION",
                    "message": "Unsupported version \"9\"; expected \"1.0\"",
                    "path": "/version",
                    "context": { "version": "9" }
                }]
            })
        );
    }

    #[test]
    fn test_internal_faults_bypass_the_envelope() {
        let fault = InternalError::Invariant("broken".to_string());
        let result = CompileOutput::from_result(Err(CompileError::Internal(fault.clone())));
        assert_eq!(result.unwrap_err(), fault);
    }
}
