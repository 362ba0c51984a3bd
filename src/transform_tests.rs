//! Lowering: component inlining, slot filling, action indexing.

#[cfg(test)]
mod tests {
    use crate::analyze::analyze;
    use crate::compile::compile;
    use crate::error::InternalError;
    use crate::ir::{CompiledNode, CompiledProgram};
    use crate::transform::transform;
    use crate::validate::validate;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn compiled(raw: Value) -> CompiledProgram {
        compile(&raw).unwrap_or_else(|e| panic!("fixture should compile: {:?}", e))
    }

    fn view_json(program: &CompiledProgram) -> Value {
        serde_json::to_value(&program.view).unwrap()
    }

    fn with_components(view: Value, components: Value) -> Value {
        json!({
            "version": "1.0",
            "state": {},
            "actions": [],
            "view": view,
            "components": components
        })
    }

    fn count_local_state(node: &CompiledNode) -> usize {
        let own = usize::from(matches!(node, CompiledNode::LocalState(_)));
        own + node.children().into_iter().map(count_local_state).sum::<usize>()
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Component inlining
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_stateless_component_inlines_without_wrapper() {
        let program = compiled(with_components(
            json!({ "kind": "component", "name": "Title", "props": {
                "text": { "expr": "lit", "value": "Hello" }
            }}),
            json!({
                "Title": {
                    "params": { "text": { "type": "string" } },
                    "view": { "kind": "element", "tag": "h1", "children": [
                        { "kind": "text", "value": { "expr": "param", "name": "text" } }
                    ]}
                }
            }),
        ));

        assert_eq!(
            view_json(&program),
            json!({ "kind": "element", "tag": "h1", "children": [
                { "kind": "text", "value": { "expr": "lit", "value": "Hello" } }
            ]})
        );
        assert_eq!(count_local_state(&program.view), 0);
    }

    #[test]
    fn test_each_stateful_instance_gets_its_own_wrapper() {
        let program = compiled(with_components(
            json!({ "kind": "element", "tag": "div", "children": [
                { "kind": "component", "name": "Counter" },
                { "kind": "component", "name": "Counter" },
                { "kind": "component", "name": "Counter" }
            ]}),
            json!({
                "Counter": {
                    "localState": { "n": { "type": "number", "initial": 0 } },
                    "localActions": [{ "name": "inc", "steps": [
                        { "do": "update", "target": "n", "operation": "increment" }
                    ]}],
                    "view": { "kind": "text", "value": { "expr": "state", "name": "n" } }
                }
            }),
        ));

        let CompiledNode::Element(div) = &program.view else {
            panic!("expected element root");
        };
        assert_eq!(div.children.len(), 3);
        for child in &div.children {
            let CompiledNode::LocalState(local) = child else {
                panic!("expected localState wrapper, got {:?}", child);
            };
            assert_eq!(local.state.keys().collect::<Vec<_>>(), vec!["n"]);
            assert!(local.actions.contains_key("inc"));
        }
        assert_eq!(div.children[0], div.children[1]);
        assert_eq!(count_local_state(&program.view), 3);
    }

    #[test]
    fn test_param_path_reads_into_bound_expression() {
        let program = compiled(with_components(
            json!({ "kind": "component", "name": "Name", "props": {
                "user": { "expr": "lit", "value": { "first": "Ada" } }
            }}),
            json!({
                "Name": {
                    "params": { "user": { "type": "json" } },
                    "view": { "kind": "text", "value": { "expr": "param", "name": "user", "path": "first" } }
                }
            }),
        ));
        assert_eq!(
            view_json(&program),
            json!({ "kind": "text", "value": {
                "expr": "get",
                "base": { "expr": "lit", "value": { "first": "Ada" } },
                "path": "first"
            }})
        );
    }

    #[test]
    fn test_missing_optional_param_is_null() {
        let program = compiled(with_components(
            json!({ "kind": "component", "name": "Badge" }),
            json!({
                "Badge": {
                    "params": { "label": { "type": "string", "required": false } },
                    "view": { "kind": "text", "value": { "expr": "param", "name": "label" } }
                }
            }),
        ));
        assert_eq!(
            view_json(&program),
            json!({ "kind": "text", "value": { "expr": "lit", "value": null } })
        );
    }

    #[test]
    fn test_params_thread_through_nested_components() {
        let program = compiled(with_components(
            json!({ "kind": "component", "name": "Outer", "props": {
                "label": { "expr": "lit", "value": "deep" }
            }}),
            json!({
                "Outer": {
                    "params": { "label": { "type": "string" } },
                    "view": { "kind": "component", "name": "Inner", "props": {
                        "text": {
                            "expr": "concat",
                            "items": [
                                { "expr": "lit", "value": "> " },
                                { "expr": "param", "name": "label" }
                            ]
                        }
                    }}
                },
                "Inner": {
                    "params": { "text": { "type": "string" } },
                    "view": { "kind": "text", "value": { "expr": "param", "name": "text" } }
                }
            }),
        ));
        assert_eq!(
            view_json(&program),
            json!({ "kind": "text", "value": { "expr": "concat", "items": [
                { "expr": "lit", "value": "> " },
                { "expr": "lit", "value": "deep" }
            ]}})
        );
    }

    #[test]
    fn test_handler_payload_and_local_actions_are_substituted() {
        let program = compiled(with_components(
            json!({ "kind": "component", "name": "Stepper", "props": {
                "step": { "expr": "lit", "value": 5 }
            }}),
            json!({
                "Stepper": {
                    "params": { "step": { "type": "number" } },
                    "localState": { "n": { "type": "number", "initial": 0 } },
                    "localActions": [{ "name": "bump", "steps": [
                        { "do": "set", "target": "n", "value": {
                            "expr": "bin", "op": "+",
                            "left": { "expr": "state", "name": "n" },
                            "right": { "expr": "param", "name": "step" }
                        }}
                    ]}],
                    "view": { "kind": "element", "tag": "button", "props": {
                        "onClick": { "event": "click", "action": "bump", "payload": { "expr": "param", "name": "step" } }
                    }}
                }
            }),
        ));

        let CompiledNode::LocalState(local) = &program.view else {
            panic!("expected localState root");
        };
        assert_eq!(
            serde_json::to_value(&local.actions["bump"].steps[0]).unwrap(),
            json!({ "do": "set", "target": "n", "value": {
                "expr": "bin", "op": "+",
                "left": { "expr": "state", "name": "n" },
                "right": { "expr": "lit", "value": 5 }
            }})
        );
        assert_eq!(
            serde_json::to_value(local.child.as_ref()).unwrap(),
            json!({ "kind": "element", "tag": "button", "props": {
                "onClick": { "event": "click", "action": "bump", "payload": { "expr": "lit", "value": 5 } }
            }})
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Slots
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_slot_splices_caller_children_in_place() {
        let program = compiled(with_components(
            json!({ "kind": "component", "name": "Card", "children": [
                { "kind": "text", "value": { "expr": "lit", "value": "a" } },
                { "kind": "text", "value": { "expr": "lit", "value": "b" } }
            ]}),
            json!({
                "Card": { "view": { "kind": "element", "tag": "section", "children": [
                    { "kind": "element", "tag": "header" },
                    { "kind": "slot" },
                    { "kind": "element", "tag": "footer" }
                ]}}
            }),
        ));
        assert_eq!(
            view_json(&program),
            json!({ "kind": "element", "tag": "section", "children": [
                { "kind": "element", "tag": "header" },
                { "kind": "text", "value": { "expr": "lit", "value": "a" } },
                { "kind": "text", "value": { "expr": "lit", "value": "b" } },
                { "kind": "element", "tag": "footer" }
            ]})
        );
    }

    #[test]
    fn test_slot_in_single_node_position_becomes_fragment() {
        let program = compiled(with_components(
            json!({ "kind": "component", "name": "Maybe", "children": [
                { "kind": "text", "value": { "expr": "lit", "value": "a" } },
                { "kind": "text", "value": { "expr": "lit", "value": "b" } }
            ]}),
            json!({
                "Maybe": { "view": {
                    "kind": "if",
                    "condition": { "expr": "lit", "value": true },
                    "then": { "kind": "slot" }
                }}
            }),
        ));
        let CompiledNode::If(node) = &program.view else {
            panic!("expected if root");
        };
        assert_eq!(
            serde_json::to_value(node.then.as_ref()).unwrap(),
            json!({ "kind": "fragment", "children": [
                { "kind": "text", "value": { "expr": "lit", "value": "a" } },
                { "kind": "text", "value": { "expr": "lit", "value": "b" } }
            ]})
        );
    }

    #[test]
    fn test_caller_children_keep_caller_bindings() {
        let program = compiled(with_components(
            json!({ "kind": "component", "name": "Outer", "props": {
                "label": { "expr": "lit", "value": "outer" }
            }}),
            json!({
                "Outer": {
                    "params": { "label": { "type": "string" } },
                    "view": { "kind": "component", "name": "Frame", "props": {
                        "label": { "expr": "lit", "value": "frame" }
                    }, "children": [
                        { "kind": "text", "value": { "expr": "param", "name": "label" } }
                    ]}
                },
                "Frame": {
                    "params": { "label": { "type": "string" } },
                    "view": { "kind": "element", "tag": "div", "children": [
                        { "kind": "text", "value": { "expr": "param", "name": "label" } },
                        { "kind": "slot" }
                    ]}
                }
            }),
        ));
        assert_eq!(
            view_json(&program),
            json!({ "kind": "element", "tag": "div", "children": [
                { "kind": "text", "value": { "expr": "lit", "value": "frame" } },
                { "kind": "text", "value": { "expr": "lit", "value": "outer" } }
            ]})
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Variable capture
    // ═══════════════════════════════════════════════════════════════════════════════

    fn users_page(body: Value, components: Value) -> Value {
        json!({
            "version": "1.0",
            "state": { "users": { "type": "list", "initial": [] } },
            "actions": [],
            "view": {
                "kind": "each",
                "items": { "expr": "state", "name": "users" },
                "as": "item",
                "body": body
            },
            "components": components
        })
    }

    #[test]
    fn test_body_binder_does_not_capture_prop_variable() {
        let program = compiled(users_page(
            json!({ "kind": "component", "name": "Card", "props": {
                "title": { "expr": "var", "name": "item", "path": "name" }
            }}),
            json!({
                "Card": {
                    "params": { "title": { "type": "string" } },
                    "view": {
                        "kind": "each",
                        "items": { "expr": "lit", "value": [1, 2] },
                        "as": "item",
                        "body": { "kind": "element", "tag": "span", "children": [
                            { "kind": "text", "value": { "expr": "param", "name": "title" } },
                            { "kind": "text", "value": { "expr": "var", "name": "item" } }
                        ]}
                    }
                }
            }),
        ));

        let view = view_json(&program);
        let inner = &view["body"];
        assert_eq!(view["as"], json!("item"));
        assert_eq!(inner["as"], json!("item$1"));
        assert_eq!(
            inner["body"]["children"],
            json!([
                { "kind": "text", "value": { "expr": "var", "name": "item", "path": "name" } },
                { "kind": "text", "value": { "expr": "var", "name": "item$1" } }
            ])
        );
    }

    #[test]
    fn test_body_binder_does_not_capture_slot_content() {
        let program = compiled(users_page(
            json!({ "kind": "component", "name": "Repeat", "children": [
                { "kind": "text", "value": { "expr": "var", "name": "item" } }
            ]}),
            json!({
                "Repeat": {
                    "view": {
                        "kind": "each",
                        "items": { "expr": "lit", "value": [1, 2] },
                        "as": "item",
                        "body": { "kind": "slot" }
                    }
                }
            }),
        ));

        let inner = &view_json(&program)["body"];
        assert_eq!(inner["as"], json!("item$1"));
        assert_eq!(
            inner["body"],
            json!({ "kind": "text", "value": { "expr": "var", "name": "item" } })
        );
    }

    #[test]
    fn test_lambda_binder_is_renamed_and_unrelated_binders_are_kept() {
        let program = compiled(users_page(
            json!({ "kind": "component", "name": "Tags", "props": {
                "prefix": { "expr": "var", "name": "item", "path": "id" }
            }}),
            json!({
                "Tags": {
                    "params": { "prefix": { "type": "string" } },
                    "view": {
                        "kind": "each",
                        "items": { "expr": "lit", "value": ["a"] },
                        "as": "tag",
                        "body": { "kind": "text", "value": {
                            "expr": "call",
                            "target": { "expr": "lit", "value": ["x"] },
                            "method": "map",
                            "args": [{
                                "expr": "lambda", "param": "item",
                                "body": {
                                    "expr": "concat",
                                    "items": [
                                        { "expr": "param", "name": "prefix" },
                                        { "expr": "var", "name": "item" },
                                        { "expr": "var", "name": "tag" }
                                    ]
                                }
                            }]
                        }}
                    }
                }
            }),
        ));

        let inner = &view_json(&program)["body"];
        assert_eq!(inner["as"], json!("tag"));
        let lambda = &inner["body"]["value"]["args"][0];
        assert_eq!(lambda["param"], json!("item$1"));
        assert_eq!(
            lambda["body"]["items"],
            json!([
                { "expr": "var", "name": "item", "path": "id" },
                { "expr": "var", "name": "item$1" },
                { "expr": "var", "name": "tag" }
            ])
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // Program sections
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_actions_are_indexed_by_name_in_order() {
        let program = compiled(json!({
            "version": "1.0",
            "state": { "count": { "type": "number", "initial": 0 } },
            "actions": [
                { "name": "reset", "steps": [{ "do": "set", "target": "count", "value": { "expr": "lit", "value": 0 } }] },
                { "name": "increment", "steps": [{ "do": "update", "target": "count", "operation": "increment" }] }
            ],
            "view": { "kind": "text", "value": { "expr": "state", "name": "count" } }
        }));
        assert_eq!(program.actions.keys().collect::<Vec<_>>(), vec!["reset", "increment"]);
        assert_eq!(program.actions["increment"].name, "increment");
        assert_eq!(program.actions["reset"].steps.len(), 1);
    }

    #[test]
    fn test_transition_duration_defaults_to_300() {
        let transition = json!({ "enter": "fade-in", "enterActive": "a", "exit": "fade-out", "exitActive": "b" });
        let program = compiled(json!({
            "version": "1.0",
            "state": { "open": { "type": "boolean", "initial": false } },
            "actions": [],
            "view": { "kind": "element", "tag": "div", "children": [
                {
                    "kind": "if",
                    "condition": { "expr": "state", "name": "open" },
                    "then": { "kind": "text", "value": { "expr": "lit", "value": "a" } },
                    "transition": transition
                },
                {
                    "kind": "if",
                    "condition": { "expr": "state", "name": "open" },
                    "then": { "kind": "text", "value": { "expr": "lit", "value": "b" } },
                    "transition": {
                        "enter": "x", "enterActive": "x", "exit": "x", "exitActive": "x",
                        "duration": 120
                    }
                },
                {
                    "kind": "if",
                    "condition": { "expr": "state", "name": "open" },
                    "then": { "kind": "text", "value": { "expr": "lit", "value": "c" } }
                }
            ]}
        }));

        let CompiledNode::Element(div) = &program.view else {
            panic!("expected element root");
        };
        let durations: Vec<Option<u64>> = div
            .children
            .iter()
            .map(|child| match child {
                CompiledNode::If(node) => node
                    .transition
                    .as_ref()
                    .and_then(|t| t.duration.as_ref())
                    .and_then(|d| d.as_u64()),
                other => panic!("expected if, got {:?}", other),
            })
            .collect();
        assert_eq!(durations, vec![Some(300), Some(120), None]);
    }

    #[test]
    fn test_route_params_are_listed() {
        let program = compiled(json!({
            "version": "1.0",
            "route": { "path": "/users/:id/posts/:postId", "title": { "expr": "route", "name": "id" } },
            "state": {},
            "actions": [],
            "view": { "kind": "text", "value": { "expr": "route", "name": "postId" } }
        }));
        let route = program.route.unwrap();
        assert_eq!(route.params, vec!["id", "postId"]);
        assert!(route.title.is_some());
    }

    #[test]
    fn test_island_actions_are_indexed() {
        let program = compiled(json!({
            "version": "1.0",
            "state": {},
            "actions": [],
            "view": {
                "kind": "island",
                "id": "cart",
                "strategy": "visible",
                "state": { "items": { "type": "list", "initial": [] } },
                "actions": [{ "name": "clear", "steps": [
                    { "do": "set", "target": "items", "value": { "expr": "lit", "value": [] } }
                ]}],
                "content": { "kind": "text", "value": { "expr": "state", "name": "items" } }
            }
        }));
        let CompiledNode::Island(island) = &program.view else {
            panic!("expected island root");
        };
        assert_eq!(island.id, "cart");
        assert!(island.actions.contains_key("clear"));
        assert!(island.state.contains_key("items"));
    }

    #[test]
    fn test_unregistered_component_is_an_internal_fault() {
        let plain = validate(&json!({
            "version": "1.0",
            "state": {},
            "actions": [],
            "view": { "kind": "element", "tag": "div" }
        }))
        .unwrap();
        let ctx = analyze(&plain).unwrap();

        let with_component = validate(&with_components(
            json!({ "kind": "component", "name": "Ghost" }),
            json!({ "Ghost": { "view": { "kind": "element", "tag": "span" } } }),
        ))
        .unwrap();

        assert_eq!(
            transform(&with_component, &ctx).unwrap_err(),
            InternalError::UnregisteredComponent {
                name: "Ghost".to_string()
            }
        );
    }
}
