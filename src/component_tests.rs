//! Prop binding and `param` substitution.
#[cfg(test)]
mod tests {
    use crate::ast::{ActionStep, ComponentNode, Expression};
    use crate::component::*;
    use serde_json::{json, Value};

    fn expr(value: Value) -> Expression {
        serde_json::from_value(value).unwrap()
    }

    fn env(pairs: &[(&str, Value)]) -> PropEnv {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), expr(value.clone())))
            .collect()
    }

    #[test]
    fn test_resolve_param_variants() {
        let env = env(&[("user", json!({ "expr": "state", "name": "me" }))]);

        assert_eq!(
            resolve_param("user", None, &env),
            expr(json!({ "expr": "state", "name": "me" }))
        );
        assert_eq!(
            resolve_param("user", Some("email"), &env),
            expr(json!({
                "expr": "get",
                "base": { "expr": "state", "name": "me" },
                "path": "email"
            }))
        );
        assert_eq!(resolve_param("missing", None, &env), Expression::lit(Value::Null));
    }

    #[test]
    fn test_substitution_reaches_nested_expressions() {
        let env = env(&[("n", json!({ "expr": "lit", "value": 2 }))]);
        let mut e = expr(json!({
            "expr": "call",
            "target": { "expr": "state", "name": "items" },
            "method": "map",
            "args": [{
                "expr": "lambda", "param": "x",
                "body": {
                    "expr": "bin", "op": "*",
                    "left": { "expr": "var", "name": "x" },
                    "right": { "expr": "param", "name": "n" }
                }
            }]
        }));
        substitute_expression(&mut e, &env);

        assert_eq!(
            serde_json::to_value(&e).unwrap()["args"][0]["body"]["right"],
            json!({ "expr": "lit", "value": 2 })
        );
    }

    #[test]
    fn test_substituted_value_is_not_rescanned() {
        // A bound expression that itself mentions a param of the same name
        // belongs to the caller and must stay as written.
        let env = env(&[("a", json!({ "expr": "param", "name": "a" }))]);
        let mut e = expr(json!({ "expr": "param", "name": "a" }));
        substitute_expression(&mut e, &env);
        assert_eq!(e, expr(json!({ "expr": "param", "name": "a" })));
    }

    #[test]
    fn test_bind_props_resolves_caller_params_first() {
        let caller = env(&[("title", json!({ "expr": "lit", "value": "Docs" }))]);
        let node: ComponentNode = serde_json::from_value(json!({
            "name": "Heading",
            "props": {
                "text": {
                    "expr": "concat",
                    "items": [{ "expr": "param", "name": "title" }, { "expr": "lit", "value": "!" }]
                }
            }
        }))
        .unwrap();

        let bound = bind_props(&node, Some(&caller));
        assert_eq!(
            bound["text"],
            expr(json!({
                "expr": "concat",
                "items": [{ "expr": "lit", "value": "Docs" }, { "expr": "lit", "value": "!" }]
            }))
        );

        let unbound = bind_props(&node, None);
        assert_eq!(unbound["text"], node.props["text"]);
    }

    #[test]
    fn test_substitute_steps_walks_nested_step_lists() {
        let env = env(&[("url", json!({ "expr": "lit", "value": "/api" }))]);
        let mut steps: Vec<ActionStep> = serde_json::from_value(json!([
            {
                "do": "if",
                "condition": { "expr": "lit", "value": true },
                "then": [{ "do": "fetch", "url": { "expr": "param", "name": "url" } }]
            }
        ]))
        .unwrap();
        substitute_steps(&mut steps, &env);

        assert_eq!(
            serde_json::to_value(&steps).unwrap()[0]["then"][0]["url"],
            json!({ "expr": "lit", "value": "/api" })
        );
    }
}
