//! Placeholder substitution.
//!
//! `{{ key arg1 arg2 }}` is replaced by the value at `key`. The value and the
//! trailing arguments are handed to the `render_placeholder_<key>` filter as a
//! sequence, so a hook can format the value:
//!
//! ```text
//! {{ price currency EUR }}  ->  filter("render_placeholder_price", [12.5, "currency", "EUR"])
//! ```
//!
//! A filter that returns a sequence contributes its first element; any other
//! result is used as is.

use std::collections::HashMap;

use serde_json::Value;
use sleepy_hooks::Hooks;

use super::scanner::{lex, TagKind};
use crate::context::{format_value, normalize_key, Context};

/// Replaces every placeholder tag in `source` in one left-to-right walk.
///
/// Directive markers are not placeholders and are left untouched, as is
/// `{{ }}`. Values inserted here are not scanned again by this call, but text
/// rendered inside a block is scanned again by the enclosing pass.
pub(crate) fn substitute(hooks: &dyn Hooks, source: &str, ctx: &Context) -> String {
    let tags = lex(source);
    if tags.is_empty() {
        return source.to_string();
    }

    let mut cache: HashMap<&str, String> = HashMap::new();
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for tag in tags {
        if tag.kind != TagKind::Placeholder {
            continue;
        }
        out.push_str(&source[cursor..tag.start]);
        let text = cache
            .entry(tag.text)
            .or_insert_with(|| render_one(hooks, tag.body, ctx));
        out.push_str(text);
        cursor = tag.end;
    }

    out.push_str(&source[cursor..]);
    out
}

fn render_one(hooks: &dyn Hooks, body: &str, ctx: &Context) -> String {
    let mut parts = body.split_whitespace();
    let key = normalize_key(parts.next().unwrap_or_default());

    let mut args = Vec::with_capacity(1);
    args.push(ctx.resolve(&key).cloned().unwrap_or(Value::Null));
    args.extend(parts.map(|arg| Value::String(arg.to_string())));

    let filtered = hooks.apply_filter(&format!("render_placeholder_{}", key), Value::Array(args));
    let value = match filtered {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        Value::Array(_) => Value::Null,
        other => other,
    };

    tracing::trace!(%key, "placeholder: resolved");
    format_value(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sleepy_hooks::{HookRegistry, NoHooks};

    fn ctx(value: Value) -> Context {
        match value {
            Value::Object(map) => Context::from_map(map),
            _ => panic!("test context must be an object"),
        }
    }

    fn sub(source: &str, data: Value) -> String {
        substitute(&NoHooks, source, &ctx(data))
    }

    #[test]
    fn test_simple_substitution() {
        assert_eq!(sub("Hello, {{ name }}!", json!({"name": "World"})), "Hello, World!");
    }

    #[test]
    fn test_case_insensitive_key() {
        assert_eq!(sub("{{ NAME }}/{{Name}}", json!({"Name": "x"})), "x/x");
    }

    #[test]
    fn test_dotted_path() {
        let data = json!({"a": {"b": {"c": 42}}});
        assert_eq!(sub("{{ a.b.c }}", data), "42");
        assert_eq!(sub("[{{ a.b.c }}]", json!({"a": {"b": {}}})), "[]");
    }

    #[test]
    fn test_missing_and_container_values_render_empty() {
        let data = json!({"list": [1, 2], "map": {"k": 1}, "nothing": null});
        assert_eq!(sub("<{{missing}}{{list}}{{map}}{{nothing}}>", data), "<>");
    }

    #[test]
    fn test_scalar_formatting() {
        let data = json!({"t": true, "f": false, "n": 3, "x": 1.5});
        assert_eq!(sub("{{t}} {{f}} {{n}} {{x}}", data), "true false 3 1.5");
    }

    #[test]
    fn test_repeated_tokens() {
        assert_eq!(sub("{{a}}-{{ a }}-{{a}}", json!({"a": "z"})), "z-z-z");
    }

    #[test]
    fn test_directive_markers_stay_literal() {
        let src = "{{#each u in users}} {{/if}} {{ }} {{#unknown}}";
        assert_eq!(sub(src, json!({})), src);
    }

    #[test]
    fn test_filter_receives_value_and_args() {
        let hooks = HookRegistry::new().on_filter("render_placeholder_price", |v| {
            let args = v.as_array().cloned().unwrap_or_default();
            let amount = args[0].as_f64().unwrap_or_default();
            let symbol = args.get(2).and_then(Value::as_str).unwrap_or("?");
            json!([format!("{:.2} {}", amount, symbol)])
        });
        let out = substitute(&hooks, "{{ Price currency EUR }}", &ctx(json!({"price": 12.5})));
        assert_eq!(out, "12.50 EUR");
    }

    #[test]
    fn test_filter_may_return_plain_value() {
        let hooks = HookRegistry::new().on_filter("render_placeholder_name", |_| json!("hooked"));
        let out = substitute(&hooks, "{{ name }}", &ctx(json!({"name": "plain"})));
        assert_eq!(out, "hooked");
    }

    #[test]
    fn test_filter_sees_null_for_missing_key() {
        let hooks = HookRegistry::new().on_filter("render_placeholder_ghost", |v| {
            json!([v[0].is_null().to_string()])
        });
        assert_eq!(substitute(&hooks, "{{ghost}}", &Context::new()), "true");
    }

    #[test]
    fn test_single_substitution_does_not_rescan_its_output() {
        let out = sub("{{a}}", json!({"a": "{{b}}", "b": "no"}));
        assert_eq!(out, "{{b}}");
    }
}
