//! `#each` block expansion.
//!
//! ```text
//! {{ #each u in users }}
//!   <li class="{{ zebra }}">{{ iterator }}. {{ name }} ({{ u.email }})</li>
//! {{ /each }}
//! ```
//!
//! When `users` is a sequence whose first element is a mapping, the inner
//! template renders once per element against a context made of the element's
//! own fields plus:
//!
//! - `iterator`: the 1-based position
//! - `zebra`: `"odd"` or `"even"`, starting with `"odd"`
//! - `<item>` (here `u`): the element itself, additions included
//!
//! Anything else under the path (missing, scalar, empty, a list of scalars)
//! renders the inner template exactly once against the outer context.

use serde_json::{json, Value};

use super::pipeline::Pass;
use super::scanner::{find_blocks, Block, BlockKind};
use crate::context::{normalize_key, Context};
use crate::error::Result;

/// Parsed `#each <item> in <path>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EachHeader {
    pub item: String,
    pub path: String,
}

impl EachHeader {
    pub fn parse(header: &str) -> Option<Self> {
        let mut tokens = header.split_whitespace();
        let item = tokens.next()?;
        let keyword = tokens.next()?;
        let path = tokens.next()?;

        let is_word = item.chars().all(|c| c.is_alphanumeric() || c == '_');
        if tokens.next().is_some() || !is_word || !keyword.eq_ignore_ascii_case("in") {
            return None;
        }

        Some(Self {
            item: normalize_key(item),
            path: normalize_key(path),
        })
    }
}

/// Returns `"odd"` or `"even"` for a 1-based position.
pub fn zebra(position: usize) -> &'static str {
    if position % 2 == 1 {
        "odd"
    } else {
        "even"
    }
}

/// Expands every top-level `#each` block in `source`.
pub(crate) fn expand_each(pass: &Pass<'_>, source: &str, ctx: &Context) -> Result<String> {
    let scan = find_blocks(source, BlockKind::Each);
    pass.check_unmatched(&scan)?;
    if scan.blocks.is_empty() {
        return Ok(source.to_string());
    }

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for block in &scan.blocks {
        out.push_str(&source[cursor..block.start]);
        match EachHeader::parse(block.header) {
            Some(header) => out.push_str(&expand_block(pass, &header, block, ctx)?),
            None => {
                pass.malformed(format!("cannot parse `#each {}`", block.header))?;
                out.push_str(block.text);
            }
        }
        cursor = block.end;
    }

    out.push_str(&source[cursor..]);
    Ok(out)
}

fn expand_block(
    pass: &Pass<'_>,
    header: &EachHeader,
    block: &Block<'_>,
    ctx: &Context,
) -> Result<String> {
    let items = match ctx.resolve(&header.path) {
        Some(Value::Array(items)) if items.first().is_some_and(Value::is_object) => items.clone(),
        _ => {
            tracing::debug!(item = %header.item, path = %header.path, "each: no sequence of mappings, rendering once");
            return pass.render(block.inner, ctx);
        }
    };

    let items = match pass
        .hooks
        .apply_filter("template_each_array", Value::Array(items))
    {
        Value::Array(items) => items,
        _ => return pass.render(block.inner, ctx),
    };

    tracing::debug!(item = %header.item, path = %header.path, count = items.len(), "each: expanding");

    let item_hook = format!("template_each_{}", header.item);
    let mut out = String::new();

    for (index, element) in items.into_iter().enumerate() {
        let element = pass.hooks.apply_filter("template_each", element);
        let element = pass.hooks.apply_filter(&item_hook, element);
        let iteration = iteration_context(&header.item, index + 1, element);
        out.push_str(&pass.render(block.inner, &iteration)?);
    }

    Ok(out)
}

/// Builds the context for one iteration.
pub(crate) fn iteration_context(item: &str, position: usize, element: Value) -> Context {
    let (mut iteration, scalar) = match element {
        Value::Object(map) => (Context::from_map(map), None),
        other => (Context::new(), Some(other)),
    };

    iteration.insert("iterator", json!(position));
    iteration.insert("zebra", json!(zebra(position)));

    let bound = match scalar {
        Some(value) => value,
        None => iteration.clone().into_value(),
    };
    iteration.insert(item, bound);
    iteration
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleepy_hooks::{HookRegistry, NoHooks};

    fn ctx(value: Value) -> Context {
        match value {
            Value::Object(map) => Context::from_map(map),
            _ => panic!("test context must be an object"),
        }
    }

    fn expand(source: &str, data: Value) -> String {
        let hooks = NoHooks;
        let pass = Pass::new(&hooks, false);
        expand_each(&pass, source, &ctx(data)).unwrap()
    }

    #[test]
    fn test_header_parse() {
        assert_eq!(
            EachHeader::parse("U in Site.Users"),
            Some(EachHeader {
                item: "u".into(),
                path: "site.users".into()
            })
        );
        assert_eq!(EachHeader::parse("u IN users").unwrap().path, "users");
        assert_eq!(EachHeader::parse("u of users"), None);
        assert_eq!(EachHeader::parse("u in"), None);
        assert_eq!(EachHeader::parse("u in users extra"), None);
        assert_eq!(EachHeader::parse("u.x in users"), None);
    }

    #[test]
    fn test_zebra() {
        assert_eq!(zebra(1), "odd");
        assert_eq!(zebra(2), "even");
        assert_eq!(zebra(3), "odd");
    }

    #[test]
    fn test_iterates_sequence_of_mappings() {
        let out = expand(
            "{{#each u in users}}[{{iterator}}:{{zebra}}:{{name}}:{{u.name}}]{{/each}}",
            json!({"users": [{"name": "Ann"}, {"name": "Bo"}, {"name": "Cy"}]}),
        );
        assert_eq!(out, "[1:odd:Ann:Ann][2:even:Bo:Bo][3:odd:Cy:Cy]");
    }

    #[test]
    fn test_item_binding_includes_additions() {
        let out = expand(
            "{{#each u in users}}{{u.iterator}}{{u.zebra}} {{/each}}",
            json!({"users": [{"name": "Ann"}, {"name": "Bo"}]}),
        );
        assert_eq!(out, "1odd 2even ");
    }

    #[test]
    fn test_empty_sequence_renders_once_against_outer() {
        let out = expand(
            "{{#each u in users}}({{title}}{{iterator}}){{/each}}",
            json!({"users": [], "title": "T"}),
        );
        assert_eq!(out, "(T)");
    }

    #[test]
    fn test_missing_path_renders_once() {
        let out = expand("a{{#each u in nope}}-{{title}}-{{/each}}b", json!({"title": "x"}));
        assert_eq!(out, "a-x-b");
    }

    #[test]
    fn test_scalar_list_renders_once() {
        let out = expand("{{#each n in nums}}<{{iterator}}>{{/each}}", json!({"nums": [1, 2]}));
        assert_eq!(out, "<>");
    }

    #[test]
    fn test_nested_each() {
        let out = expand(
            "{{#each g in groups}}{{name}}:{{#each m in members}}{{m.name}}{{iterator}} {{/each}}|{{/each}}",
            json!({"groups": [
                {"name": "A", "members": [{"name": "x"}, {"name": "y"}]},
                {"name": "B", "members": [{"name": "z"}]}
            ]}),
        );
        assert_eq!(out, "A:x1 y2 |B:z1 |");
    }

    #[test]
    fn test_siblings_do_not_leak() {
        let out = expand(
            "{{#each a in xs}}{{v}}{{/each}}/{{#each b in ys}}{{v}}{{a.v}}{{/each}}",
            json!({"xs": [{"v": 1}, {"v": 2}], "ys": [{"v": 9}]}),
        );
        assert_eq!(out, "12/9");
    }

    #[test]
    fn test_malformed_header_left_literal() {
        let out = expand("{{#each users}}x{{/each}}", json!({}));
        assert_eq!(out, "{{#each users}}x{{/each}}");
    }

    #[test]
    fn test_malformed_header_strict() {
        let hooks = NoHooks;
        let pass = Pass::new(&hooks, true);
        let err = expand_each(&pass, "{{#each users}}x{{/each}}", &Context::new()).unwrap_err();
        assert!(err.to_string().contains("#each users"));
    }

    #[test]
    fn test_hooks_transform_elements() {
        let hooks = HookRegistry::new()
            .on_filter("template_each_array", |v| match v {
                Value::Array(mut items) => {
                    items.reverse();
                    Value::Array(items)
                }
                other => other,
            })
            .on_filter("template_each_u", |mut v| {
                if let Some(map) = v.as_object_mut() {
                    map.insert("flag".into(), json!("!"));
                }
                v
            });
        let pass = Pass::new(&hooks, false);
        let out = expand_each(
            &pass,
            "{{#each u in users}}{{name}}{{flag}}{{iterator}}{{/each}}",
            &ctx(json!({"users": [{"name": "a"}, {"name": "b"}]})),
        )
        .unwrap();
        assert_eq!(out, "b!1a!2");
    }

    #[test]
    fn test_scalar_elements_after_first() {
        let iteration = iteration_context("u", 2, json!("plain"));
        assert_eq!(iteration.get("u"), Some(&json!("plain")));
        assert_eq!(iteration.get("iterator"), Some(&json!(2)));
        assert_eq!(iteration.get("zebra"), Some(&json!("even")));
    }
}
