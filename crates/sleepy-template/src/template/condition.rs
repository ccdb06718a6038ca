//! `#if` block expansion.
//!
//! ```text
//! {{ #if user.role == "admin" }}<a href="/admin">Admin</a>{{ /if }}
//! ```
//!
//! A condition is exactly three tokens: left operand, operator, right operand.
//! Quoted tokens are literals. An unquoted token that names a bound key is
//! replaced by its value; otherwise `true`, `false` and `null` are keywords and
//! anything else is a literal string. There is no `else`.
//!
//! # Operators
//!
//! | Operator | Meaning |
//! |----------|---------|
//! | `==` | loosely equal |
//! | `!=`, `<>` | loosely not equal |
//! | `<`, `>`, `<=`, `>=` | loose ordering |
//! | `===` | same type and value |
//! | `!==` | different type or value |
//!
//! Loose comparison picks one rule per pair of operands:
//!
//! 1. If either side is a boolean, both compare by truthiness.
//! 2. If both sides are numbers or numeric strings, they compare as numbers.
//! 3. Otherwise they compare as strings, with null as the empty string.
//!
//! Mappings and sequences only compare with `===`/`!==`; every loose operator
//! except `!=` is false for them.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::pipeline::Pass;
use super::scanner::{find_blocks, BlockKind};
use crate::context::Context;
use crate::error::Result;

/// Comparison operator of an `#if` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=` or `<>`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `>=`
    Gte,
    /// `===`
    Identical,
    /// `!==`
    NotIdentical,
}

impl Operator {
    /// Parses an operator token.
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "==" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            "<=" => Operator::Lte,
            ">=" => Operator::Gte,
            "===" => Operator::Identical,
            "!==" => Operator::NotIdentical,
            _ => return None,
        })
    }

    /// Evaluates a loose comparison given an ordering result.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Lte => ordering != Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Identical | Operator::NotIdentical => false,
        }
    }

    /// Compares two resolved operands.
    pub fn compare(self, lhs: &Value, rhs: &Value) -> bool {
        match self {
            Operator::Identical => lhs == rhs,
            Operator::NotIdentical => lhs != rhs,
            _ => match loose_ordering(lhs, rhs) {
                Some(ordering) => self.eval_ordering(ordering),
                None => self == Operator::Ne,
            },
        }
    }

    /// Returns the operator as written in templates.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Identical => "===",
            Operator::NotIdentical => "!==",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed `#if` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Condition {
    pub lhs: String,
    pub op: Operator,
    pub rhs: String,
}

impl Condition {
    pub fn parse(header: &str) -> std::result::Result<Self, String> {
        let tokens = split_tokens(header);
        let [lhs, op, rhs] = <[String; 3]>::try_from(tokens).map_err(|tokens| {
            format!(
                "`#if {}` needs 3 tokens (lhs operator rhs), found {}",
                header,
                tokens.len()
            )
        })?;
        let op = Operator::parse(&op)
            .ok_or_else(|| format!("unknown operator `{}` in `#if {}`", op, header))?;
        Ok(Self { lhs, op, rhs })
    }

    pub fn evaluate(&self, ctx: &Context) -> bool {
        let lhs = resolve_operand(&self.lhs, ctx);
        let rhs = resolve_operand(&self.rhs, ctx);
        self.op.compare(&lhs, &rhs)
    }
}

/// Expands every top-level `#if` block in `source`.
pub(crate) fn expand_if(pass: &Pass<'_>, source: &str, ctx: &Context) -> Result<String> {
    let scan = find_blocks(source, BlockKind::If);
    pass.check_unmatched(&scan)?;
    if scan.blocks.is_empty() {
        return Ok(source.to_string());
    }

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for block in &scan.blocks {
        out.push_str(&source[cursor..block.start]);
        match Condition::parse(block.header) {
            Ok(condition) => {
                let truthy = condition.evaluate(ctx);
                tracing::trace!(condition = block.header, truthy, "if: evaluated");
                if truthy {
                    out.push_str(&pass.render(block.inner, ctx)?);
                }
            }
            Err(message) => {
                pass.malformed(message)?;
                out.push_str(block.text);
            }
        }
        cursor = block.end;
    }

    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Splits on whitespace, keeping quoted runs together.
fn split_tokens(header: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = header.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if ch == '"' || ch == '\'' {
            token.push(ch);
            chars.next();
            for inner in chars.by_ref() {
                token.push(inner);
                if inner == ch {
                    break;
                }
            }
        } else {
            while let Some(&inner) = chars.peek() {
                if inner.is_whitespace() {
                    break;
                }
                token.push(inner);
                chars.next();
            }
        }
        tokens.push(token);
    }

    tokens
}

fn strip_quotes(token: &str) -> Option<&str> {
    let first = token.chars().next()?;
    if token.len() >= 2 && (first == '"' || first == '\'') && token.ends_with(first) {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

fn resolve_operand(token: &str, ctx: &Context) -> Value {
    if let Some(literal) = strip_quotes(token) {
        return Value::String(literal.to_string());
    }
    if let Some(value) = ctx.resolve(token) {
        return value.clone();
    }
    match token.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => Value::String(token.to_string()),
    }
}

fn loose_ordering(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    if lhs.is_boolean() || rhs.is_boolean() {
        return Some(truthy(lhs).cmp(&truthy(rhs)));
    }
    if let (Some(a), Some(b)) = (as_number(lhs), as_number(rhs)) {
        return a.partial_cmp(&b);
    }
    match (as_text(lhs), as_text(rhs)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sleepy_hooks::NoHooks;

    fn ctx(value: Value) -> Context {
        match value {
            Value::Object(map) => Context::from_map(map),
            _ => panic!("test context must be an object"),
        }
    }

    fn expand(source: &str, data: Value) -> String {
        let hooks = NoHooks;
        let pass = Pass::new(&hooks, false);
        expand_if(&pass, source, &ctx(data)).unwrap()
    }

    fn holds(header: &str, data: Value) -> bool {
        Condition::parse(header).unwrap().evaluate(&ctx(data))
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!(Operator::parse("=="), Some(Operator::Eq));
        assert_eq!(Operator::parse("<>"), Some(Operator::Ne));
        assert_eq!(Operator::parse("!=="), Some(Operator::NotIdentical));
        assert_eq!(Operator::parse("="), None);
        assert_eq!(Operator::parse("and"), None);
        assert_eq!(Operator::Gte.to_string(), ">=");
    }

    #[test]
    fn test_eval_ordering() {
        assert!(Operator::Lte.eval_ordering(Ordering::Equal));
        assert!(Operator::Lte.eval_ordering(Ordering::Less));
        assert!(!Operator::Lte.eval_ordering(Ordering::Greater));
        assert!(Operator::Ne.eval_ordering(Ordering::Less));
        assert!(!Operator::Identical.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn test_literal_equality() {
        assert_eq!(expand(r#"{{#if "a" == "a"}}yes{{/if}}"#, json!({})), "yes");
        assert_eq!(expand(r#"{{#if "a" == "b"}}yes{{/if}}"#, json!({})), "");
        assert_eq!(expand(r#"{{#if 'a' != "b"}}yes{{/if}}"#, json!({})), "yes");
    }

    #[test]
    fn test_bound_operands() {
        let data = json!({"role": "admin", "count": 3, "user": {"age": 40}});
        assert!(holds(r#"role == "admin""#, data.clone()));
        assert!(holds("count > 2", data.clone()));
        assert!(holds("count <= 3", data.clone()));
        assert!(holds("user.age >= 18", data.clone()));
        assert!(!holds("count < 3", data));
    }

    #[test]
    fn test_numeric_strings_compare_as_numbers() {
        assert!(holds(r#""10" > "9""#, json!({})));
        assert!(holds("1.0 == 1", json!({})));
        assert!(holds(r#""abc" < "abd""#, json!({})));
    }

    #[test]
    fn test_boolean_and_null_keywords() {
        let data = json!({"flag": true, "off": false, "empty": null});
        assert!(holds("flag == true", data.clone()));
        assert!(holds("off == false", data.clone()));
        assert!(holds(r#"off == """#, data.clone()));
        assert!(holds(r#"empty == """#, data.clone()));
        assert!(holds("empty === null", data));
    }

    #[test]
    fn test_identity() {
        let data = json!({"n": 5, "s": "5"});
        assert!(holds("n == s", data.clone()));
        assert!(!holds("n === s", data.clone()));
        assert!(holds("n !== s", data));
    }

    #[test]
    fn test_containers_only_compare_by_identity() {
        let data = json!({"list": [1], "other": [1]});
        assert!(!holds("list == other", data.clone()));
        assert!(holds("list != other", data.clone()));
        assert!(holds("list === other", data));
    }

    #[test]
    fn test_quoted_tokens_with_spaces() {
        let data = json!({"name": "John Smith"});
        assert!(holds(r#"name == "John Smith""#, data));
        assert_eq!(
            split_tokens(r#" name   ==  'a b'  "#),
            vec!["name", "==", "'a b'"]
        );
    }

    #[test]
    fn test_quoted_operand_is_never_a_key() {
        assert!(!holds(r#""role" == "admin""#, json!({"role": "admin"})));
    }

    #[test]
    fn test_unknown_key_is_literal() {
        assert!(holds(r#"guest == "guest""#, json!({})));
    }

    #[test]
    fn test_nested_if() {
        let out = expand(
            "{{#if 1 == 1}}a{{#if 1 == 2}}b{{/if}}c{{/if}}",
            json!({}),
        );
        assert_eq!(out, "ac");
    }

    #[test]
    fn test_false_block_drops_content() {
        let out = expand("x{{#if 1 > 2}}{{#if 1 == 1}}inner{{/if}}{{/if}}y", json!({}));
        assert_eq!(out, "xy");
    }

    #[test]
    fn test_malformed_condition_left_literal() {
        assert_eq!(expand("{{#if a}}x{{/if}}", json!({})), "{{#if a}}x{{/if}}");
        assert_eq!(expand("{{#if a ~ b}}x{{/if}}", json!({})), "{{#if a ~ b}}x{{/if}}");
    }

    #[test]
    fn test_malformed_condition_strict() {
        let hooks = NoHooks;
        let pass = Pass::new(&hooks, true);
        let err = expand_if(&pass, "{{#if a ~ b}}x{{/if}}", &Context::new()).unwrap_err();
        assert!(err.to_string().contains("unknown operator `~`"));
    }

    #[test]
    fn test_no_code_evaluation() {
        // Operands are data, never code.
        let out = expand(r#"{{#if "1;exit()" == "1;exit()"}}safe{{/if}}"#, json!({}));
        assert_eq!(out, "safe");
    }
}
