//! Tag lexing and balanced block matching.
//!
//! A tag is anything between `{{` and `}}`. The lexer classifies each tag by
//! its first character and keyword:
//!
//! ```text
//! {{ #each u in users }}   Open(Each)
//! {{ /each }}             Close(Each)
//! {{ #if a == b }}        Open(If)
//! {{ /if }}               Close(If)
//! {{ #include header }}   Include
//! {{ #unknown }}          Directive (left alone)
//! {{ user.name upper }}   Placeholder
//! ```
//!
//! Block matching walks the tag list counting opens and closes of one kind,
//! so `#each` inside `#each` nests instead of ending at the first `/each`.
//! Tags of the other kind are ignored while counting.

use once_cell::sync::Lazy;
use regex::Regex;

// The body may span lines and hold single braces, but never `{{` or `}}`, so
// an unclosed `{{` stays literal instead of swallowing text up to a later tag.
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*((?:[^{}]|\{[^{]|\}[^}])*?)\s*\}\}").expect("tag pattern is a valid regex")
});

/// The two block directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Each,
    If,
}

impl BlockKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "each" => Some(BlockKind::Each),
            "if" => Some(BlockKind::If),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagKind {
    Open(BlockKind),
    Close(BlockKind),
    Include,
    /// A `#` or `/` marker that is not a known directive.
    Directive,
    Placeholder,
    /// `{{ }}` with nothing inside.
    Empty,
}

/// One `{{ ... }}` occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tag<'a> {
    /// Byte offset of `{{`.
    pub start: usize,
    /// Byte offset just past `}}`.
    pub end: usize,
    /// The full tag text, braces included.
    pub text: &'a str,
    /// The trimmed content between the braces.
    pub body: &'a str,
    pub kind: TagKind,
}

impl<'a> Tag<'a> {
    /// The content after the directive keyword, trimmed.
    ///
    /// For `{{ #each u in users }}` this is `u in users`.
    pub fn args(&self) -> &'a str {
        let rest = self.body.get(1..).unwrap_or_default().trim_start();
        let keyword_len = rest
            .find(char::is_whitespace)
            .unwrap_or(rest.len());
        rest[keyword_len..].trim()
    }
}

/// Splits `source` into its tags, in order of appearance.
pub(crate) fn lex(source: &str) -> Vec<Tag<'_>> {
    TAG.captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1).map_or("", |m| m.as_str());
            Some(Tag {
                start: whole.start(),
                end: whole.end(),
                text: whole.as_str(),
                body,
                kind: classify(body),
            })
        })
        .collect()
}

fn classify(body: &str) -> TagKind {
    let Some(marker) = body.chars().next() else {
        return TagKind::Empty;
    };

    if marker != '#' && marker != '/' {
        return TagKind::Placeholder;
    }

    let rest = body[1..].trim_start();
    let keyword = rest
        .split(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match (marker, keyword.as_str()) {
        ('#', "include") => TagKind::Include,
        ('#', kw) => BlockKind::from_keyword(kw).map_or(TagKind::Directive, TagKind::Open),
        ('/', kw) if rest.trim().len() == kw.len() => {
            BlockKind::from_keyword(kw).map_or(TagKind::Directive, TagKind::Close)
        }
        _ => TagKind::Directive,
    }
}

/// A balanced directive block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block<'a> {
    /// Byte offset of the opening tag.
    pub start: usize,
    /// Byte offset just past the closing tag.
    pub end: usize,
    /// The directive arguments of the opening tag.
    pub header: &'a str,
    /// Everything between the opening and closing tags.
    pub inner: &'a str,
    /// The whole block, markers included.
    pub text: &'a str,
}

/// Result of scanning a source for blocks of one kind.
#[derive(Debug, Default)]
pub(crate) struct BlockScan<'a> {
    /// Top-level blocks in order of appearance.
    pub blocks: Vec<Block<'a>>,
    /// Opening or closing tags with no partner.
    pub unmatched: Vec<&'a str>,
}

/// Finds every top-level block of `kind` in `source`.
///
/// An opening tag without a matching close is reported as unmatched and the
/// scan resumes right after it, so complete blocks nested inside it are still
/// found.
pub(crate) fn find_blocks(source: &str, kind: BlockKind) -> BlockScan<'_> {
    let tags: Vec<Tag<'_>> = lex(source)
        .into_iter()
        .filter(|t| t.kind == TagKind::Open(kind) || t.kind == TagKind::Close(kind))
        .collect();

    let mut scan = BlockScan::default();
    let mut i = 0;

    while i < tags.len() {
        let open = tags[i];
        if open.kind == TagKind::Close(kind) {
            scan.unmatched.push(open.text);
            i += 1;
            continue;
        }

        match matching_close(&tags, i) {
            Some(j) => {
                let close = tags[j];
                scan.blocks.push(Block {
                    start: open.start,
                    end: close.end,
                    header: open.args(),
                    inner: &source[open.end..close.start],
                    text: &source[open.start..close.end],
                });
                i = j + 1;
            }
            None => {
                scan.unmatched.push(open.text);
                i += 1;
            }
        }
    }

    scan
}

fn matching_close(tags: &[Tag<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, tag) in tags[open..].iter().enumerate() {
        match tag.kind {
            TagKind::Open(_) => depth += 1,
            TagKind::Close(_) => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}
