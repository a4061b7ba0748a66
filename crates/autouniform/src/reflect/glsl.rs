//! Rewrites desktop-GL style GLSL into the Vulkan-style dialect naga's front-end accepts.
//!
//! - loose non-opaque `uniform T a, b;` declarations become anonymous bound blocks,
//!   so their members still reflect as top-level uniforms;
//! - uniform blocks and opaque uniforms without a `binding` get one;
//! - top-level `in`/`out` variables without a `location` get one;
//! - the `#version` line is forced to 450.
//!
//! Function bodies are passed through untouched.

const TARGET_VERSION: &str = "#version 450";

const QUALIFIERS: &[&str] = &[
    "uniform",
    "buffer",
    "in",
    "out",
    "const",
    "flat",
    "smooth",
    "noperspective",
    "centroid",
    "invariant",
    "precise",
    "highp",
    "mediump",
    "lowp",
    "readonly",
    "writeonly",
    "coherent",
    "volatile",
    "restrict",
];

const OPAQUE_PREFIXES: &[&str] = &[
    "sampler",
    "isampler",
    "usampler",
    "image",
    "iimage",
    "uimage",
    "texture",
    "itexture",
    "utexture",
    "subpassInput",
    "isubpassInput",
    "usubpassInput",
    "atomic_uint",
];

#[derive(Default)]
struct Counters {
    binding: u32,
    input: u32,
    output: u32,
}

impl Counters {
    fn next(counter: &mut u32) -> u32 {
        let value = *counter;
        *counter += 1;
        value
    }
}

/// Rewrite `source` so naga can parse it.
pub fn prepare_glsl(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 128);
    let mut counters = Counters::default();
    let mut last = 0;
    for (start, end) in top_level_statements(source) {
        out.push_str(&source[last..start]);
        let stmt = &source[start..end];
        match rewrite_statement(stmt, &mut counters) {
            Some(rewritten) => out.push_str(&rewritten),
            None => out.push_str(stmt),
        }
        last = end;
    }
    out.push_str(&source[last..]);
    set_version(&out)
}

/// Byte ranges of the declarations and function definitions at brace depth 0.
/// Comments and preprocessor lines between them are not part of any range.
fn top_level_statements(src: &str) -> Vec<(usize, usize)> {
    let bytes = src.as_bytes();
    let mut ranges = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let next = bytes.get(i + 1).copied();
        if c == b'/' && next == Some(b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if c == b'/' && next == Some(b'*') {
            i += 2;
            while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }
        if c == b'#' && start.is_none() {
            while i < bytes.len() && !(bytes[i] == b'\n' && (i == 0 || bytes[i - 1] != b'\\')) {
                i += 1;
            }
            continue;
        }
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let s = *start.get_or_insert(i);
        match c {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && is_function(&src[s..i]) {
                    ranges.push((s, i + 1));
                    start = None;
                }
            }
            b';' if depth == 0 => {
                ranges.push((s, i + 1));
                start = None;
            }
            _ => {}
        }
        i += 1;
    }
    ranges
}

fn is_function(head: &str) -> bool {
    head.find('{')
        .is_some_and(|brace| head[..brace].trim_end().ends_with(')'))
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let line = rest.find("//");
        let block = rest.find("/*");
        let (pos, is_line) = match (line, block) {
            (Some(l), Some(b)) if l < b => (l, true),
            (_, Some(b)) => (b, false),
            (Some(l), None) => (l, true),
            (None, None) => break,
        };
        out.push_str(&rest[..pos]);
        out.push(' ');
        let after = &rest[pos + 2..];
        rest = if is_line {
            after.find('\n').map_or("", |n| &after[n..])
        } else {
            after.find("*/").map_or("", |n| &after[n + 2..])
        };
    }
    out.push_str(rest);
    out
}

/// Split a leading `layout(...)` off a declaration.
fn split_layout(body: &str) -> (&str, &str) {
    let Some(after) = body.strip_prefix("layout") else {
        return ("", body);
    };
    let Some(inner) = after.trim_start().strip_prefix('(') else {
        return ("", body);
    };
    match inner.find(')') {
        Some(close) => (inner[..close].trim(), inner[close + 1..].trim_start()),
        None => ("", body),
    }
}

fn has_key(layout: &str, key: &str) -> bool {
    layout
        .split(',')
        .any(|arg| arg.split('=').next().is_some_and(|k| k.trim() == key))
}

fn with_arg(layout: &str, arg: &str) -> String {
    if layout.is_empty() {
        arg.to_string()
    } else {
        format!("{layout}, {arg}")
    }
}

fn is_opaque(ty: &str) -> bool {
    OPAQUE_PREFIXES.iter().any(|prefix| {
        ty.strip_prefix(prefix).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_digit() || c.is_ascii_uppercase())
        })
    })
}

/// The text after the first `n` whitespace-separated words.
fn after_words(text: &str, n: usize) -> Option<&str> {
    let mut rest = text.trim_start();
    for _ in 0..n {
        let end = rest.find(char::is_whitespace)?;
        rest = rest[end..].trim_start();
    }
    Some(rest)
}

/// Split on commas that are not nested in parentheses or brackets.
fn split_declarators(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn rewrite_statement(stmt: &str, counters: &mut Counters) -> Option<String> {
    let clean = strip_comments(stmt);
    let body = clean.trim().strip_suffix(';')?.trim();
    let (layout, rest) = split_layout(body);

    if let Some(brace) = rest.find('{') {
        let is_block = rest[..brace]
            .split_whitespace()
            .any(|w| w == "uniform" || w == "buffer");
        if !is_block || has_key(layout, "binding") {
            return None;
        }
        let binding = Counters::next(&mut counters.binding);
        let args = with_arg(layout, &format!("binding = {binding}"));
        return Some(format!("layout({args}) {rest};"));
    }

    let words: Vec<&str> = rest.split_whitespace().collect();
    let qualifier_count = words.iter().take_while(|w| QUALIFIERS.contains(w)).count();
    let qualifiers = &words[..qualifier_count];
    let ty = *words.get(qualifier_count)?;

    if qualifiers.contains(&"uniform") {
        if is_opaque(ty) {
            if has_key(layout, "binding") {
                return None;
            }
            let binding = Counters::next(&mut counters.binding);
            let args = with_arg(layout, &format!("binding = {binding}"));
            return Some(format!("layout({args}) {rest};"));
        }

        let declarators = after_words(rest, qualifier_count + 1)?;
        let members: Vec<String> = split_declarators(declarators)
            .into_iter()
            .map(|d| d.split('=').next().unwrap_or(d).trim())
            .filter(|name| !name.is_empty())
            .map(|name| format!("{ty} {name};"))
            .collect();
        if members.is_empty() {
            return None;
        }
        let binding = Counters::next(&mut counters.binding);
        return Some(format!(
            "layout(set = 0, binding = {binding}) uniform _autouniform_block_{binding} {{ {} }};",
            members.join(" ")
        ));
    }

    let input = qualifiers.contains(&"in");
    let output = qualifiers.contains(&"out");
    if (input || output) && !has_key(layout, "location") {
        let location = if input {
            Counters::next(&mut counters.input)
        } else {
            Counters::next(&mut counters.output)
        };
        let args = with_arg(layout, &format!("location = {location}"));
        return Some(format!("layout({args}) {rest};"));
    }
    None
}

fn set_version(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + TARGET_VERSION.len() + 1);
    let mut found = false;
    for line in text.split_inclusive('\n') {
        if !found && line.trim_start().starts_with("#version") {
            found = true;
            out.push_str(TARGET_VERSION);
            if line.ends_with('\n') {
                out.push('\n');
            }
        } else {
            out.push_str(line);
        }
    }
    if !found {
        out.insert_str(0, &format!("{TARGET_VERSION}\n"));
    }
    out
}
