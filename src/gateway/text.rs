//! Readable text excerpts of non-JSON error responses.
//!
//! Remote APIs frequently answer failures with an HTML error page. The
//! gateway logs the first line of its readable text and raises with the
//! whole excerpt.

use tl::{Node, NodeHandle, Parser, ParserOptions};

const SKIPPED_TAGS: &[&str] = &["script", "style", "head"];

/// Converts an HTML (or plain text) body into newline-separated text lines.
pub fn readable_text(body: &str) -> String {
    let lines = match tl::parse(body, ParserOptions::default()) {
        Ok(dom) => {
            let parser = dom.parser();
            let mut lines = Vec::new();
            for handle in dom.children() {
                collect_text(*handle, parser, &mut lines);
            }
            lines
        }
        Err(_) => text_lines(body),
    };
    lines.join("\n")
}

/// First line of a [`readable_text`] result, or an empty string.
pub fn first_line(readable: &str) -> &str {
    readable.lines().next().unwrap_or_default()
}

fn collect_text(handle: NodeHandle, parser: &Parser<'_>, lines: &mut Vec<String>) {
    let Some(node) = handle.get(parser) else {
        return;
    };

    match node {
        Node::Raw(bytes) => lines.extend(text_lines(&decode_entities(&bytes.as_utf8_str()))),
        Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_ascii_lowercase();
            if SKIPPED_TAGS.contains(&name.as_str()) {
                return;
            }
            for child in tag.children().top().iter() {
                collect_text(*child, parser, lines);
            }
        }
        Node::Comment(_) => {}
    }
}

fn text_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Decodes numeric character references and the common named entities.
/// Unknown entities are left as written.
fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        rest = &rest[start..];

        let entity = rest
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));
        match entity {
            Some((c, end)) => {
                decoded.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

const MAX_ENTITY_LEN: usize = 10;

fn decode_entity(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(decimal) = name.strip_prefix('#') {
        return decimal.parse().ok().and_then(char::from_u32);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "hellip" => '\u{2026}',
        _ => return None,
    };
    Some(c)
}
