//! Escaping for every syntax user input is substituted into
//!
//! All renderers route operator-supplied text (app name, URL, paths) through
//! these functions; no template interpolates raw input.

use std::fmt::Write;

/// Escape text for XML element content.
pub fn xml_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_forbidden(c) => {}
            c => out.push(c),
        }
    }
    out
}

/// Escape text for a double- or single-quoted XML attribute value.
pub fn xml_attr(input: &str) -> String {
    xml_text(input)
}

/// Characters XML 1.0 cannot represent at all
fn is_xml_forbidden(c: char) -> bool {
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

/// Escape text for an Android string resource (`<string>` content).
///
/// aapt2 treats `'` and `"` specially, and a leading `@` or `?` as a
/// reference, so those are backslash-escaped before XML escaping.
pub fn android_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for (i, c) in input.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '@' | '?' if i == 0 => {
                out.push('\\');
                out.push(c);
            }
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if is_xml_forbidden(c) || c == '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Escape text for the inside of a Java double-quoted string literal.
///
/// Non-ASCII characters become `\uXXXX` so the generated source is pure ASCII.
pub fn java_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => push_utf16_escapes(&mut out, c),
        }
    }
    out
}

/// Escape text for the inside of a Groovy single-quoted string.
pub fn groovy_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => push_utf16_escapes(&mut out, c),
            c => out.push(c),
        }
    }
    out
}

/// Escape a value for a Java `.properties` file.
pub fn properties_value(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for (i, c) in input.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            ':' | '=' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if i == 0 => out.push_str("\\ "),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => push_utf16_escapes(&mut out, c),
        }
    }
    out
}

fn push_utf16_escapes(out: &mut String, c: char) {
    let mut units = [0u16; 2];
    for unit in c.encode_utf16(&mut units) {
        // Writing to a String cannot fail.
        let _ = write!(out, "\\u{:04x}", unit);
    }
}
