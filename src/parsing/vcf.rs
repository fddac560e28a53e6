//! Parser for VCF structured header lines.
//!
//! Declarations look like:
//! `##INFO=<ID=DP,Number=1,Type=Integer,Description="Total depth">`
//! `##FILTER=<ID=q10,Description="Quality below 10">`
//! `##contig=<ID=chr1,length=248956422>`
//!
//! Only the four categories the reconciler manages are turned into
//! [`Declaration`]s; every other meta line is left to the caller verbatim.

use crate::core::declaration::{Category, Declaration, Provenance};
use crate::parsing::ParseError;

/// Parse a single `##KEY=<...>` line.
///
/// Returns `Ok(None)` for meta lines outside the managed categories and for
/// structured lines without an `ID`. A declaration whose description matches
/// one of `placeholders` is marked [`Provenance::AutoPlaceholder`].
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a managed line is not of the form
/// `##KEY=<...>` or carries an unparseable `Number` or `Type`.
pub fn parse_declaration_line(
    line: &str,
    placeholders: &[String],
) -> Result<Option<Declaration>, ParseError> {
    let Some((key, rest)) = line.strip_prefix("##").and_then(|s| s.split_once('=')) else {
        return Ok(None);
    };
    let Some(category) = Category::from_header_key(key) else {
        return Ok(None);
    };

    let content = rest
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .ok_or_else(|| {
            ParseError::InvalidFormat(format!("Invalid {category} line format: {line}"))
        })?;

    let mut id: Option<String> = None;
    let mut number = None;
    let mut value_type = None;
    let mut description: Option<String> = None;
    let mut length: Option<u64> = None;

    for part in split_fields(content) {
        let Some((field, value)) = part.split_once('=') else {
            continue;
        };
        let value = unquote(value.trim());

        match field.trim().to_lowercase().as_str() {
            "id" => id = Some(value),
            "number" => {
                number = Some(value.parse().map_err(|e| {
                    ParseError::InvalidFormat(format!("{e} in line: {line}"))
                })?);
            }
            "type" => {
                value_type = Some(value.parse().map_err(|e| {
                    ParseError::InvalidFormat(format!("{e} in line: {line}"))
                })?);
            }
            "description" => description = Some(value),
            "length" => length = value.parse().ok(),
            _ => {}
        }
    }

    let Some(id) = id else {
        return Ok(None);
    };

    let provenance = match &description {
        Some(desc) if category.has_description() && placeholders.iter().any(|p| p == desc) => {
            Provenance::AutoPlaceholder
        }
        _ => Provenance::Real,
    };

    let mut decl = Declaration::parsed(category, id).with_provenance(provenance);
    decl.number = number;
    decl.value_type = value_type;
    decl.description = description;
    decl.length = length;
    Ok(Some(decl))
}

/// Strip surrounding quotes and resolve `\"` / `\\` escapes
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Split declaration fields, handling commas (and escaped quotes) inside quoted values.
///
/// This is UTF-8 safe because:
/// - Commas are single-byte ASCII (0x2C)
/// - `char_indices()` yields byte positions at character boundaries
/// - After a comma at position `i`, `i + 1` is always a valid boundary
fn split_fields(content: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in content.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(&content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if start <= content.len() {
        fields.push(&content[start..]);
    }

    fields
}
