//! Element path expressions.
//!
//! A path is a `/`-separated list of element names, e.g.
//! `//p:FatturaElettronica/FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee[2]/Descrizione`.
//! Leading slashes and namespace prefixes are ignored; a `[n]` suffix selects
//! the n-th (1-based) matching child of each parent. The first step may name the
//! root element or one of its children.

use super::namespace::local_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step<'a> {
    pub name: &'a str,
    pub index: Option<usize>,
}

/// Split a path into steps. Returns `None` for empty or malformed paths.
pub(crate) fn parse_path(path: &str) -> Option<Vec<Step<'_>>> {
    let trimmed = path.trim().trim_start_matches("./").trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    trimmed.split('/').map(parse_step).collect()
}

fn parse_step(segment: &str) -> Option<Step<'_>> {
    let (name, index) = match segment.split_once('[') {
        Some((name, rest)) => {
            let n: usize = rest.strip_suffix(']')?.trim().parse().ok()?;
            if n == 0 {
                return None;
            }
            (name, Some(n))
        }
        None => (segment, None),
    };

    let name = local_name(name.trim());
    if name.is_empty() || name.starts_with('@') {
        return None;
    }
    Some(Step { name, index })
}
