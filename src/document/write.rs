use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Write};

use super::namespace::{NamespaceStrategy, local_name};
use super::schema::{LINE_ITEM, SUMMARY_BLOCK};
use super::{InvoiceDocument, NodeId};
use crate::core::FatturaError;

fn xml_io(e: std::io::Error) -> FatturaError {
    FatturaError::Xml(format!("XML write error: {e}"))
}

enum Visit {
    Open(NodeId),
    Close(NodeId),
}

/// Serialize the document in the form expected by downstream viewers:
///
/// - XML declaration followed by the `xml-stylesheet` instruction;
/// - root element named `{prefix}:FatturaElettronica` declaring `xmlns:{prefix}`,
///   with no default namespace declaration;
/// - two-space indentation, with the summary block always starting on its own
///   line after the last line item.
pub(super) fn write_document(doc: &InvoiceDocument) -> Result<String, FatturaError> {
    let config = doc.config();
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_io)?;
    writer
        .get_mut()
        .write_all(
            format!(
                "\n<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>",
                escape_attr(&config.stylesheet_href)
            )
            .as_bytes(),
        )
        .map_err(xml_io)?;

    let root = doc.root();
    let root_name = format!(
        "{}:{}",
        config.root_prefix,
        local_name(doc.name(root))
    );

    // Iterative so that deeply nested input cannot exhaust the stack.
    let mut pending = vec![Visit::Open(root)];
    while let Some(visit) = pending.pop() {
        match visit {
            Visit::Open(id) => {
                let element = doc.element(id);
                let start = if id == root {
                    root_start(doc, &root_name)
                } else {
                    let mut start = BytesStart::new(element.name.as_str());
                    for (k, v) in &element.attributes {
                        start.push_attribute((k.as_str(), v.as_str()));
                    }
                    start
                };

                let text = element.text.as_deref().unwrap_or("");
                if element.children.is_empty() && text.is_empty() {
                    writer.write_event(Event::Empty(start)).map_err(xml_io)?;
                    continue;
                }

                writer.write_event(Event::Start(start)).map_err(xml_io)?;
                if !text.is_empty() {
                    writer
                        .write_event(Event::Text(BytesText::new(text)))
                        .map_err(xml_io)?;
                }
                pending.push(Visit::Close(id));
                for child in element.children.iter().rev() {
                    pending.push(Visit::Open(*child));
                }
            }
            Visit::Close(id) => {
                let name = if id == root {
                    root_name.as_str()
                } else {
                    doc.name(id)
                };
                writer
                    .write_event(Event::End(BytesEnd::new(name)))
                    .map_err(xml_io)?;
            }
        }
    }

    let buf = writer.into_inner().into_inner();
    let xml = String::from_utf8(buf)
        .map_err(|e| FatturaError::Xml(format!("XML UTF-8 error: {e}")))?;
    let mut xml = separate_summary_blocks(&xml);
    xml.push('\n');
    Ok(xml)
}

fn root_start<'a>(doc: &'a InvoiceDocument, root_name: &'a str) -> BytesStart<'a> {
    let config = doc.config();
    let mut start = BytesStart::new(root_name);
    let declaration = format!("xmlns:{}", config.root_prefix);
    start.push_attribute((declaration.as_str(), config.namespace_uri.as_str()));

    // The loaded root prefix stays declared while descendants still use it.
    let kept = match doc.namespace() {
        NamespaceStrategy::Prefixed(prefix)
            if *prefix != config.root_prefix && prefix_in_use(doc, prefix) =>
        {
            Some(format!("xmlns:{prefix}"))
        }
        _ => None,
    };

    let element = doc.element(doc.root());
    for (k, v) in &element.attributes {
        if kept.as_deref() != Some(k.as_str())
            && doc.namespace().is_replaced_declaration(
            k,
            v,
            &config.namespace_uri,
            &config.root_prefix,
        ) {
            continue;
        }
        start.push_attribute((k.as_str(), v.as_str()));
    }
    start
}

/// Whether any element below the root, or any attribute in the document, is
/// qualified with `prefix`.
fn prefix_in_use(doc: &InvoiceDocument, prefix: &str) -> bool {
    let qualified = |name: &str| name.split_once(':').is_some_and(|(p, _)| p == prefix);
    doc.descendants().into_iter().any(|id| {
        let element = doc.element(id);
        (id != doc.root() && qualified(element.name.as_str()))
            || element
                .attributes
                .iter()
                .any(|(k, _)| !k.starts_with("xmlns") && qualified(k.as_str()))
    })
}

/// Put `DatiRiepilogo` on its own line, six spaces deep, right after the
/// closing `DettaglioLinee` tag.
pub(crate) fn separate_summary_blocks(xml: &str) -> String {
    let close_tag = format!("</{LINE_ITEM}>");
    let mut out = String::with_capacity(xml.len() + 64);
    let mut rest = xml;

    while let Some(pos) = rest.find(&close_tag) {
        let after_close = pos + close_tag.len();
        out.push_str(&rest[..after_close]);
        rest = &rest[after_close..];

        let trimmed = rest.trim_start();
        if opens_summary_block(trimmed) {
            out.push_str("\n      ");
            rest = trimmed;
        }
    }
    out.push_str(rest);
    out
}

fn opens_summary_block(s: &str) -> bool {
    let Some(tag) = s.strip_prefix('<') else {
        return false;
    };
    let name_end = tag
        .find(|c: char| c == '>' || c == '/' || c.is_whitespace())
        .unwrap_or(tag.len());
    local_name(&tag[..name_end]) == SUMMARY_BLOCK
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
