use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{Element, NodeId};
use crate::core::FatturaError;

/// Parsed element arena with its root.
pub(super) struct ParsedTree {
    pub nodes: Vec<Element>,
    pub root: NodeId,
}

/// Build the element tree from XML text.
///
/// Whitespace-only text, comments, processing instructions, and the DOCTYPE
/// are dropped; the writer regenerates indentation and the stylesheet
/// instruction on save.
pub(super) fn parse_tree(xml: &str) -> Result<ParsedTree, FatturaError> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut nodes: Vec<Element> = Vec::new();
    let mut root: Option<NodeId> = None;
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let id = open_element(&mut nodes, &mut root, &stack, e)?;
                stack.push(id);
            }
            Ok(Event::Empty(ref e)) => {
                open_element(&mut nodes, &mut root, &stack, e)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| FatturaError::Xml(format!("XML parse error: {e}")))?;
                append_text(&mut nodes, &stack, &text);
            }
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                let text = std::str::from_utf8(&raw)
                    .map_err(|e| FatturaError::Xml(format!("CDATA is not UTF-8: {e}")))?;
                append_text(&mut nodes, &stack, text);
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FatturaError::Xml(format!(
                    "XML parse error at position {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(FatturaError::Xml("unexpected end of document".into()));
    }
    let root = root.ok_or_else(|| FatturaError::Xml("document has no root element".into()))?;
    Ok(ParsedTree { nodes, root })
}

fn open_element(
    nodes: &mut Vec<Element>,
    root: &mut Option<NodeId>,
    stack: &[NodeId],
    e: &BytesStart<'_>,
) -> Result<NodeId, FatturaError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|e| FatturaError::Xml(format!("element name is not UTF-8: {e}")))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| FatturaError::Xml(format!("bad attribute on <{name}>: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| FatturaError::Xml(format!("attribute name is not UTF-8: {e}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| FatturaError::Xml(format!("bad attribute value on <{name}>: {e}")))?
            .into_owned();
        attributes.push((key, value));
    }

    let id = NodeId(nodes.len());
    let parent = stack.last().copied();
    match parent {
        Some(p) => nodes[p.0].children.push(id),
        None if root.is_some() => {
            return Err(FatturaError::Xml(format!(
                "unexpected second root element <{name}>"
            )));
        }
        None => *root = Some(id),
    }

    nodes.push(Element {
        name,
        attributes,
        text: None,
        parent,
        children: Vec::new(),
    });
    Ok(id)
}

fn append_text(nodes: &mut [Element], stack: &[NodeId], text: &str) {
    if text.is_empty() {
        return;
    }
    // Text outside the root element is whitespace after trimming, or ignorable.
    if let Some(current) = stack.last() {
        nodes[current.0]
            .text
            .get_or_insert_with(String::new)
            .push_str(text);
    }
}
