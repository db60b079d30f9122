//! FatturaPA document model.
//!
//! [`InvoiceDocument`] holds a parsed invoice as an element tree addressed by
//! [`NodeId`]. Fields are located with path expressions (see [`resolve`]),
//! line items are edited through structural operations that keep numbering
//! dense and the contribution line last, and [`recompute_totals`] derives the
//! summary, document, and payment amounts from the line totals.
//!
//! [`resolve`]: InvoiceDocument::resolve
//! [`recompute_totals`]: InvoiceDocument::recompute_totals

mod derive;
mod lines;
mod namespace;
mod parse;
mod path;
pub mod schema;
mod write;

pub use lines::{LineField, LineFields};
pub use namespace::{NamespaceStrategy, local_name};

use log::debug;
use std::path::Path;

use crate::core::{FatturaConfig, FatturaError};
use path::{Step, parse_path};

/// Handle to an element of one [`InvoiceDocument`].
///
/// Only meaningful for the document that produced it. Handles stay valid
/// after the element is detached, so a removed subtree can be inspected
/// or re-inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            text: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Result of a path lookup.
///
/// A miss is not an error: `node` is `None` and `text` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolved {
    pub node: Option<NodeId>,
    pub text: String,
}

/// A loaded FatturaPA invoice.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    nodes: Vec<Element>,
    root: NodeId,
    namespace: NamespaceStrategy,
    config: FatturaConfig,
}

impl InvoiceDocument {
    /// Parse an invoice from XML text.
    pub fn parse(xml: &str, config: &FatturaConfig) -> Result<Self, FatturaError> {
        let tree = parse::parse_tree(xml)?;
        let root = &tree.nodes[tree.root.0];
        let namespace = NamespaceStrategy::detect(&root.name, &root.attributes, &config.namespace_uri);
        if local_name(&root.name) != schema::ROOT {
            debug!("root element is <{}>, not <{}>", root.name, schema::ROOT);
        }
        debug!(
            "parsed invoice: {} elements, namespace {:?}",
            tree.nodes.len(),
            namespace
        );
        Ok(Self {
            nodes: tree.nodes,
            root: tree.root,
            namespace,
            config: config.clone(),
        })
    }

    /// Read and parse an invoice file.
    pub fn open(path: impl AsRef<Path>, config: &FatturaConfig) -> Result<Self, FatturaError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let xml = String::from_utf8(bytes)
            .map_err(|e| FatturaError::Xml(format!("{} is not UTF-8: {e}", path.display())))?;
        debug!("opening invoice {}", path.display());
        Self::parse(&xml, config)
    }

    /// An empty document holding only the root element.
    pub fn new(config: &FatturaConfig) -> Self {
        Self {
            nodes: vec![Element::new(schema::ROOT)],
            root: NodeId(0),
            namespace: NamespaceStrategy::Implicit,
            config: config.clone(),
        }
    }

    /// Serialize to XML text.
    pub fn to_xml(&self) -> Result<String, FatturaError> {
        write::write_document(self)
    }

    /// Serialize and write to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FatturaError> {
        let xml = self.to_xml()?;
        std::fs::write(path.as_ref(), xml)?;
        debug!("saved invoice to {}", path.as_ref().display());
        Ok(())
    }

    pub fn config(&self) -> &FatturaConfig {
        &self.config
    }

    pub fn namespace(&self) -> &NamespaceStrategy {
        &self.namespace
    }

    // -- Element access -----------------------------------------------------

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    fn element_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    /// Qualified name as it appeared in the input.
    pub fn name(&self, id: NodeId) -> &str {
        &self.element(id).name
    }

    pub fn local_name(&self, id: NodeId) -> &str {
        local_name(&self.element(id).name)
    }

    /// Text content, empty when the element has none.
    pub fn text_of(&self, id: NodeId) -> &str {
        self.element(id).text.as_deref().unwrap_or("")
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.element(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.element(id).parent
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        &self.element(id).attributes
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child with the given local name.
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.local_name(*c) == name)
    }

    /// All children with the given local name, in document order.
    pub fn children_named(&self, parent: NodeId, name: &str) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|c| self.local_name(*c) == name)
            .collect()
    }

    /// Elements reachable from the root, in document order.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            out.push(id);
            pending.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Slash-separated local-name path of an attached element, starting at the root.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = vec![self.local_name(id)];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            names.push(self.local_name(parent));
            current = parent;
        }
        names.reverse();
        names.join("/")
    }

    // -- Path lookup --------------------------------------------------------

    /// Locate a field by path.
    ///
    /// Paths are `/`-separated element names; leading slashes and namespace
    /// prefixes are ignored and the first step may be the root element itself.
    /// A `[n]` suffix picks the n-th matching sibling (1-based). When several
    /// elements match, the first in document order wins.
    ///
    /// Never fails: a miss or malformed path yields an empty [`Resolved`].
    pub fn resolve(&self, path: &str) -> Resolved {
        let Some(steps) = parse_path(path) else {
            debug!("ignoring malformed path '{path}'");
            return Resolved::default();
        };

        match self.find_first(&steps) {
            Some(node) => Resolved {
                node: Some(node),
                text: self.text_of(node).to_string(),
            },
            None => {
                debug!("path '{path}' not found");
                Resolved::default()
            }
        }
    }

    /// Text at `path`, empty when the path does not resolve.
    pub fn text(&self, path: &str) -> String {
        self.resolve(path).text
    }

    fn find_first(&self, steps: &[Step<'_>]) -> Option<NodeId> {
        let first = steps.first()?;
        let root_matches = self.local_name(self.root) == first.name && first.index.unwrap_or(1) == 1;

        let mut current = vec![self.root];
        let remaining = if root_matches { &steps[1..] } else { steps };
        for step in remaining {
            let mut next = Vec::new();
            for parent in &current {
                let matching = self.children_named(*parent, step.name);
                match step.index {
                    Some(n) => next.extend(matching.get(n - 1).copied()),
                    None => next.extend(matching),
                }
            }
            if next.is_empty() {
                return None;
            }
            current = next;
        }
        current.first().copied()
    }

    // -- Mutation -----------------------------------------------------------

    /// Replace the text of `node`. Does nothing when `node` is `None`.
    pub fn set_text(&mut self, node: Option<NodeId>, text: &str) {
        match node {
            Some(id) => self.element_mut(id).text = Some(text.to_string()),
            None => debug!("set_text on a missing element ignored"),
        }
    }

    /// Resolve `path` and replace its text. Returns whether the path resolved.
    pub fn set_path_text(&mut self, path: &str, text: &str) -> bool {
        let node = self.resolve(path).node;
        self.set_text(node, text);
        node.is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let attributes = &mut self.element_mut(id).attributes;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element::new(name));
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.element_mut(parent).children.push(child);
        self.element_mut(child).parent = Some(parent);
    }

    /// Insert `child` into `parent` before `reference`, or append it when
    /// `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        let children = &mut self.element_mut(parent).children;
        match children.iter().position(|c| *c == reference) {
            Some(pos) => children.insert(pos, child),
            None => children.push(child),
        }
        self.element_mut(child).parent = Some(parent);
    }

    /// Remove an element (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.element_mut(id).parent.take() {
            self.element_mut(parent).children.retain(|c| *c != id);
        }
    }

    /// Append an empty `<name/>` to `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.create_element(name);
        self.append_child(parent, id);
        id
    }

    /// Append `<name>text</name>` to `parent`.
    pub fn append_text_element(&mut self, parent: NodeId, name: &str, text: &str) -> NodeId {
        let id = self.create_element(name);
        self.element_mut(id).text = Some(text.to_string());
        self.append_child(parent, id);
        id
    }

    /// Return the element at `path`, creating missing elements along the way.
    ///
    /// Index suffixes address existing siblings only; a missing indexed step
    /// appends one new element.
    pub fn ensure_element(&mut self, path: &str) -> Result<NodeId, FatturaError> {
        let steps =
            parse_path(path).ok_or_else(|| FatturaError::Xml(format!("malformed path '{path}'")))?;

        let mut current = self.root;
        let mut rest = &steps[..];
        if let Some(first) = steps.first() {
            if first.name == self.local_name(self.root) {
                rest = &steps[1..];
            }
        }

        for step in rest {
            let matching = self.children_named(current, step.name);
            let existing = matching.get(step.index.unwrap_or(1) - 1).copied();
            current = match existing {
                Some(id) => id,
                None => {
                    let id = self.create_element(step.name);
                    self.append_child(current, id);
                    id
                }
            };
        }
        Ok(current)
    }

    /// Set the text at `path`, creating the element when needed.
    pub fn ensure_text(&mut self, path: &str, text: &str) -> Result<NodeId, FatturaError> {
        let id = self.ensure_element(path)?;
        self.set_text(Some(id), text);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<?xml-stylesheet type="text/xsl" href="old.xsl"?>
<!-- exported -->
<ns3:FatturaElettronica versione="FPR12" xmlns:ns3="http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2">
  <FatturaElettronicaHeader>
    <CedentePrestatore>
      <DatiAnagrafici>
        <Anagrafica><Denominazione>Rossi &amp; Figli</Denominazione></Anagrafica>
      </DatiAnagrafici>
    </CedentePrestatore>
  </FatturaElettronicaHeader>
  <FatturaElettronicaBody>
    <DatiBeniServizi>
      <DettaglioLinee><NumeroLinea>1</NumeroLinea><Descrizione>A</Descrizione></DettaglioLinee>
      <DettaglioLinee><NumeroLinea>2</NumeroLinea><Descrizione>B</Descrizione></DettaglioLinee>
    </DatiBeniServizi>
  </FatturaElettronicaBody>
</ns3:FatturaElettronica>"#;

    fn sample() -> InvoiceDocument {
        InvoiceDocument::parse(SAMPLE, &FatturaConfig::default()).unwrap()
    }

    #[test]
    fn parses_prefixed_root() {
        let doc = sample();
        assert_eq!(doc.name(doc.root()), "ns3:FatturaElettronica");
        assert_eq!(doc.local_name(doc.root()), "FatturaElettronica");
        assert_eq!(doc.namespace(), &NamespaceStrategy::Prefixed("ns3".into()));
        assert_eq!(doc.attribute(doc.root(), "versione"), Some("FPR12"));
    }

    #[test]
    fn resolves_with_and_without_root_step() {
        let doc = sample();
        let path = "FatturaElettronicaHeader/CedentePrestatore/DatiAnagrafici/Anagrafica/Denominazione";
        assert_eq!(doc.text(path), "Rossi & Figli");
        assert_eq!(doc.text(&format!("//p:FatturaElettronica/{path}")), "Rossi & Figli");
        assert_eq!(doc.text(&format!("/FatturaElettronica/{path}")), "Rossi & Figli");
    }

    #[test]
    fn first_match_wins() {
        let doc = sample();
        assert_eq!(
            doc.text("FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee/Descrizione"),
            "A"
        );
        assert_eq!(
            doc.text("FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee[2]/Descrizione"),
            "B"
        );
    }

    #[test]
    fn miss_degrades_to_empty() {
        let doc = sample();
        let r = doc.resolve("FatturaElettronicaBody/DatiPagamento/DettaglioPagamento/ImportoPagamento");
        assert_eq!(r, Resolved::default());
        assert_eq!(doc.resolve("FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee[3]"), Resolved::default());
        assert_eq!(doc.resolve("not//valid"), Resolved::default());
        assert_eq!(doc.resolve("FatturaElettronica").node, Some(doc.root()));
    }

    #[test]
    fn set_text_on_missing_is_noop() {
        let mut doc = sample();
        let before = doc.to_xml().unwrap();
        doc.set_text(None, "x");
        assert_eq!(doc.to_xml().unwrap(), before);
        assert!(!doc.set_path_text("FatturaElettronicaBody/Nope", "x"));
    }

    #[test]
    fn ensure_element_creates_missing_chain() {
        let mut doc = sample();
        let id = doc
            .ensure_text("FatturaElettronicaBody/DatiPagamento/DettaglioPagamento/ImportoPagamento", "1.00")
            .unwrap();
        assert_eq!(doc.path_of(id), "FatturaElettronica/FatturaElettronicaBody/DatiPagamento/DettaglioPagamento/ImportoPagamento");
        assert_eq!(
            doc.text("FatturaElettronicaBody/DatiPagamento/DettaglioPagamento/ImportoPagamento"),
            "1.00"
        );
        // Existing elements are reused.
        let again = doc
            .ensure_element("FatturaElettronicaBody/DatiPagamento/DettaglioPagamento/ImportoPagamento")
            .unwrap();
        assert_eq!(again, id);
    }

    #[test]
    fn rejects_malformed_xml() {
        let config = FatturaConfig::default();
        assert!(matches!(
            InvoiceDocument::parse("<a><b></a>", &config),
            Err(FatturaError::Xml(_))
        ));
        assert!(matches!(
            InvoiceDocument::parse("<a>", &config),
            Err(FatturaError::Xml(_))
        ));
        assert!(matches!(
            InvoiceDocument::parse("", &config),
            Err(FatturaError::Xml(_))
        ));
    }

    #[test]
    fn detach_and_reinsert() {
        let mut doc = sample();
        let section = doc.resolve("FatturaElettronicaBody/DatiBeniServizi").node.unwrap();
        let lines = doc.children_named(section, "DettaglioLinee");
        doc.detach(lines[1]);
        assert_eq!(doc.children_named(section, "DettaglioLinee").len(), 1);
        doc.insert_before(section, lines[1], lines[0]);
        assert_eq!(doc.children_named(section, "DettaglioLinee"), vec![lines[1], lines[0]]);
    }
}
