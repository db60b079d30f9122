use log::warn;

/// How the invoice namespace is declared on the loaded root element.
///
/// Detected once when a document is parsed. Lookups do not depend on it,
/// since elements are always matched by local name under the single invoice
/// namespace. Saving uses it to drop declarations that the rewritten
/// `p:`-prefixed root replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceStrategy {
    /// `<p:FatturaElettronica xmlns:p="...">`, carrying the prefix found.
    Prefixed(String),
    /// `<FatturaElettronica xmlns="...">`
    DefaultNamespace,
    /// No declaration of the invoice namespace; it is assumed.
    Implicit,
}

impl NamespaceStrategy {
    /// Inspect the root element's name and attributes.
    pub fn detect(root_name: &str, attributes: &[(String, String)], namespace_uri: &str) -> Self {
        if let Some((prefix, _)) = root_name.split_once(':') {
            let key = format!("xmlns:{prefix}");
            match attributes.iter().find(|(k, _)| *k == key) {
                Some((_, uri)) if uri != namespace_uri => {
                    warn!("root prefix '{prefix}' is bound to '{uri}', treating it as the invoice namespace");
                }
                None => warn!("root prefix '{prefix}' has no declaration on the root element"),
                _ => {}
            }
            return NamespaceStrategy::Prefixed(prefix.to_string());
        }

        if attributes
            .iter()
            .any(|(k, v)| k == "xmlns" && v == namespace_uri)
        {
            NamespaceStrategy::DefaultNamespace
        } else {
            NamespaceStrategy::Implicit
        }
    }

    /// Whether a root attribute declares the invoice namespace and must be
    /// replaced by the prefixed declaration on save.
    pub fn is_replaced_declaration(
        &self,
        key: &str,
        value: &str,
        namespace_uri: &str,
        output_prefix: &str,
    ) -> bool {
        if key == "xmlns" {
            return value == namespace_uri;
        }
        match key.strip_prefix("xmlns:") {
            Some(prefix) if prefix == output_prefix => true,
            Some(prefix) => match self {
                NamespaceStrategy::Prefixed(p) if p == prefix => true,
                _ => value == namespace_uri,
            },
            None => false,
        }
    }
}

/// Local part of a qualified name.
pub fn local_name(qname: &str) -> &str {
    match qname.rsplit_once(':') {
        Some((_, local)) => local,
        None => qname,
    }
}
