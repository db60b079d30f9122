use thiserror::Error;

/// Errors that can occur while loading, editing, mapping, or storing invoices.
///
/// Field lookups that find nothing are not errors: [`crate::document::InvoiceDocument::resolve`]
/// degrades to an empty value instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FatturaError {
    /// Malformed or unreadable XML, or a serialization failure.
    #[error("XML error: {0}")]
    Xml(String),

    /// A structural edit needed a section that the document does not contain.
    #[error("required element not found: {0}")]
    AncestorNotFound(String),

    /// Removal refused because the line is the only normal line left.
    #[error("cannot remove the only remaining line item")]
    LastLine,

    /// Non-numeric content in a numeric field.
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// Tabular storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// No invoice with the given identifier exists in storage.
    #[error("invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
