use serde::{Deserialize, Serialize};

#[cfg(feature = "json")]
use super::error::FatturaError;

/// FatturaPA schema v1.2 namespace URI.
pub const FATTURAPA_NS: &str = "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2";

/// Stylesheet referenced by the processing instruction written on save.
pub const DEFAULT_STYLESHEET_HREF: &str = "./fatturapa_v1.2_asw.xsl";

/// Description text of the contribution line ("sentinel" line).
pub const SENTINEL_DESCRIPTION: &str = "CONTRIBUTO CONAI ASSOLTO";

/// How the contribution line is recognised among the line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelPolicy {
    /// Description equals [`SENTINEL_DESCRIPTION`], ignoring case and surrounding whitespace.
    #[default]
    Exact,
    /// Description contains [`SENTINEL_DESCRIPTION`], ignoring case.
    Contains,
    /// No line is ever treated as the contribution line.
    Disabled,
}

impl SentinelPolicy {
    /// Whether a line with this description is the contribution line.
    pub fn matches(self, description: &str) -> bool {
        match self {
            SentinelPolicy::Exact => description
                .trim()
                .eq_ignore_ascii_case(SENTINEL_DESCRIPTION),
            SentinelPolicy::Contains => description
                .to_uppercase()
                .contains(SENTINEL_DESCRIPTION),
            SentinelPolicy::Disabled => false,
        }
    }
}

/// Whether the last normal line item may be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRemovalPolicy {
    /// Refuse to remove the only normal line.
    #[default]
    KeepAtLeastOne,
    /// Any line may be removed, leaving zero normal lines.
    AllowEmpty,
}

/// Literal values for fields that tabular storage does not retain.
///
/// Used when a document is synthesized from stored rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonDefaults {
    /// `versione` attribute of the root element.
    pub format_version: String,
    /// Country code used for transmitter, parties, and addresses.
    pub country_code: String,
    pub transmission_format: String,
    pub progressive_number: String,
    pub recipient_code: String,
    /// Supplier tax regime (`RegimeFiscale`).
    pub tax_regime: String,
    pub street: String,
    pub postal_code: String,
    pub municipality: String,
    pub province: String,
    pub currency: String,
    pub document_type: String,
    /// `CondizioniPagamento`.
    pub payment_terms: String,
    /// `ModalitaPagamento`.
    pub payment_method: String,
    /// Days between invoice date and payment due date.
    pub payment_due_days: i64,
    pub vat_exigibility: String,
}

impl Default for SkeletonDefaults {
    fn default() -> Self {
        Self {
            format_version: "FPR12".into(),
            country_code: "IT".into(),
            transmission_format: "FPR12".into(),
            progressive_number: "00001".into(),
            recipient_code: "0000000".into(),
            tax_regime: "RF01".into(),
            street: "Via da definire 1".into(),
            postal_code: "00100".into(),
            municipality: "Roma".into(),
            province: "RM".into(),
            currency: "EUR".into(),
            document_type: "TD01".into(),
            payment_terms: "TP02".into(),
            payment_method: "MP05".into(),
            payment_due_days: 30,
            vat_exigibility: "I".into(),
        }
    }
}

/// Application context shared by the document model, mapper, and lookup table.
///
/// Created once by the caller and passed by reference; nothing in this crate
/// keeps module-level mutable state.
///
/// ```
/// use fatturapa::core::*;
///
/// let config = FatturaConfig {
///     line_removal: LineRemovalPolicy::AllowEmpty,
///     ..Default::default()
/// };
/// assert_eq!(config.root_prefix, "p");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatturaConfig {
    pub namespace_uri: String,
    /// Prefix bound to the namespace on the saved root element.
    pub root_prefix: String,
    pub stylesheet_href: String,
    pub sentinel: SentinelPolicy,
    pub line_removal: LineRemovalPolicy,
    pub defaults: SkeletonDefaults,
}

impl Default for FatturaConfig {
    fn default() -> Self {
        Self {
            namespace_uri: FATTURAPA_NS.into(),
            root_prefix: "p".into(),
            stylesheet_href: DEFAULT_STYLESHEET_HREF.into(),
            sentinel: SentinelPolicy::default(),
            line_removal: LineRemovalPolicy::default(),
            defaults: SkeletonDefaults::default(),
        }
    }
}

#[cfg(feature = "json")]
impl FatturaConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, FatturaError> {
        serde_json::from_str(json).map_err(|e| FatturaError::Config(e.to_string()))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, FatturaError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
