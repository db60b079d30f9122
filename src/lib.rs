//! # fatturapa
//!
//! Library core for viewing, editing, and round-tripping Italian electronic
//! invoices (FatturaPA v1.2) and for keeping many invoices in a spreadsheet.
//!
//! Amounts are derived with [`rust_decimal::Decimal`], never floating point,
//! and written back as the fixed-precision text the schema requires.
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "xml")] {
//! use fatturapa::core::FatturaConfig;
//! use fatturapa::document::InvoiceDocument;
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <p:FatturaElettronica versione="FPR12" xmlns:p="http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2">
//!   <FatturaElettronicaBody>
//!     <DatiBeniServizi>
//!       <DettaglioLinee>
//!         <NumeroLinea>1</NumeroLinea>
//!         <Descrizione>Consulenza</Descrizione>
//!         <Quantita>2.0000000</Quantita>
//!         <PrezzoUnitario>50.0000000</PrezzoUnitario>
//!         <PrezzoTotale>100.0000000</PrezzoTotale>
//!         <AliquotaIVA>22.00</AliquotaIVA>
//!       </DettaglioLinee>
//!       <DatiRiepilogo>
//!         <AliquotaIVA>22.00</AliquotaIVA>
//!         <ImponibileImporto>0.00</ImponibileImporto>
//!         <Imposta>0.00</Imposta>
//!       </DatiRiepilogo>
//!     </DatiBeniServizi>
//!   </FatturaElettronicaBody>
//! </p:FatturaElettronica>"#;
//!
//! let config = FatturaConfig::default();
//! let mut doc = InvoiceDocument::parse(xml, &config).unwrap();
//! let totals = doc.recompute_totals().unwrap();
//! assert_eq!(totals.tax_amount, "22.00");
//! assert_eq!(doc.text("FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo/ImponibileImporto"), "100.00");
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Errors, configuration, VAT rates, decimal formatting, totals |
//! | `xml` (default) | FatturaPA document model: parse, edit, derive, save |
//! | `json` | Load [`core::FatturaConfig`] from JSON |
//! | `mapper` | Invoice ⇄ tabular rows, in-memory store |
//! | `xlsx` | Spreadsheet (`.xlsx`) store |
//! | `comuni` | Italian municipality lookup table |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod document;

#[cfg(feature = "mapper")]
pub mod mapper;

#[cfg(feature = "comuni")]
pub mod comuni;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
