//! Invoice ⇄ tabular rows.
//!
//! [`InvoiceMapper`] flattens an [`InvoiceDocument`] into four row sets joined
//! by a generated invoice id, appends them to a [`TabularStore`], and rebuilds a
//! fresh document from a stored id.
//!
//! ```
//! use std::sync::Arc;
//! use fatturapa::core::FatturaConfig;
//! use fatturapa::document::InvoiceDocument;
//! use fatturapa::mapper::{InvoiceMapper, MemoryStore};
//!
//! let config = Arc::new(FatturaConfig::default());
//! let doc = InvoiceDocument::parse(
//!     "<FatturaElettronica><FatturaElettronicaBody><DatiGenerali><DatiGeneraliDocumento>\
//!      <Numero>42</Numero></DatiGeneraliDocumento></DatiGenerali></FatturaElettronicaBody>\
//!      </FatturaElettronica>",
//!     &config,
//! )
//! .unwrap();
//!
//! let mut mapper = InvoiceMapper::new(MemoryStore::new(), config);
//! let id = mapper.export(&doc).unwrap();
//! let rebuilt = mapper.import(&id).unwrap();
//! assert_eq!(rebuilt.text("FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Numero"), "42");
//! ```

mod catalog;
mod flatten;
mod rows;
mod store;
mod synth;
#[cfg(feature = "xlsx")]
pub mod xlsx;

pub use catalog::{describe, structure_catalog};
pub use flatten::{invoice_row, line_item_rows, summary_rows};
pub use rows::{InvoiceRow, LineItemRow, StructureRow, SummaryRow, TabularRow};
pub use store::{MemoryStore, Sheet, TabularStore};
pub use synth::synthesize;
#[cfg(feature = "xlsx")]
pub use xlsx::XlsxStore;

use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{FatturaConfig, FatturaError};
use crate::document::InvoiceDocument;

/// Moves invoices between documents and a tabular store.
pub struct InvoiceMapper<S: TabularStore> {
    store: S,
    config: Arc<FatturaConfig>,
}

impl<S: TabularStore> InvoiceMapper<S> {
    pub fn new(store: S, config: Arc<FatturaConfig>) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &FatturaConfig {
        &self.config
    }

    /// Append `doc` to the store under a fresh invoice id and return the id.
    ///
    /// Rows are always appended, never merged with earlier exports. The
    /// structural catalog is written only while its region is still empty.
    /// When writing fails, the rows of this export are taken back out of the
    /// store so a later flush cannot persist them.
    pub fn export(&mut self, doc: &InvoiceDocument) -> Result<String, FatturaError> {
        let invoice_id = Uuid::new_v4().to_string();
        let mut wrote_catalog = false;
        if let Err(e) = self.export_rows(doc, &invoice_id, &mut wrote_catalog) {
            error!("export of invoice {invoice_id} failed: {e}");
            self.discard_export(&invoice_id, wrote_catalog);
            return Err(e);
        }
        info!("exported invoice {invoice_id}");
        Ok(invoice_id)
    }

    fn export_rows(
        &mut self,
        doc: &InvoiceDocument,
        invoice_id: &str,
        wrote_catalog: &mut bool,
    ) -> Result<(), FatturaError> {
        for sheet in Sheet::ALL {
            self.store.ensure_sheet(sheet)?;
        }

        let header = invoice_row(doc, invoice_id);
        self.append(&[header])?;
        self.append(&line_item_rows(doc, invoice_id))?;
        self.append(&summary_rows(doc, invoice_id))?;

        if self.store.rows(Sheet::Structure)?.is_empty() {
            let catalog = structure_catalog(doc);
            info!("writing structure catalog with {} paths", catalog.len());
            *wrote_catalog = !catalog.is_empty();
            self.append(&catalog)?;
        }

        self.store.flush()
    }

    fn discard_export(&mut self, invoice_id: &str, wrote_catalog: bool) {
        for sheet in [Sheet::Invoices, Sheet::LineItems, Sheet::Summaries] {
            if let Err(e) = self.store.retain_rows(sheet, &mut |row: &[String]| {
                row.first().map(String::as_str) != Some(invoice_id)
            }) {
                warn!("could not discard rows of invoice {invoice_id}: {e}");
            }
        }
        if wrote_catalog {
            if let Err(e) = self.store.retain_rows(Sheet::Structure, &mut |_| false) {
                warn!("could not discard structure catalog: {e}");
            }
        }
    }

    fn append<R: TabularRow>(&mut self, rows: &[R]) -> Result<(), FatturaError> {
        if rows.is_empty() {
            return Ok(());
        }
        let records = rows.iter().map(R::to_record).collect();
        self.store.append_rows(R::SHEET, records)
    }

    fn read<R: TabularRow>(&self) -> Result<Vec<R>, FatturaError> {
        Ok(self
            .store
            .rows(R::SHEET)?
            .iter()
            .map(|cells| R::from_record(cells))
            .collect())
    }

    /// Rebuild a document from the rows stored under `invoice_id`.
    ///
    /// Fails with [`FatturaError::InvoiceNotFound`] when no invoice row has
    /// that id. Line and summary rows are taken in storage order.
    pub fn import(&self, invoice_id: &str) -> Result<InvoiceDocument, FatturaError> {
        let invoice = self
            .read::<InvoiceRow>()?
            .into_iter()
            .find(|row| row.invoice_id == invoice_id)
            .ok_or_else(|| FatturaError::InvoiceNotFound(invoice_id.to_string()))?;

        let lines: Vec<LineItemRow> = self
            .read::<LineItemRow>()?
            .into_iter()
            .filter(|row| row.invoice_id == invoice_id)
            .collect();
        let summaries: Vec<SummaryRow> = self
            .read::<SummaryRow>()?
            .into_iter()
            .filter(|row| row.invoice_id == invoice_id)
            .collect();

        info!(
            "importing invoice {invoice_id}: {} lines, {} summary blocks",
            lines.len(),
            summaries.len()
        );
        Ok(synthesize(&self.config, &invoice, &lines, &summaries))
    }

    /// All stored invoices, in storage order.
    pub fn list_invoices(&self) -> Result<Vec<InvoiceRow>, FatturaError> {
        self.read::<InvoiceRow>()
    }

    /// The structural catalog as stored.
    pub fn structure(&self) -> Result<Vec<StructureRow>, FatturaError> {
        self.read::<StructureRow>()
    }

    /// Remove an invoice and its line and summary rows.
    ///
    /// Returns whether an invoice row with that id existed.
    pub fn delete_invoice(&mut self, invoice_id: &str) -> Result<bool, FatturaError> {
        let mut removed_invoice = 0;
        for sheet in [Sheet::Invoices, Sheet::LineItems, Sheet::Summaries] {
            let removed = self
                .store
                .retain_rows(sheet, &mut |row: &[String]| {
                    row.first().map(String::as_str) != Some(invoice_id)
                })
                .inspect_err(|e| error!("delete of invoice {invoice_id} failed: {e}"))?;
            if sheet == Sheet::Invoices {
                removed_invoice = removed;
            }
        }
        self.store
            .flush()
            .inspect_err(|e| error!("delete of invoice {invoice_id} failed: {e}"))?;

        if removed_invoice > 0 {
            info!("deleted invoice {invoice_id}");
        }
        Ok(removed_invoice > 0)
    }

    /// Rebuild the invoice and write it as XML to `path`.
    pub fn write_xml(&self, invoice_id: &str, path: impl AsRef<Path>) -> Result<(), FatturaError> {
        self.import(invoice_id)?.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<p:FatturaElettronica versione="FPR12" xmlns:p="http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2">
  <FatturaElettronicaHeader>
    <CedentePrestatore>
      <DatiAnagrafici>
        <IdFiscaleIVA><IdPaese>IT</IdPaese><IdCodice>01234567890</IdCodice></IdFiscaleIVA>
        <Anagrafica><Denominazione>Alfa Srl</Denominazione></Anagrafica>
      </DatiAnagrafici>
    </CedentePrestatore>
  </FatturaElettronicaHeader>
  <FatturaElettronicaBody>
    <DatiGenerali>
      <DatiGeneraliDocumento>
        <TipoDocumento>TD01</TipoDocumento>
        <Data>2025-03-01</Data>
        <Numero>12</Numero>
        <ImportoTotaleDocumento>12.20</ImportoTotaleDocumento>
      </DatiGeneraliDocumento>
    </DatiGenerali>
    <DatiBeniServizi>
      <DettaglioLinee>
        <NumeroLinea>1</NumeroLinea>
        <Descrizione>Vite</Descrizione>
        <Quantita>10.0000000</Quantita>
        <UnitaMisura>NR</UnitaMisura>
        <PrezzoUnitario>1.0000000</PrezzoUnitario>
        <PrezzoTotale>10.0000000</PrezzoTotale>
        <AliquotaIVA>22.00</AliquotaIVA>
      </DettaglioLinee>
      <DatiRiepilogo>
        <AliquotaIVA>22.00</AliquotaIVA>
        <ImponibileImporto>10.00</ImponibileImporto>
        <Imposta>2.20</Imposta>
        <EsigibilitaIVA>I</EsigibilitaIVA>
      </DatiRiepilogo>
    </DatiBeniServizi>
  </FatturaElettronicaBody>
</p:FatturaElettronica>"#;

    /// Memory store whose next flush can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_flush: bool,
        flushed: Option<MemoryStore>,
    }

    impl TabularStore for FlakyStore {
        fn ensure_sheet(&mut self, sheet: Sheet) -> Result<(), FatturaError> {
            self.inner.ensure_sheet(sheet)
        }

        fn rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, FatturaError> {
            self.inner.rows(sheet)
        }

        fn append_rows(&mut self, sheet: Sheet, rows: Vec<Vec<String>>) -> Result<(), FatturaError> {
            self.inner.append_rows(sheet, rows)
        }

        fn retain_rows(
            &mut self,
            sheet: Sheet,
            keep: &mut dyn FnMut(&[String]) -> bool,
        ) -> Result<usize, FatturaError> {
            self.inner.retain_rows(sheet, keep)
        }

        fn flush(&mut self) -> Result<(), FatturaError> {
            if std::mem::take(&mut self.fail_next_flush) {
                return Err(FatturaError::Storage("disk full".into()));
            }
            self.flushed = Some(self.inner.clone());
            Ok(())
        }
    }

    fn mapper() -> (InvoiceMapper<MemoryStore>, InvoiceDocument) {
        let config = Arc::new(FatturaConfig::default());
        let doc = InvoiceDocument::parse(INVOICE, &config).unwrap();
        (InvoiceMapper::new(MemoryStore::new(), config), doc)
    }

    #[test]
    fn export_fills_all_regions() {
        let (mut mapper, doc) = mapper();
        let id = mapper.export(&doc).unwrap();
        let store = mapper.store();
        for sheet in Sheet::ALL {
            assert!(store.has_sheet(sheet));
        }
        let invoices = mapper.list_invoices().unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].invoice_id, id);
        assert_eq!(invoices[0].invoice_number, "12");
        assert_eq!(invoices[0].supplier_vat_id, "01234567890");
        assert_eq!(invoices[0].customer_name, "");
        assert_eq!(store.rows(Sheet::LineItems).unwrap().len(), 1);
        assert_eq!(store.rows(Sheet::Summaries).unwrap().len(), 1);
        assert!(!mapper.structure().unwrap().is_empty());
    }

    #[test]
    fn exports_append_with_distinct_ids() {
        let (mut mapper, doc) = mapper();
        let a = mapper.export(&doc).unwrap();
        let catalog_len = mapper.structure().unwrap().len();
        let b = mapper.export(&doc).unwrap();
        assert_ne!(a, b);
        assert_eq!(mapper.list_invoices().unwrap().len(), 2);
        assert_eq!(mapper.store().rows(Sheet::LineItems).unwrap().len(), 2);
        assert_eq!(mapper.structure().unwrap().len(), catalog_len);
    }

    #[test]
    fn failed_first_export_leaves_nothing_behind() {
        let (_, doc) = mapper();
        let store = FlakyStore {
            fail_next_flush: true,
            ..Default::default()
        };
        let mut mapper = InvoiceMapper::new(store, Arc::new(FatturaConfig::default()));

        assert!(matches!(mapper.export(&doc), Err(FatturaError::Storage(_))));
        for sheet in Sheet::ALL {
            assert!(mapper.store().rows(sheet).unwrap().is_empty(), "{}", sheet.name());
        }

        let id = mapper.export(&doc).unwrap();
        let saved = mapper.store().flushed.clone().unwrap();
        assert_eq!(saved.rows(Sheet::Invoices).unwrap().len(), 1);
        assert_eq!(saved.rows(Sheet::Invoices).unwrap()[0][0], id);
        assert_eq!(saved.rows(Sheet::LineItems).unwrap().len(), 1);
        assert!(!saved.rows(Sheet::Structure).unwrap().is_empty());
    }

    #[test]
    fn failed_export_keeps_earlier_invoices() {
        let (_, doc) = mapper();
        let mut mapper =
            InvoiceMapper::new(FlakyStore::default(), Arc::new(FatturaConfig::default()));
        let first = mapper.export(&doc).unwrap();
        let catalog = mapper.structure().unwrap();

        mapper.store_mut().fail_next_flush = true;
        assert!(mapper.export(&doc).is_err());

        let ids: Vec<String> = mapper
            .list_invoices()
            .unwrap()
            .into_iter()
            .map(|r| r.invoice_id)
            .collect();
        assert_eq!(ids, vec![first]);
        assert_eq!(mapper.store().rows(Sheet::LineItems).unwrap().len(), 1);
        assert_eq!(mapper.structure().unwrap(), catalog);
    }

    #[test]
    fn import_unknown_id_fails() {
        let (mapper, _) = mapper();
        assert!(matches!(
            mapper.import("missing"),
            Err(FatturaError::InvoiceNotFound(_))
        ));
    }

    #[test]
    fn delete_removes_only_that_invoice() {
        let (mut mapper, doc) = mapper();
        let a = mapper.export(&doc).unwrap();
        let b = mapper.export(&doc).unwrap();
        assert!(mapper.delete_invoice(&a).unwrap());
        assert!(!mapper.delete_invoice(&a).unwrap());

        let remaining: Vec<String> = mapper
            .list_invoices()
            .unwrap()
            .into_iter()
            .map(|r| r.invoice_id)
            .collect();
        assert_eq!(remaining, vec![b.clone()]);
        let lines = mapper.store().rows(Sheet::LineItems).unwrap();
        assert!(lines.iter().all(|r| r[0] == b));
        assert!(mapper.import(&b).is_ok());
    }
}
