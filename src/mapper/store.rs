use std::collections::BTreeMap;

use crate::core::FatturaError;

/// The four named regions of an invoice store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sheet {
    /// `Fatture`: one row per invoice.
    Invoices,
    /// `DettaglioLinee`: one row per line item.
    LineItems,
    /// `DatiRiepilogo`: one row per summary block.
    Summaries,
    /// `StrutturaXML`: structural path catalog.
    Structure,
}

impl Sheet {
    pub const ALL: [Sheet; 4] = [
        Sheet::Invoices,
        Sheet::LineItems,
        Sheet::Summaries,
        Sheet::Structure,
    ];

    /// Region name as it appears in the store.
    pub fn name(self) -> &'static str {
        match self {
            Sheet::Invoices => "Fatture",
            Sheet::LineItems => "DettaglioLinee",
            Sheet::Summaries => "DatiRiepilogo",
            Sheet::Structure => "StrutturaXML",
        }
    }

    pub fn from_name(name: &str) -> Option<Sheet> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Header row written when the region is created.
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Sheet::Invoices => &[
                "ID_Fattura",
                "NumeroFattura",
                "DataFattura",
                "TipoDocumento",
                "ImportoTotale",
                "CedenteDenominazione",
                "CedentePartitaIVA",
                "CessionarioDenominazione",
                "CessionarioPartitaIVA",
                "NotaFattura",
            ],
            Sheet::LineItems => &[
                "ID_Fattura",
                "NumeroLinea",
                "Descrizione",
                "Quantita",
                "UnitaMisura",
                "PrezzoUnitario",
                "PrezzoTotale",
                "AliquotaIVA",
            ],
            Sheet::Summaries => &[
                "ID_Fattura",
                "AliquotaIVA",
                "ImponibileImporto",
                "Imposta",
                "EsigibilitaIVA",
                "Natura",
            ],
            Sheet::Structure => &["TagXML", "Percorso", "Descrizione"],
        }
    }
}

/// Persistent tabular storage for flattened invoices.
///
/// Rows are plain text cells in header order. Header rows are managed by the
/// store and never returned by [`rows`](TabularStore::rows).
pub trait TabularStore {
    /// Create the region with its header row if it does not exist yet.
    fn ensure_sheet(&mut self, sheet: Sheet) -> Result<(), FatturaError>;

    /// Data rows of a region in storage order; empty when the region is absent.
    fn rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, FatturaError>;

    /// Append rows after the existing ones. The region must exist.
    fn append_rows(&mut self, sheet: Sheet, rows: Vec<Vec<String>>) -> Result<(), FatturaError>;

    /// Keep only the rows for which `keep` returns true. Returns how many were removed.
    fn retain_rows(
        &mut self,
        sheet: Sheet,
        keep: &mut dyn FnMut(&[String]) -> bool,
    ) -> Result<usize, FatturaError>;

    /// Persist pending changes.
    fn flush(&mut self) -> Result<(), FatturaError>;
}

/// In-memory store. `flush` is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sheets: BTreeMap<Sheet, Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_sheet(&self, sheet: Sheet) -> bool {
        self.sheets.contains_key(&sheet)
    }

    /// Regions present, with their data rows.
    pub fn sheets(&self) -> impl Iterator<Item = (Sheet, &[Vec<String>])> {
        self.sheets.iter().map(|(s, rows)| (*s, rows.as_slice()))
    }

    pub(crate) fn insert_sheet(&mut self, sheet: Sheet, rows: Vec<Vec<String>>) {
        self.sheets.insert(sheet, rows);
    }
}

impl TabularStore for MemoryStore {
    fn ensure_sheet(&mut self, sheet: Sheet) -> Result<(), FatturaError> {
        self.sheets.entry(sheet).or_default();
        Ok(())
    }

    fn rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, FatturaError> {
        Ok(self.sheets.get(&sheet).cloned().unwrap_or_default())
    }

    fn append_rows(&mut self, sheet: Sheet, rows: Vec<Vec<String>>) -> Result<(), FatturaError> {
        let existing = self
            .sheets
            .get_mut(&sheet)
            .ok_or_else(|| FatturaError::Storage(format!("sheet '{}' does not exist", sheet.name())))?;
        existing.extend(rows);
        Ok(())
    }

    fn retain_rows(
        &mut self,
        sheet: Sheet,
        keep: &mut dyn FnMut(&[String]) -> bool,
    ) -> Result<usize, FatturaError> {
        let Some(rows) = self.sheets.get_mut(&sheet) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| keep(row));
        Ok(before - rows.len())
    }

    fn flush(&mut self) -> Result<(), FatturaError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn sheet_names_round_trip() {
        for sheet in Sheet::ALL {
            assert_eq!(Sheet::from_name(sheet.name()), Some(sheet));
        }
        assert_eq!(Sheet::from_name("Foglio1"), None);
    }

    #[test]
    fn append_requires_sheet() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.append_rows(Sheet::Invoices, vec![row(&["a"])]),
            Err(FatturaError::Storage(_))
        ));
        store.ensure_sheet(Sheet::Invoices).unwrap();
        store.append_rows(Sheet::Invoices, vec![row(&["a"]), row(&["b"])]).unwrap();
        assert_eq!(store.rows(Sheet::Invoices).unwrap().len(), 2);
    }

    #[test]
    fn ensure_sheet_keeps_rows() {
        let mut store = MemoryStore::new();
        store.ensure_sheet(Sheet::LineItems).unwrap();
        store.append_rows(Sheet::LineItems, vec![row(&["a"])]).unwrap();
        store.ensure_sheet(Sheet::LineItems).unwrap();
        assert_eq!(store.rows(Sheet::LineItems).unwrap(), vec![row(&["a"])]);
    }

    #[test]
    fn retain_counts_removed() {
        let mut store = MemoryStore::new();
        store.ensure_sheet(Sheet::Summaries).unwrap();
        store
            .append_rows(Sheet::Summaries, vec![row(&["x"]), row(&["y"]), row(&["x"])])
            .unwrap();
        let removed = store
            .retain_rows(Sheet::Summaries, &mut |r| r[0] != "x")
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.rows(Sheet::Summaries).unwrap(), vec![row(&["y"])]);
        assert_eq!(store.retain_rows(Sheet::Structure, &mut |_| false).unwrap(), 0);
    }
}
