use serde::{Deserialize, Serialize};

use super::store::Sheet;

/// A row type stored in one tabular region.
pub trait TabularRow: Sized {
    const SHEET: Sheet;

    /// Cells in header order.
    fn to_record(&self) -> Vec<String>;

    /// Build from cells in header order; missing trailing cells read as empty.
    fn from_record(cells: &[String]) -> Self;
}

fn cell(cells: &[String], i: usize) -> String {
    cells.get(i).cloned().unwrap_or_default()
}

/// Header fields of one invoice (`Fatture` region).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub invoice_id: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub document_type: String,
    pub total_amount: String,
    pub supplier_name: String,
    pub supplier_vat_id: String,
    pub customer_name: String,
    pub customer_vat_id: String,
    /// `Causale`
    pub note: String,
}

impl TabularRow for InvoiceRow {
    const SHEET: Sheet = Sheet::Invoices;

    fn to_record(&self) -> Vec<String> {
        vec![
            self.invoice_id.clone(),
            self.invoice_number.clone(),
            self.invoice_date.clone(),
            self.document_type.clone(),
            self.total_amount.clone(),
            self.supplier_name.clone(),
            self.supplier_vat_id.clone(),
            self.customer_name.clone(),
            self.customer_vat_id.clone(),
            self.note.clone(),
        ]
    }

    fn from_record(cells: &[String]) -> Self {
        Self {
            invoice_id: cell(cells, 0),
            invoice_number: cell(cells, 1),
            invoice_date: cell(cells, 2),
            document_type: cell(cells, 3),
            total_amount: cell(cells, 4),
            supplier_name: cell(cells, 5),
            supplier_vat_id: cell(cells, 6),
            customer_name: cell(cells, 7),
            customer_vat_id: cell(cells, 8),
            note: cell(cells, 9),
        }
    }
}

/// One `DettaglioLinee`, tagged with its invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRow {
    pub invoice_id: String,
    pub line_number: String,
    pub description: String,
    pub quantity: String,
    pub unit_of_measure: String,
    pub unit_price: String,
    pub total_price: String,
    pub vat_rate: String,
}

impl TabularRow for LineItemRow {
    const SHEET: Sheet = Sheet::LineItems;

    fn to_record(&self) -> Vec<String> {
        vec![
            self.invoice_id.clone(),
            self.line_number.clone(),
            self.description.clone(),
            self.quantity.clone(),
            self.unit_of_measure.clone(),
            self.unit_price.clone(),
            self.total_price.clone(),
            self.vat_rate.clone(),
        ]
    }

    fn from_record(cells: &[String]) -> Self {
        Self {
            invoice_id: cell(cells, 0),
            line_number: cell(cells, 1),
            description: cell(cells, 2),
            quantity: cell(cells, 3),
            unit_of_measure: cell(cells, 4),
            unit_price: cell(cells, 5),
            total_price: cell(cells, 6),
            vat_rate: cell(cells, 7),
        }
    }
}

/// One `DatiRiepilogo`, tagged with its invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub invoice_id: String,
    pub vat_rate: String,
    pub taxable_amount: String,
    pub tax_amount: String,
    pub vat_exigibility: String,
    /// `Natura`, the exemption nature code.
    pub nature: String,
}

impl TabularRow for SummaryRow {
    const SHEET: Sheet = Sheet::Summaries;

    fn to_record(&self) -> Vec<String> {
        vec![
            self.invoice_id.clone(),
            self.vat_rate.clone(),
            self.taxable_amount.clone(),
            self.tax_amount.clone(),
            self.vat_exigibility.clone(),
            self.nature.clone(),
        ]
    }

    fn from_record(cells: &[String]) -> Self {
        Self {
            invoice_id: cell(cells, 0),
            vat_rate: cell(cells, 1),
            taxable_amount: cell(cells, 2),
            tax_amount: cell(cells, 3),
            vat_exigibility: cell(cells, 4),
            nature: cell(cells, 5),
        }
    }
}

/// Catalog entry of a structural path (`StrutturaXML` region).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRow {
    /// Local element name, or `@name` for an attribute.
    pub tag: String,
    pub path: String,
    pub description: String,
}

impl TabularRow for StructureRow {
    const SHEET: Sheet = Sheet::Structure;

    fn to_record(&self) -> Vec<String> {
        vec![self.tag.clone(), self.path.clone(), self.description.clone()]
    }

    fn from_record(cells: &[String]) -> Self {
        Self {
            tag: cell(cells, 0),
            path: cell(cells, 1),
            description: cell(cells, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_follow_headers() {
        assert_eq!(InvoiceRow::default().to_record().len(), Sheet::Invoices.header().len());
        assert_eq!(LineItemRow::default().to_record().len(), Sheet::LineItems.header().len());
        assert_eq!(SummaryRow::default().to_record().len(), Sheet::Summaries.header().len());
        assert_eq!(StructureRow::default().to_record().len(), Sheet::Structure.header().len());
    }

    #[test]
    fn short_records_pad_with_empty() {
        let row = SummaryRow::from_record(&["abc".to_string(), "22.00".to_string()]);
        assert_eq!(row.invoice_id, "abc");
        assert_eq!(row.vat_rate, "22.00");
        assert_eq!(row.nature, "");
    }
}
