use super::rows::{InvoiceRow, LineItemRow, SummaryRow};
use crate::document::InvoiceDocument;
use crate::document::schema::{paths, summary};

/// Header fields of `doc`. Each lookup is independent; missing fields are empty.
pub fn invoice_row(doc: &InvoiceDocument, invoice_id: &str) -> InvoiceRow {
    InvoiceRow {
        invoice_id: invoice_id.to_string(),
        invoice_number: doc.text(paths::INVOICE_NUMBER),
        invoice_date: doc.text(paths::INVOICE_DATE),
        document_type: doc.text(paths::DOCUMENT_TYPE),
        total_amount: doc.text(paths::DOCUMENT_TOTAL),
        supplier_name: doc.text(paths::SUPPLIER_NAME),
        supplier_vat_id: doc.text(paths::SUPPLIER_VAT_ID),
        customer_name: doc.text(paths::CUSTOMER_NAME),
        customer_vat_id: doc.text(paths::CUSTOMER_VAT_ID),
        note: doc.text(paths::NOTE),
    }
}

/// One row per line item, contribution line included, in document order.
pub fn line_item_rows(doc: &InvoiceDocument, invoice_id: &str) -> Vec<LineItemRow> {
    doc.line_items()
        .into_iter()
        .map(|item| {
            let f = doc.line_fields(item);
            LineItemRow {
                invoice_id: invoice_id.to_string(),
                line_number: f.line_number,
                description: f.description,
                quantity: f.quantity,
                unit_of_measure: f.unit_of_measure,
                unit_price: f.unit_price,
                total_price: f.total_price,
                vat_rate: f.vat_rate,
            }
        })
        .collect()
}

/// One row per summary block, in document order.
pub fn summary_rows(doc: &InvoiceDocument, invoice_id: &str) -> Vec<SummaryRow> {
    doc.summary_blocks()
        .into_iter()
        .map(|block| {
            let get = |name: &str| {
                doc.child(block, name)
                    .map(|id| doc.text_of(id).to_string())
                    .unwrap_or_default()
            };
            SummaryRow {
                invoice_id: invoice_id.to_string(),
                vat_rate: get(summary::VAT_RATE),
                taxable_amount: get(summary::TAXABLE_AMOUNT),
                tax_amount: get(summary::TAX_AMOUNT),
                vat_exigibility: get(summary::VAT_EXIGIBILITY),
                nature: get(summary::NATURE),
            }
        })
        .collect()
}
