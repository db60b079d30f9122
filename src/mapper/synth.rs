//! Rebuild an invoice document from stored rows.
//!
//! Only the tabular columns survive storage. Everything else (transmission
//! data, addresses, tax regime, payment terms) comes from
//! [`SkeletonDefaults`], so a stored invoice does not reproduce its original
//! file outside those columns.

use chrono::{Days, NaiveDate};
use log::debug;

use super::rows::{InvoiceRow, LineItemRow, SummaryRow};
use crate::core::{FatturaConfig, SkeletonDefaults};
use crate::document::schema::{LINE_ITEM, SUMMARY_BLOCK, line, summary};
use crate::document::{InvoiceDocument, NodeId};

/// Build a complete document from one invoice's rows.
pub fn synthesize(
    config: &FatturaConfig,
    invoice: &InvoiceRow,
    lines: &[LineItemRow],
    summaries: &[SummaryRow],
) -> InvoiceDocument {
    let defaults = &config.defaults;
    let mut doc = InvoiceDocument::new(config);
    let root = doc.root();
    doc.set_attribute(root, "versione", &defaults.format_version);

    let header = doc.append_element(root, "FatturaElettronicaHeader");
    transmission(&mut doc, header, invoice, defaults);

    let supplier = doc.append_element(header, "CedentePrestatore");
    party(
        &mut doc,
        supplier,
        &invoice.supplier_name,
        &invoice.supplier_vat_id,
        Some(&defaults.tax_regime),
        defaults,
    );
    let customer = doc.append_element(header, "CessionarioCommittente");
    party(
        &mut doc,
        customer,
        &invoice.customer_name,
        &invoice.customer_vat_id,
        None,
        defaults,
    );

    let body = doc.append_element(root, "FatturaElettronicaBody");
    let general = doc.append_element(body, "DatiGenerali");
    let document = doc.append_element(general, "DatiGeneraliDocumento");
    doc.append_text_element(document, "TipoDocumento", or_default(&invoice.document_type, &defaults.document_type));
    doc.append_text_element(document, "Divisa", &defaults.currency);
    doc.append_text_element(document, "Data", &invoice.invoice_date);
    doc.append_text_element(document, "Numero", &invoice.invoice_number);
    doc.append_text_element(document, "ImportoTotaleDocumento", &invoice.total_amount);
    if !invoice.note.is_empty() {
        doc.append_text_element(document, "Causale", &invoice.note);
    }

    let goods = doc.append_element(body, "DatiBeniServizi");
    for row in lines {
        line_item(&mut doc, goods, row);
    }
    for row in summaries {
        summary_block(&mut doc, goods, row, defaults);
    }

    let payment = doc.append_element(body, "DatiPagamento");
    doc.append_text_element(payment, "CondizioniPagamento", &defaults.payment_terms);
    let detail = doc.append_element(payment, "DettaglioPagamento");
    doc.append_text_element(detail, "ModalitaPagamento", &defaults.payment_method);
    match due_date(&invoice.invoice_date, defaults.payment_due_days) {
        Some(due) => {
            doc.append_text_element(detail, "DataScadenzaPagamento", &due);
        }
        None => debug!(
            "invoice date '{}' is not YYYY-MM-DD, omitting due date",
            invoice.invoice_date
        ),
    }
    doc.append_text_element(detail, "ImportoPagamento", &invoice.total_amount);

    doc.renumber_line_items();
    doc
}

fn transmission(doc: &mut InvoiceDocument, header: NodeId, invoice: &InvoiceRow, d: &SkeletonDefaults) {
    let data = doc.append_element(header, "DatiTrasmissione");
    let sender = doc.append_element(data, "IdTrasmittente");
    doc.append_text_element(sender, "IdPaese", &d.country_code);
    doc.append_text_element(sender, "IdCodice", &invoice.supplier_vat_id);
    doc.append_text_element(data, "ProgressivoInvio", &d.progressive_number);
    doc.append_text_element(data, "FormatoTrasmissione", &d.transmission_format);
    doc.append_text_element(data, "CodiceDestinatario", &d.recipient_code);
}

fn party(
    doc: &mut InvoiceDocument,
    parent: NodeId,
    name: &str,
    vat_id: &str,
    tax_regime: Option<&str>,
    d: &SkeletonDefaults,
) {
    let registry = doc.append_element(parent, "DatiAnagrafici");
    let tax_id = doc.append_element(registry, "IdFiscaleIVA");
    doc.append_text_element(tax_id, "IdPaese", &d.country_code);
    doc.append_text_element(tax_id, "IdCodice", vat_id);
    let names = doc.append_element(registry, "Anagrafica");
    doc.append_text_element(names, "Denominazione", name);
    if let Some(regime) = tax_regime {
        doc.append_text_element(registry, "RegimeFiscale", regime);
    }

    let seat = doc.append_element(parent, "Sede");
    doc.append_text_element(seat, "Indirizzo", &d.street);
    doc.append_text_element(seat, "CAP", &d.postal_code);
    doc.append_text_element(seat, "Comune", &d.municipality);
    doc.append_text_element(seat, "Provincia", &d.province);
    doc.append_text_element(seat, "Nazione", &d.country_code);
}

fn line_item(doc: &mut InvoiceDocument, goods: NodeId, row: &LineItemRow) {
    let item = doc.append_element(goods, LINE_ITEM);
    doc.append_text_element(item, line::NUMBER, &row.line_number);
    doc.append_text_element(item, line::DESCRIPTION, &row.description);
    // Optional in the schema; the contribution line has neither.
    if !row.quantity.is_empty() {
        doc.append_text_element(item, line::QUANTITY, &row.quantity);
    }
    if !row.unit_of_measure.is_empty() {
        doc.append_text_element(item, line::UNIT_OF_MEASURE, &row.unit_of_measure);
    }
    doc.append_text_element(item, line::UNIT_PRICE, &row.unit_price);
    doc.append_text_element(item, line::TOTAL_PRICE, &row.total_price);
    doc.append_text_element(item, line::VAT_RATE, &row.vat_rate);
}

fn summary_block(doc: &mut InvoiceDocument, goods: NodeId, row: &SummaryRow, d: &SkeletonDefaults) {
    let block = doc.append_element(goods, SUMMARY_BLOCK);
    doc.append_text_element(block, summary::VAT_RATE, &row.vat_rate);
    if !row.nature.is_empty() {
        doc.append_text_element(block, summary::NATURE, &row.nature);
    }
    doc.append_text_element(block, summary::TAXABLE_AMOUNT, &row.taxable_amount);
    doc.append_text_element(block, summary::TAX_AMOUNT, &row.tax_amount);
    doc.append_text_element(
        block,
        summary::VAT_EXIGIBILITY,
        or_default(&row.vat_exigibility, &d.vat_exigibility),
    );
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}

/// `invoice_date` plus `days`, both as `YYYY-MM-DD`.
fn due_date(invoice_date: &str, days: i64) -> Option<String> {
    let date = NaiveDate::parse_from_str(invoice_date.trim(), "%Y-%m-%d").ok()?;
    let due = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }?;
    Some(due.format("%Y-%m-%d").to_string())
}
