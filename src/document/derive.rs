use log::{debug, warn};
use rust_decimal::Decimal;

use super::schema::{line, paths, summary};
use super::InvoiceDocument;
use crate::core::{DEFAULT_VAT_PERCENT, DerivedTotals, FatturaError, derive_totals, parse_decimal};

impl InvoiceDocument {
    /// Rate applied to the line totals: the first summary block's
    /// `AliquotaIVA`, or 22% when it is missing, not a number, or outside
    /// `0..=100`.
    pub fn summary_vat_percent(&self) -> Decimal {
        let stored = self
            .summary_blocks()
            .first()
            .and_then(|block| self.child(*block, summary::VAT_RATE))
            .map(|id| self.text_of(id).trim().to_string())
            .unwrap_or_default();

        if stored.is_empty() {
            return DEFAULT_VAT_PERCENT;
        }
        match parse_decimal(&stored) {
            Ok(rate) if rate >= Decimal::ZERO && rate <= Decimal::ONE_HUNDRED => rate,
            _ => {
                warn!("summary AliquotaIVA '{stored}' is not a usable rate, using {DEFAULT_VAT_PERCENT}%");
                DEFAULT_VAT_PERCENT
            }
        }
    }

    /// `PrezzoTotale` of every normal line. Empty totals are skipped and
    /// unparseable ones are skipped with a warning.
    pub fn normal_line_totals(&self) -> Vec<Decimal> {
        let mut totals = Vec::new();
        for item in self.normal_line_items() {
            let Some(node) = self.child(item, line::TOTAL_PRICE) else {
                continue;
            };
            let text = self.text_of(node).trim();
            if text.is_empty() {
                continue;
            }
            match parse_decimal(text) {
                Ok(value) => totals.push(value),
                Err(_) => warn!("skipping line total '{text}' that is not a number"),
            }
        }
        totals
    }

    /// Re-derive the document amounts from the normal line totals.
    ///
    /// Writes `ImponibileImporto` and `Imposta` of the first summary block,
    /// `ImportoTotaleDocumento`, and `ImportoPagamento`. Targets that are
    /// absent are left absent. Running it twice gives the same document.
    ///
    /// Fails with [`FatturaError::InvalidNumber`] when the amounts overflow;
    /// nothing is written in that case.
    pub fn recompute_totals(&mut self) -> Result<DerivedTotals, FatturaError> {
        let totals = derive_totals(&self.normal_line_totals(), self.summary_vat_percent())?;

        if let Some(block) = self.summary_blocks().first().copied() {
            let taxable = self.child(block, summary::TAXABLE_AMOUNT);
            self.set_text(taxable, &totals.taxable_amount);
            let tax = self.child(block, summary::TAX_AMOUNT);
            self.set_text(tax, &totals.tax_amount);
        }
        let document_total = self.resolve(paths::DOCUMENT_TOTAL).node;
        self.set_text(document_total, &totals.document_total);
        let payment = self.resolve(paths::PAYMENT_AMOUNT).node;
        self.set_text(payment, &totals.payment_amount);

        debug!(
            "derived totals: taxable {} tax {} total {}",
            totals.taxable_amount, totals.tax_amount, totals.document_total
        );
        Ok(totals)
    }

    /// [`recompute_totals`](Self::recompute_totals) after a structural edit.
    /// Amounts that cannot be derived are left as they were.
    pub(crate) fn refresh_totals(&mut self) {
        if let Err(e) = self.recompute_totals() {
            warn!("document totals not updated: {e}");
        }
    }
}
