use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::FatturaError;
use super::numeric::format_amount;

/// Rate used when the summary block carries no usable `AliquotaIVA`.
pub const DEFAULT_VAT_PERCENT: Decimal = Decimal::from_parts(22, 0, 0, false, 0);

/// Document-level amounts derived from the line items, formatted for the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedTotals {
    /// `ImponibileImporto`
    pub taxable_amount: String,
    /// `Imposta`
    pub tax_amount: String,
    /// `ImportoTotaleDocumento`
    pub document_total: String,
    /// `ImportoPagamento`, always equal to the document total.
    pub payment_amount: String,
}

/// Derive taxable, tax, and document totals from normal-line totals.
///
/// Each figure is computed from the unrounded previous one and only rounded
/// when formatted. Sums that do not fit a [`Decimal`] fail with
/// [`FatturaError::InvalidNumber`].
///
/// ```
/// use fatturapa::core::derive_totals;
/// use rust_decimal_macros::dec;
///
/// let t = derive_totals(&[dec!(10), dec!(5.5)], dec!(22)).unwrap();
/// assert_eq!(t.taxable_amount, "15.50");
/// assert_eq!(t.tax_amount, "3.41");
/// assert_eq!(t.document_total, "18.91");
/// ```
pub fn derive_totals(
    line_totals: &[Decimal],
    vat_percent: Decimal,
) -> Result<DerivedTotals, FatturaError> {
    let overflow = |what: &str| FatturaError::InvalidNumber(format!("{what} overflows"));

    let taxable = line_totals
        .iter()
        .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(*t))
        .ok_or_else(|| overflow("taxable amount"))?;
    let tax = taxable
        .checked_mul(vat_percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| overflow("tax amount"))?;
    let total = taxable
        .checked_add(tax)
        .ok_or_else(|| overflow("document total"))?;
    let document_total = format_amount(total);

    Ok(DerivedTotals {
        taxable_amount: format_amount(taxable),
        tax_amount: format_amount(tax),
        payment_amount: document_total.clone(),
        document_total,
    })
}
