//! Property-based tests for line structure and amount derivation.
//!
//! Run with: `cargo test --test proptest_tests`

#![cfg(feature = "xml")]

use fatturapa::core::*;
use fatturapa::document::schema::paths;
use fatturapa::document::{InvoiceDocument, LineField};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Invoice with one normal line, the contribution line, and a summary block.
const BASE: &str = r#"<p:FatturaElettronica xmlns:p="http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2">
  <FatturaElettronicaBody>
    <DatiGenerali><DatiGeneraliDocumento><ImportoTotaleDocumento>0.00</ImportoTotaleDocumento></DatiGeneraliDocumento></DatiGenerali>
    <DatiBeniServizi>
      <DettaglioLinee>
        <NumeroLinea>1</NumeroLinea>
        <Descrizione>Base</Descrizione>
        <Quantita>1.0000000</Quantita>
        <PrezzoUnitario>0.0000000</PrezzoUnitario>
        <PrezzoTotale>0.0000000</PrezzoTotale>
        <AliquotaIVA>22.00</AliquotaIVA>
      </DettaglioLinee>
      <DettaglioLinee>
        <NumeroLinea>2</NumeroLinea>
        <Descrizione>CONTRIBUTO CONAI ASSOLTO</Descrizione>
        <PrezzoUnitario>0.0000000</PrezzoUnitario>
        <PrezzoTotale>0.0000000</PrezzoTotale>
        <AliquotaIVA>22.00</AliquotaIVA>
      </DettaglioLinee>
      <DatiRiepilogo>
        <AliquotaIVA>22.00</AliquotaIVA>
        <ImponibileImporto>0.00</ImponibileImporto>
        <Imposta>0.00</Imposta>
      </DatiRiepilogo>
    </DatiBeniServizi>
    <DatiPagamento><DettaglioPagamento><ImportoPagamento>0.00</ImportoPagamento></DettaglioPagamento></DatiPagamento>
  </FatturaElettronicaBody>
</p:FatturaElettronica>"#;

#[derive(Debug, Clone)]
enum Edit {
    Insert,
    Remove(usize),
    ToggleSentinel,
    Price(usize, u32),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        Just(Edit::Insert),
        (0usize..8).prop_map(Edit::Remove),
        Just(Edit::ToggleSentinel),
        (0usize..8, 0u32..100_000).prop_map(|(i, cents)| Edit::Price(i, cents)),
    ]
}

fn apply(doc: &mut InvoiceDocument, edit: &Edit) {
    match edit {
        Edit::Insert => {
            doc.insert_line_item().unwrap();
        }
        Edit::Remove(i) => {
            let items = doc.line_items();
            if let Some(item) = items.get(i % items.len().max(1)) {
                // Refusing the last normal line is expected.
                let _ = doc.remove_line_item(*item);
            }
        }
        Edit::ToggleSentinel => {
            if !doc.remove_sentinel_line().unwrap() {
                doc.add_sentinel_line().unwrap();
            }
        }
        Edit::Price(i, cents) => {
            let items = doc.normal_line_items();
            if let Some(item) = items.get(i % items.len().max(1)) {
                let price = format!("{}.{:02}", cents / 100, cents % 100);
                doc.set_line_field(*item, LineField::UnitPrice, &price).unwrap();
            }
        }
    }
}

proptest! {
    #[test]
    fn line_structure_holds_after_any_edits(edits in prop::collection::vec(edit(), 0..20)) {
        let mut doc = InvoiceDocument::parse(BASE, &FatturaConfig::default()).unwrap();
        for e in &edits {
            apply(&mut doc, e);
        }

        let items = doc.line_items();
        let numbers: Vec<String> = items.iter().map(|l| doc.line_fields(*l).line_number).collect();
        let expected: Vec<String> = (1..=items.len()).map(|n| n.to_string()).collect();
        prop_assert_eq!(numbers, expected);

        prop_assert!(!doc.normal_line_items().is_empty());
        if let Some(sentinel) = doc.sentinel_line() {
            prop_assert_eq!(items.last().copied(), Some(sentinel));
        }

        // Amounts on the page always match the line totals.
        let taxable: Decimal = doc.normal_line_totals().into_iter().sum();
        let expected = derive_totals(&[taxable], DEFAULT_VAT_PERCENT).unwrap();
        prop_assert_eq!(doc.text(paths::DOCUMENT_TOTAL), expected.document_total.clone());
        prop_assert_eq!(doc.text(paths::PAYMENT_AMOUNT), expected.document_total);
    }

    #[test]
    fn recompute_is_idempotent(edits in prop::collection::vec(edit(), 0..10)) {
        let mut doc = InvoiceDocument::parse(BASE, &FatturaConfig::default()).unwrap();
        for e in &edits {
            apply(&mut doc, e);
        }
        let first = doc.recompute_totals().unwrap();
        let xml = doc.to_xml().unwrap();
        let second = doc.recompute_totals().unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(doc.to_xml().unwrap(), xml);
    }

    #[test]
    fn canonical_form_has_seven_fraction_digits(
        int_part in "[0-9]{0,20}",
        frac_part in "[0-9]{0,10}",
    ) {
        let input = format!("{int_part}.{frac_part}");
        let out = canonical_decimal(&input, DecimalField::Quantity).unwrap();
        let (i, f) = out.split_once('.').unwrap();
        prop_assert_eq!(f.len(), 7);
        prop_assert!(i.len() <= 15);
        prop_assert!(i == "0" || !i.starts_with('0'));
    }

    #[test]
    fn canonical_form_is_stable(value in 0u64..1_000_000_000, frac in 0u32..10_000_000) {
        let once = canonical_decimal(&format!("{value}.{frac:07}"), DecimalField::UnitPrice).unwrap();
        let twice = canonical_decimal(&once, DecimalField::UnitPrice).unwrap();
        prop_assert_eq!(once, twice);
    }
}
