use std::sync::Arc;

use fatturapa::core::*;
use fatturapa::document::InvoiceDocument;
use fatturapa::mapper::{InvoiceMapper, XlsxStore};

const SAMPLE: &str = include_str!("../tests/fixtures/IT01234567890_FPR01.xml");

fn main() {
    env_logger::init();
    let config = Arc::new(FatturaConfig::default());

    // Usage: spreadsheet_roundtrip [workbook.xlsx]
    let workbook = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "fatture.xlsx".to_string());

    let doc = InvoiceDocument::parse(SAMPLE, &config).expect("sample should parse");
    let store = XlsxStore::open(&workbook).expect("workbook should open");
    let mut mapper = InvoiceMapper::new(store, config);

    let id = mapper.export(&doc).expect("export should succeed");
    println!("Esportata fattura {id} in {workbook}");

    println!("Fatture presenti:");
    for row in mapper.list_invoices().expect("invoices readable") {
        println!(
            "  {} n. {} del {} ({} EUR) {}",
            row.invoice_id, row.invoice_number, row.invoice_date, row.total_amount, row.supplier_name
        );
    }

    let rebuilt = mapper.import(&id).expect("invoice was just exported");
    let out = format!("{id}.xml");
    rebuilt.save(&out).expect("output should be writable");
    println!("Ricostruita in {out}");
}
