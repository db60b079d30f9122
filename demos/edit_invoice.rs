use fatturapa::core::*;
use fatturapa::document::schema::paths;
use fatturapa::document::{InvoiceDocument, LineField};

const SAMPLE: &str = include_str!("../tests/fixtures/IT01234567890_FPR01.xml");

fn main() {
    env_logger::init();
    let config = FatturaConfig::default();

    // Usage: edit_invoice [input.xml [output.xml]]
    let mut args = std::env::args().skip(1);
    let mut doc = match args.next() {
        Some(path) => InvoiceDocument::open(&path, &config).expect("invoice should load"),
        None => InvoiceDocument::parse(SAMPLE, &config).expect("sample should parse"),
    };

    println!(
        "Fattura {} del {}: {} righe, totale {}",
        doc.text(paths::INVOICE_NUMBER),
        doc.text(paths::INVOICE_DATE),
        doc.normal_line_items().len(),
        doc.text(paths::DOCUMENT_TOTAL)
    );

    // Add a line, price it, and let the totals follow.
    let item = doc.insert_line_item().expect("invoice has DatiBeniServizi");
    doc.set_line_field(item, LineField::Description, "Assistenza remota")
        .expect("description is text");
    doc.set_line_field(item, LineField::Quantity, "4")
        .expect("valid quantity");
    doc.set_line_field(item, LineField::UnitPrice, "35,50")
        .expect("valid price");

    for line in doc.line_items() {
        let f = doc.line_fields(line);
        println!(
            "  {:>2} {:<30} {:>14} x {:>14} = {:>14} ({}%)",
            f.line_number, f.description, f.quantity, f.unit_price, f.total_price, f.vat_rate
        );
    }
    println!("Nuovo totale documento: {}", doc.text(paths::DOCUMENT_TOTAL));

    match args.next() {
        Some(out) => {
            doc.save(&out).expect("output should be writable");
            println!("Salvato in {out}");
        }
        None => print!("{}", doc.to_xml().expect("document serializes")),
    }
}
