#![no_main]

use fatturapa::core::FatturaConfig;
use fatturapa::document::InvoiceDocument;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let config = FatturaConfig::default();
    let Ok(mut doc) = InvoiceDocument::parse(s, &config) else {
        return;
    };
    let _ = doc.insert_line_item();
    let _ = doc.add_sentinel_line();
    let _ = doc.recompute_totals();

    // Whatever we write must load again.
    let xml = doc.to_xml().expect("loaded document serializes");
    let reloaded = InvoiceDocument::parse(&xml, &config).expect("serialized document parses");
    assert_eq!(reloaded.line_items().len(), doc.line_items().len());
});
