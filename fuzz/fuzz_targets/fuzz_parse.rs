#![no_main]

use fatturapa::core::FatturaConfig;
use fatturapa::document::InvoiceDocument;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        let _ = InvoiceDocument::parse(s, &FatturaConfig::default());
    }
});
