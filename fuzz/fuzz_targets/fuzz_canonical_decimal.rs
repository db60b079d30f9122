#![no_main]

use fatturapa::core::{DecimalField, canonical_decimal};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    for field in [DecimalField::Quantity, DecimalField::UnitPrice, DecimalField::TotalPrice] {
        if let Ok(out) = canonical_decimal(data, field) {
            let again = canonical_decimal(&out, field).expect("canonical output parses");
            assert_eq!(again, out);
        }
    }
});
