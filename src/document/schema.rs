//! Element names and paths of the FatturaPA v1.2 schema used by this crate.
//!
//! Paths are relative to the root element and use local names only.

pub const ROOT: &str = "FatturaElettronica";
pub const HEADER: &str = "FatturaElettronicaHeader";
pub const BODY: &str = "FatturaElettronicaBody";

/// Section holding line items and summary blocks (`DatiBeniServizi`).
pub const GOODS_SECTION: &str = "FatturaElettronicaBody/DatiBeniServizi";

pub const LINE_ITEM: &str = "DettaglioLinee";
pub const SUMMARY_BLOCK: &str = "DatiRiepilogo";

/// Child elements of a line item, in schema order.
pub mod line {
    pub const NUMBER: &str = "NumeroLinea";
    pub const DESCRIPTION: &str = "Descrizione";
    pub const QUANTITY: &str = "Quantita";
    pub const UNIT_OF_MEASURE: &str = "UnitaMisura";
    pub const UNIT_PRICE: &str = "PrezzoUnitario";
    pub const TOTAL_PRICE: &str = "PrezzoTotale";
    pub const VAT_RATE: &str = "AliquotaIVA";
}

/// Child elements of a summary block, in schema order.
pub mod summary {
    pub const VAT_RATE: &str = "AliquotaIVA";
    pub const NATURE: &str = "Natura";
    pub const TAXABLE_AMOUNT: &str = "ImponibileImporto";
    pub const TAX_AMOUNT: &str = "Imposta";
    pub const VAT_EXIGIBILITY: &str = "EsigibilitaIVA";
}

/// Single-valued fields addressed by path.
pub mod paths {
    pub const DOCUMENT_TYPE: &str = "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/TipoDocumento";
    pub const CURRENCY: &str = "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Divisa";
    pub const INVOICE_DATE: &str = "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Data";
    pub const INVOICE_NUMBER: &str = "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Numero";
    pub const DOCUMENT_TOTAL: &str =
        "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/ImportoTotaleDocumento";
    pub const NOTE: &str = "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento/Causale";

    pub const SUPPLIER_NAME: &str =
        "FatturaElettronicaHeader/CedentePrestatore/DatiAnagrafici/Anagrafica/Denominazione";
    pub const SUPPLIER_VAT_ID: &str =
        "FatturaElettronicaHeader/CedentePrestatore/DatiAnagrafici/IdFiscaleIVA/IdCodice";
    pub const CUSTOMER_NAME: &str =
        "FatturaElettronicaHeader/CessionarioCommittente/DatiAnagrafici/Anagrafica/Denominazione";
    pub const CUSTOMER_VAT_ID: &str =
        "FatturaElettronicaHeader/CessionarioCommittente/DatiAnagrafici/IdFiscaleIVA/IdCodice";

    pub const PAYMENT_DUE_DATE: &str =
        "FatturaElettronicaBody/DatiPagamento/DettaglioPagamento/DataScadenzaPagamento";
    pub const PAYMENT_AMOUNT: &str =
        "FatturaElettronicaBody/DatiPagamento/DettaglioPagamento/ImportoPagamento";
}
