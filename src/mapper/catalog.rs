//! Structural path catalog (`StrutturaXML`).

use std::collections::HashSet;

use super::rows::StructureRow;
use crate::document::schema::{LINE_ITEM, SUMMARY_BLOCK};
use crate::document::{InvoiceDocument, NodeId};

/// Element kinds that repeat; only their first occurrence is walked.
const REPEATABLE: [&str; 2] = [LINE_ITEM, SUMMARY_BLOCK];

/// Catalog of every distinct element and attribute path of `doc`.
///
/// Pre-order, each path once. Line items and summary blocks are recorded
/// under their un-indexed path and only the first occurrence's subtree is
/// walked, so the catalog size does not grow with the number of lines.
/// Namespace declarations are not recorded.
pub fn structure_catalog(doc: &InvoiceDocument) -> Vec<StructureRow> {
    let mut rows = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pending: Vec<(NodeId, String)> = vec![(doc.root(), String::new())];

    while let Some((id, parent_path)) = pending.pop() {
        let tag = doc.local_name(id);
        let path = if parent_path.is_empty() {
            tag.to_string()
        } else {
            format!("{parent_path}/{tag}")
        };

        let first_visit = seen.insert(path.clone());
        if !first_visit && REPEATABLE.contains(&tag) {
            continue;
        }

        if first_visit {
            rows.push(StructureRow {
                tag: tag.to_string(),
                path: path.clone(),
                description: describe(tag).to_string(),
            });
        }

        for (name, _) in doc.attributes(id) {
            if name == "xmlns" || name.starts_with("xmlns:") {
                continue;
            }
            let attr_path = format!("{path}/@{name}");
            if seen.insert(attr_path.clone()) {
                rows.push(StructureRow {
                    tag: format!("@{name}"),
                    path: attr_path,
                    description: format!("Attributo di {tag}"),
                });
            }
        }

        for child in doc.children(id).iter().rev() {
            pending.push((*child, path.clone()));
        }
    }
    rows
}

/// Italian description of a FatturaPA element, empty for unknown tags.
pub fn describe(tag: &str) -> &'static str {
    match tag {
        "FatturaElettronica" => "Documento principale della fattura elettronica",
        "FatturaElettronicaHeader" => "Intestazione della fattura",
        "DatiTrasmissione" => "Dati trasmissione verso SDI",
        "IdTrasmittente" => "Identificativo del trasmittente",
        "IdPaese" => "Codice ISO del paese",
        "IdCodice" => "Codice identificativo fiscale",
        "ProgressivoInvio" => "Numero progressivo di invio",
        "FormatoTrasmissione" => "Formato trasmissione (FPR12, FPA12)",
        "CodiceDestinatario" => "Codice destinatario SDI",
        "CedentePrestatore" => "Fornitore",
        "CessionarioCommittente" => "Cliente",
        "DatiAnagrafici" | "Anagrafica" => "Dati anagrafici",
        "IdFiscaleIVA" => "Identificativo fiscale IVA",
        "CodiceFiscale" => "Codice fiscale",
        "Denominazione" => "Denominazione o ragione sociale",
        "Nome" => "Nome persona fisica",
        "Cognome" => "Cognome persona fisica",
        "RegimeFiscale" => "Regime fiscale",
        "Sede" => "Sede legale o amministrativa",
        "Indirizzo" => "Indirizzo",
        "NumeroCivico" => "Numero civico",
        "CAP" => "Codice Avviamento Postale",
        "Comune" => "Comune",
        "Provincia" => "Provincia (sigla)",
        "Nazione" => "Nazione (codice ISO)",
        "FatturaElettronicaBody" => "Corpo della fattura",
        "DatiGenerali" => "Dati generali del documento",
        "DatiGeneraliDocumento" => "Dati generali documento",
        "TipoDocumento" => "Tipo documento (TD01, TD02, ...)",
        "Divisa" => "Valuta del documento",
        "Data" => "Data del documento",
        "Numero" => "Numero del documento",
        "ImportoTotaleDocumento" => "Importo totale del documento",
        "Causale" => "Causale del documento",
        "DatiBeniServizi" => "Dati relativi ai beni/servizi",
        "DettaglioLinee" => "Dettaglio linee del documento",
        "NumeroLinea" => "Numero progressivo della linea",
        "Descrizione" => "Descrizione della linea",
        "Quantita" => "Quantità",
        "UnitaMisura" => "Unità di misura",
        "PrezzoUnitario" => "Prezzo unitario",
        "PrezzoTotale" => "Prezzo totale",
        "AliquotaIVA" => "Aliquota IVA",
        "Natura" => "Natura dell'operazione",
        "DatiRiepilogo" => "Dati di riepilogo",
        "ImponibileImporto" => "Imponibile",
        "Imposta" => "Imposta",
        "EsigibilitaIVA" => "Esigibilità IVA",
        "DatiPagamento" => "Dati del pagamento",
        "CondizioniPagamento" => "Condizioni di pagamento",
        "DettaglioPagamento" => "Dettaglio del pagamento",
        "ModalitaPagamento" => "Modalità di pagamento",
        "DataScadenzaPagamento" => "Data scadenza pagamento",
        "ImportoPagamento" => "Importo del pagamento",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FatturaConfig;

    fn doc(lines: usize) -> InvoiceDocument {
        let items: String = (1..=lines)
            .map(|n| {
                format!(
                    "<DettaglioLinee><NumeroLinea>{n}</NumeroLinea><Descrizione>L{n}</Descrizione></DettaglioLinee>"
                )
            })
            .collect();
        let xml = format!(
            r#"<p:FatturaElettronica versione="FPR12" xmlns:p="http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2">
<FatturaElettronicaBody><DatiBeniServizi>{items}
<DatiRiepilogo><AliquotaIVA>22.00</AliquotaIVA></DatiRiepilogo>
<DatiRiepilogo><AliquotaIVA>10.00</AliquotaIVA><Natura>N1</Natura></DatiRiepilogo>
</DatiBeniServizi></FatturaElettronicaBody></p:FatturaElettronica>"#
        );
        InvoiceDocument::parse(&xml, &FatturaConfig::default()).unwrap()
    }

    fn paths(rows: &[StructureRow]) -> Vec<&str> {
        rows.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn repeated_lines_recorded_once() {
        let rows = structure_catalog(&doc(5));
        let line_path = "FatturaElettronica/FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee";
        assert_eq!(paths(&rows).iter().filter(|p| **p == line_path).count(), 1);
        assert_eq!(
            paths(&rows)
                .iter()
                .filter(|p| p.starts_with(line_path))
                .count(),
            3
        );
    }

    #[test]
    fn later_summary_blocks_not_descended() {
        let rows = structure_catalog(&doc(1));
        assert!(!paths(&rows).iter().any(|p| p.ends_with("DatiRiepilogo/Natura")));
    }

    #[test]
    fn catalog_size_independent_of_line_count() {
        assert_eq!(structure_catalog(&doc(1)), structure_catalog(&doc(40)));
    }

    #[test]
    fn attributes_without_namespace_declarations() {
        let rows = structure_catalog(&doc(1));
        assert_eq!(rows[0].path, "FatturaElettronica");
        assert_eq!(rows[0].description, "Documento principale della fattura elettronica");
        assert_eq!(rows[1].tag, "@versione");
        assert_eq!(rows[1].path, "FatturaElettronica/@versione");
        assert_eq!(rows[1].description, "Attributo di FatturaElettronica");
        assert!(!rows.iter().any(|r| r.tag.starts_with("@xmlns")));
    }
}
