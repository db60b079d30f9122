//! Line-item structure: insertion, removal, numbering, and the contribution line.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::schema::{self, line};
use super::{InvoiceDocument, NodeId};
use crate::core::{
    DecimalField, FatturaError, LineRemovalPolicy, SENTINEL_DESCRIPTION, VatRate,
    canonical_decimal, line_total,
};

/// Defaults for a freshly inserted line item.
const NEW_LINE_DESCRIPTION: &str = "Nuovo articolo";
const NEW_LINE_QUANTITY: &str = "1.0000000";
const NEW_LINE_UNIT: &str = "NR";
const ZERO_PRICE: &str = "0.0000000";

/// Editable fields of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineField {
    Number,
    Description,
    Quantity,
    UnitOfMeasure,
    UnitPrice,
    TotalPrice,
    VatRate,
}

impl LineField {
    /// Element name of this field inside `DettaglioLinee`.
    pub fn element_name(self) -> &'static str {
        match self {
            LineField::Number => line::NUMBER,
            LineField::Description => line::DESCRIPTION,
            LineField::Quantity => line::QUANTITY,
            LineField::UnitOfMeasure => line::UNIT_OF_MEASURE,
            LineField::UnitPrice => line::UNIT_PRICE,
            LineField::TotalPrice => line::TOTAL_PRICE,
            LineField::VatRate => line::VAT_RATE,
        }
    }

    fn decimal_field(self) -> Option<DecimalField> {
        match self {
            LineField::Quantity => Some(DecimalField::Quantity),
            LineField::UnitPrice => Some(DecimalField::UnitPrice),
            LineField::TotalPrice => Some(DecimalField::TotalPrice),
            _ => None,
        }
    }
}

/// Text of every field of one line item; missing elements read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineFields {
    pub line_number: String,
    pub description: String,
    pub quantity: String,
    pub unit_of_measure: String,
    pub unit_price: String,
    pub total_price: String,
    pub vat_rate: String,
}

impl InvoiceDocument {
    /// The `DatiBeniServizi` section of the first body, if present.
    pub fn goods_section(&self) -> Option<NodeId> {
        self.resolve(schema::GOODS_SECTION).node
    }

    fn require_goods_section(&self) -> Result<NodeId, FatturaError> {
        self.goods_section()
            .ok_or_else(|| FatturaError::AncestorNotFound(schema::GOODS_SECTION.to_string()))
    }

    /// All line items, contribution line included, in document order.
    pub fn line_items(&self) -> Vec<NodeId> {
        match self.goods_section() {
            Some(section) => self.children_named(section, schema::LINE_ITEM),
            None => Vec::new(),
        }
    }

    /// Summary blocks (`DatiRiepilogo`), in document order.
    pub fn summary_blocks(&self) -> Vec<NodeId> {
        match self.goods_section() {
            Some(section) => self.children_named(section, schema::SUMMARY_BLOCK),
            None => Vec::new(),
        }
    }

    /// Whether a line item is the contribution line under the configured policy.
    pub fn is_sentinel(&self, item: NodeId) -> bool {
        let description = self
            .child(item, line::DESCRIPTION)
            .map(|d| self.text_of(d))
            .unwrap_or("");
        self.config().sentinel.matches(description)
    }

    /// Line items other than the contribution line.
    pub fn normal_line_items(&self) -> Vec<NodeId> {
        self.line_items()
            .into_iter()
            .filter(|item| !self.is_sentinel(*item))
            .collect()
    }

    /// The contribution line, if the document has one.
    pub fn sentinel_line(&self) -> Option<NodeId> {
        self.line_items()
            .into_iter()
            .find(|item| self.is_sentinel(*item))
    }

    /// Read the fields of a line item.
    pub fn line_fields(&self, item: NodeId) -> LineFields {
        let get = |field: LineField| {
            self.child(item, field.element_name())
                .map(|id| self.text_of(id).to_string())
                .unwrap_or_default()
        };
        LineFields {
            line_number: get(LineField::Number),
            description: get(LineField::Description),
            quantity: get(LineField::Quantity),
            unit_of_measure: get(LineField::UnitOfMeasure),
            unit_price: get(LineField::UnitPrice),
            total_price: get(LineField::TotalPrice),
            vat_rate: get(LineField::VatRate),
        }
    }

    /// Edit one field of a line item and re-derive dependent amounts.
    ///
    /// Numeric fields are stored in canonical form; input that is not a
    /// number is rejected with [`FatturaError::InvalidNumber`]. `AliquotaIVA`
    /// is snapped to the nearest allowed rate. Editing quantity or unit price
    /// recomputes the line total; any numeric edit recomputes the document
    /// totals. A field whose element is absent from the line is left alone.
    ///
    /// On error the document is unchanged, including when the new line total
    /// or document totals overflow.
    pub fn set_line_field(
        &mut self,
        item: NodeId,
        field: LineField,
        value: &str,
    ) -> Result<(), FatturaError> {
        let text = match field {
            LineField::VatRate => VatRate::nearest(value).as_str().to_string(),
            _ => match field.decimal_field() {
                Some(decimal) => canonical_decimal(value, decimal)?,
                None => value.to_string(),
            },
        };

        let Some(node) = self.child(item, field.element_name()) else {
            debug!("line has no <{}>, edit ignored", field.element_name());
            return Ok(());
        };

        let derived = matches!(
            field,
            LineField::Quantity | LineField::UnitPrice | LineField::TotalPrice
        );
        if !derived {
            self.set_text(Some(node), &text);
            return Ok(());
        }

        // Work out the new line total before anything is written.
        let total_node = self.child(item, line::TOTAL_PRICE);
        let old_total = total_node.map(|id| self.text_of(id).to_string());
        let new_total = match field {
            LineField::Quantity | LineField::UnitPrice => {
                let fields = self.line_fields(item);
                let (quantity, unit_price) = if field == LineField::Quantity {
                    (text.as_str(), fields.unit_price.as_str())
                } else {
                    (fields.quantity.as_str(), text.as_str())
                };
                match total_node {
                    Some(_) if !quantity.trim().is_empty() && !unit_price.trim().is_empty() => {
                        Some(line_total(quantity, unit_price)?)
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        let old_text = self.text_of(node).to_string();
        self.set_text(Some(node), &text);
        if let Some(total) = &new_total {
            self.set_text(total_node, total);
        }

        if let Err(e) = self.recompute_totals() {
            self.set_text(Some(node), &old_text);
            if let Some(old) = &old_total {
                self.set_text(total_node, old);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Insert a new line item with default values.
    ///
    /// The line goes before the contribution line, or before the first
    /// summary block when there is no contribution line, or at the end of the
    /// section. Lines are then renumbered and totals re-derived.
    pub fn insert_line_item(&mut self) -> Result<NodeId, FatturaError> {
        let section = self.require_goods_section()?;
        let item = self.create_element(schema::LINE_ITEM);
        self.append_text_element(item, line::NUMBER, "0");
        self.append_text_element(item, line::DESCRIPTION, NEW_LINE_DESCRIPTION);
        self.append_text_element(item, line::QUANTITY, NEW_LINE_QUANTITY);
        self.append_text_element(item, line::UNIT_OF_MEASURE, NEW_LINE_UNIT);
        self.append_text_element(item, line::UNIT_PRICE, ZERO_PRICE);
        self.append_text_element(item, line::TOTAL_PRICE, ZERO_PRICE);
        self.append_text_element(item, line::VAT_RATE, VatRate::default().as_str());

        let anchor = self
            .sentinel_line()
            .or_else(|| self.summary_blocks().first().copied());
        match anchor {
            Some(anchor) => self.insert_before(section, item, anchor),
            None => self.append_child(section, item),
        }

        self.reposition_sentinel()?;
        self.renumber_line_items();
        self.refresh_totals();
        debug!("inserted line item, {} lines now", self.line_items().len());
        Ok(item)
    }

    /// Remove a line item.
    ///
    /// With [`LineRemovalPolicy::KeepAtLeastOne`], removing the only normal
    /// line fails with [`FatturaError::LastLine`]. The contribution line can
    /// always be removed.
    pub fn remove_line_item(&mut self, item: NodeId) -> Result<(), FatturaError> {
        let section = self.require_goods_section()?;
        if self.parent(item) != Some(section) || self.local_name(item) != schema::LINE_ITEM {
            return Err(FatturaError::AncestorNotFound(format!(
                "{} is not a line item of {}",
                self.path_of(item),
                schema::GOODS_SECTION
            )));
        }

        if !self.is_sentinel(item)
            && self.config().line_removal == LineRemovalPolicy::KeepAtLeastOne
            && self.normal_line_items().len() <= 1
        {
            warn!("refusing to remove the only line item");
            return Err(FatturaError::LastLine);
        }

        self.detach(item);
        self.reposition_sentinel()?;
        self.renumber_line_items();
        self.refresh_totals();
        Ok(())
    }

    /// Number all line items `1..=n` in document order, creating
    /// `NumeroLinea` where it is missing.
    pub fn renumber_line_items(&mut self) {
        for (i, item) in self.line_items().into_iter().enumerate() {
            let number = (i + 1).to_string();
            match self.child(item, line::NUMBER) {
                Some(id) => self.set_text(Some(id), &number),
                None => {
                    let id = self.create_element(line::NUMBER);
                    self.set_text(Some(id), &number);
                    match self.children(item).first().copied() {
                        Some(first) => self.insert_before(item, id, first),
                        None => self.append_child(item, id),
                    }
                }
            }
        }
    }

    /// Move the contribution line after all other line items, right before
    /// the first summary block.
    ///
    /// Returns whether a contribution line exists. Lines are renumbered when
    /// the line moved.
    pub fn reposition_sentinel(&mut self) -> Result<bool, FatturaError> {
        let Some(sentinel) = self.sentinel_line() else {
            return Ok(false);
        };
        let section = self.require_goods_section()?;

        let items = self.line_items();
        let last_item = items.last().copied();
        let summary = self.summary_blocks().first().copied();
        let follows = self
            .children(section)
            .iter()
            .position(|c| *c == sentinel)
            .and_then(|pos| self.children(section).get(pos + 1).copied());

        let already_last = last_item == Some(sentinel)
            && (summary.is_none() || follows == summary);
        if already_last {
            return Ok(true);
        }

        self.detach(sentinel);
        match summary {
            Some(summary) => self.insert_before(section, sentinel, summary),
            None => self.append_child(section, sentinel),
        }
        self.renumber_line_items();
        debug!("moved contribution line to the end of the line items");
        Ok(true)
    }

    /// Add the contribution line if the document does not have one.
    ///
    /// Returns the contribution line, new or existing.
    pub fn add_sentinel_line(&mut self) -> Result<NodeId, FatturaError> {
        if let Some(existing) = self.sentinel_line() {
            info!("contribution line already present");
            return Ok(existing);
        }
        let section = self.require_goods_section()?;

        let item = self.create_element(schema::LINE_ITEM);
        self.append_text_element(item, line::NUMBER, "0");
        self.append_text_element(item, line::DESCRIPTION, SENTINEL_DESCRIPTION);
        self.append_text_element(item, line::UNIT_PRICE, ZERO_PRICE);
        self.append_text_element(item, line::TOTAL_PRICE, ZERO_PRICE);
        self.append_text_element(item, line::VAT_RATE, VatRate::default().as_str());

        match self.summary_blocks().first().copied() {
            Some(summary) => self.insert_before(section, item, summary),
            None => self.append_child(section, item),
        }
        self.renumber_line_items();
        self.refresh_totals();
        Ok(item)
    }

    /// Remove the contribution line. Returns whether one was present.
    pub fn remove_sentinel_line(&mut self) -> Result<bool, FatturaError> {
        match self.sentinel_line() {
            Some(sentinel) => {
                self.remove_line_item(sentinel)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
