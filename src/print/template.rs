use std::path::{Path, PathBuf};

use crate::print::dto::{InvoicePayload, Metal};

/// Base images shipped in the template directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Silver,
    GstGoldStone,
    GstGold,
    NonGstGoldStone,
    NoCustomerNonGstGoldStone,
    NonGstGold,
    NoCustomerNonGstGold,
}

impl Template {
    pub fn file_name(self) -> &'static str {
        match self {
            Template::Silver => "nbj.png",
            Template::GstGoldStone => "gst-gold-stone.png",
            Template::GstGold => "gst-gold.png",
            Template::NonGstGoldStone => "non-gst-gold-with-stone.png",
            Template::NoCustomerNonGstGoldStone => "Nc-non-gst-gold-with-stone.png",
            Template::NonGstGold => "Non-gst-gold.png",
            Template::NoCustomerNonGstGold => "NC-Non-gst-gold.png",
        }
    }

    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    /// Picks the base image for an invoice. First matching rule wins.
    pub fn select(invoice: &InvoicePayload) -> Self {
        if invoice.metal != Metal::Gold {
            return Template::Silver;
        }
        let taxed = invoice.is_taxed();
        let stone = invoice.has_stone_weight();
        let customer = invoice.has_customer();

        match (taxed, stone, customer) {
            (true, true, _) => Template::GstGoldStone,
            (true, false, _) => Template::GstGold,
            (false, true, true) => Template::NonGstGoldStone,
            (false, true, false) => Template::NoCustomerNonGstGoldStone,
            (false, false, true) => Template::NonGstGold,
            (false, false, false) => Template::NoCustomerNonGstGold,
        }
    }
}
