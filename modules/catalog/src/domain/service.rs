use storefront_db::Connection;

use super::error::CatalogError;
use super::model::ProductOffer;
use crate::infra::storage::special_offers;
use crate::views::small_product_list::render_small_product_list;

/// Number of offers shown by default.
pub const DEFAULT_LIMIT: u64 = 4;

/// The special offers listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialOffers {
    offers: Vec<ProductOffer>,
}

impl SpecialOffers {
    /// Load the current offers.
    ///
    /// # Errors
    /// Returns `CatalogError` if the offers cannot be read.
    pub async fn load(conn: &mut Connection, limit: u64) -> Result<Self, CatalogError> {
        let offers = special_offers::fetch(conn, limit).await?;
        Ok(Self { offers })
    }

    #[must_use]
    pub fn offers(&self) -> &[ProductOffer] {
        &self.offers
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    /// Small product list markup for these offers.
    #[must_use]
    pub fn render(&self) -> String {
        render_small_product_list(&self.offers)
    }
}

impl From<Vec<ProductOffer>> for SpecialOffers {
    fn from(offers: Vec<ProductOffer>) -> Self {
        Self { offers }
    }
}

impl IntoIterator for SpecialOffers {
    type Item = ProductOffer;
    type IntoIter = std::vec::IntoIter<ProductOffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.offers.into_iter()
    }
}
