use serde::Serialize;

/// A product shown in the special offers list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductOffer {
    pub product_id: i64,
    /// File name under `/products_pictures/`.
    pub picture: String,
    pub name: String,
    pub description: String,
    /// Price as stored, ready for display.
    pub price: String,
}
