//! Storefront catalog: the special offers listing and its small product list view.

pub mod domain;
pub mod infra;
pub mod views;

pub use domain::error::CatalogError;
pub use domain::model::ProductOffer;
pub use domain::service::SpecialOffers;
pub use views::small_product_list::{SmallProductList, escape_html, render_small_product_list, trim};
