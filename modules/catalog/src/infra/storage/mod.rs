mod mapper;
pub mod special_offers;

pub use special_offers::{OFFERS_TABLE, PRODUCTS_TABLE};
