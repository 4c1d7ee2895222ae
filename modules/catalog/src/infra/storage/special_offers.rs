//! SQL access to the special offers tables.

use storefront_db::{Connection, Params};

use crate::domain::error::CatalogError;
use crate::domain::model::ProductOffer;

pub const OFFERS_TABLE: &str = "tbl_special_offers";
pub const PRODUCTS_TABLE: &str = "tbl_products";

/// Load up to `limit` offered products, in offer order.
///
/// # Errors
/// Returns `CatalogError::Db` if the statement fails and
/// `CatalogError::MissingField` for rows without an id or a name.
pub async fn fetch(conn: &mut Connection, limit: u64) -> Result<Vec<ProductOffer>, CatalogError> {
    let dialect = conn.dialect();
    let q = |ident: &str| dialect.quote_ident(ident);

    let sql = format!(
        "SELECT {pid}, {picture}, {name}, {description}, {price} \
         FROM {offers} so JOIN {products} p ON {pid} = {so_pid} \
         ORDER BY {offer_id} LIMIT {limit}",
        pid = q("p.productID"),
        picture = q("p.picture"),
        name = q("p.name"),
        description = q("p.description"),
        price = q("p.Price"),
        offers = q(OFFERS_TABLE),
        products = q(PRODUCTS_TABLE),
        so_pid = q("so.productID"),
        offer_id = q("so.offerID"),
        limit = dialect.placeholder(1),
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let rows = conn.execute(&sql, Params::new().bind(limit)).await?;
    let offers = rows
        .iter()
        .map(ProductOffer::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = offers.len(), "special offers loaded");
    Ok(offers)
}
