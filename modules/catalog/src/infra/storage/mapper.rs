use storefront_db::{Row, Value};

use crate::domain::error::CatalogError;
use crate::domain::model::ProductOffer;

impl TryFrom<&Row> for ProductOffer {
    type Error = CatalogError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let product_id = row
            .get("productID")
            .and_then(Value::as_i64)
            .ok_or(CatalogError::MissingField("productID"))?;
        let name = row
            .get("name")
            .and_then(Value::as_str)
            .ok_or(CatalogError::MissingField("name"))?
            .to_owned();

        Ok(Self {
            product_id,
            picture: text_or_empty(row.get("picture")),
            name,
            description: text_or_empty(row.get("description")),
            price: row.get("Price").map(format_price).unwrap_or_default(),
        })
    }
}

fn text_or_empty(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}

fn format_price(value: &Value) -> String {
    match value {
        Value::Float(price) => format!("{price:.2}"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn row(values: Vec<Value>) -> Row {
        let columns: Arc<[String]> = ["productID", "picture", "name", "description", "Price"]
            .map(str::to_owned)
            .into();
        Row::new(columns, values)
    }

    #[test]
    fn maps_offer_columns() {
        let offer = ProductOffer::try_from(&row(vec![
            Value::Int(4),
            "lamp.jpg".into(),
            "Lamp".into(),
            Value::Null,
            Value::Float(19.9),
        ]))
        .unwrap();

        assert_eq!(offer.product_id, 4);
        assert_eq!(offer.picture, "lamp.jpg");
        assert_eq!(offer.description, "");
        assert_eq!(offer.price, "19.90");
    }

    #[test]
    fn decimal_text_price_is_kept() {
        let offer = ProductOffer::try_from(&row(vec![
            "4".into(),
            Value::Null,
            "Lamp".into(),
            "bright".into(),
            "19.90".into(),
        ]))
        .unwrap();
        assert_eq!(offer.product_id, 4);
        assert_eq!(offer.price, "19.90");
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = ProductOffer::try_from(&row(vec![
            Value::Int(4),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
        ]))
        .unwrap_err();
        assert!(matches!(err, CatalogError::MissingField("name")));
    }
}
