//! The small product list shown in the special offers block.

use std::fmt;

use crate::domain::model::ProductOffer;

const NAME_LIMIT: usize = 50;
const DESCRIPTION_LIMIT: usize = 80;

/// Cut `text` to `len` characters, appending `...` when anything was cut.
#[must_use]
pub fn trim(text: &str, len: usize) -> String {
    match text.char_indices().nth(len) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_owned(),
    }
}

/// Escape text for HTML element content and quoted attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders the list markup through [`fmt::Display`].
#[derive(Debug, Clone, Copy)]
pub struct SmallProductList<'a>(pub &'a [ProductOffer]);

impl fmt::Display for SmallProductList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, r#"<ul class="thumbnails product-list-inline-small">"#)?;
        for offer in self.0 {
            let id = offer.product_id;
            let picture = escape_html(&offer.picture);
            let title = escape_html(&offer.name);
            let name = escape_html(&trim(&offer.name, NAME_LIMIT));
            let description = escape_html(&trim(&offer.description, DESCRIPTION_LIMIT));
            let price = escape_html(&offer.price);

            writeln!(f, r#"    <li class="col-xs-3">"#)?;
            writeln!(f, r#"        <div class="thumbnail">"#)?;
            writeln!(f, r#"            <div class="special-offer-big-img">"#)?;
            writeln!(
                f,
                r#"                <a class="img-wrap" href="/product/view?id={id}"><img class="img-responsive" src="/products_pictures/{picture}" alt=""></a>"#
            )?;
            writeln!(f, "            </div>")?;
            writeln!(f, r#"            <div class="caption">"#)?;
            writeln!(
                f,
                r#"                <a href="/product/view?id={id}" title="{title}">{name}</a>"#
            )?;
            writeln!(
                f,
                r#"                <p>{description}<span class="label label-info pull-right price">${price}</span></p>"#
            )?;
            writeln!(f, "            </div>")?;
            writeln!(f, "        </div>")?;
            writeln!(f, "    </li>")?;
        }
        write!(f, "</ul>")
    }
}

/// Markup of the small product list for `offers`.
#[must_use]
pub fn render_small_product_list(offers: &[ProductOffer]) -> String {
    SmallProductList(offers).to_string()
}
