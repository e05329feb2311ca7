use std::fmt::Write;

use super::checkout::compute_total;
use super::money::{currency_symbol, Money, MoneyError};
use crate::models::OrderResult;
use crate::utils::escape_html;

// ============================================================================
// Email - order confirmation rendering
// ============================================================================
//
// Confirmations are rendered to HTML and logged. No mail is sent.
//
// ============================================================================

fn price(m: &Money) -> String {
    format!("{}{}", currency_symbol(&m.currency_code), m.format_major_minor())
}

pub fn render_confirmation(order: &OrderResult) -> Result<String, MoneyError> {
    let total = compute_total(&order.shipping_cost, &order.items)?;
    let address = &order.shipping_address;

    let mut html = String::new();
    // Writing into a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head><title>Your Order Confirmation</title></head>\n<body>\n\
         <h2>Your Order Confirmation</h2>\n\
         <p>Thanks for shopping with us!</p>\n\
         <h3>Order ID</h3>\n<p>#{}</p>\n\
         <h3>Shipping</h3>\n<p>#{}</p>\n<p>{}</p>\n\
         <p>{}, {}, {} {}, {}</p>\n\
         <h3>Items</h3>\n<table>\n<tr><th>Item No.</th><th>Quantity</th><th>Price</th></tr>\n",
        escape_html(&order.order_id),
        escape_html(&order.shipping_tracking_id),
        price(&order.shipping_cost),
        escape_html(&address.street_address),
        escape_html(&address.city),
        escape_html(&address.state),
        address.zip_code,
        escape_html(&address.country),
    );

    for line in &order.items {
        let _ = writeln!(
            html,
            "<tr><td>#{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&line.item.product_id),
            line.item.quantity,
            price(&line.cost),
        );
    }

    let _ = write!(
        html,
        "</table>\n<h3>Total</h3>\n<p>{}</p>\n</body>\n</html>\n",
        price(&total)
    );

    Ok(html)
}
