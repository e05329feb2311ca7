use std::fmt::Write;

use crate::domain::money::currency_symbol;
use crate::domain::Money;
use crate::models::{Ad, OrderResult, Product};
use crate::utils::escape_html;

// ============================================================================
// HTML Rendering
// ============================================================================
//
// Plain string building. Every value that came from a request or an upstream
// service passes through `escape_html`. `write!` into a String cannot fail,
// so its result is ignored throughout.
//
// ============================================================================

/// Shared header data for every page.
pub struct Page<'a> {
    pub title: &'a str,
    pub session_id: &'a str,
    pub currency: &'a str,
    pub currencies: &'a [String],
    pub cart_size: i64,
}

pub struct PricedProduct {
    pub product: Product,
    pub price: Money,
}

pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
    pub price: Money,
}

pub fn money(m: &Money) -> String {
    format!("{}{}", currency_symbol(&m.currency_code), m.format_major_minor())
}

fn layout(page: &Page<'_>, body: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{} | Online Boutique</title>\n</head>\n<body>\n<header>\n\
         <a href=\"/\">Online Boutique</a>\n",
        escape_html(page.title)
    );

    if !page.currencies.is_empty() {
        html.push_str("<form method=\"POST\" action=\"/setCurrency\">\n<select name=\"currency_code\" onchange=\"this.form.submit()\">\n");
        for code in page.currencies {
            let selected = if code == page.currency { " selected" } else { "" };
            let _ = writeln!(
                html,
                "<option value=\"{0}\"{1}>{2} {0}</option>",
                escape_html(code),
                selected,
                currency_symbol(code)
            );
        }
        html.push_str("</select>\n</form>\n");
    }

    let _ = write!(
        html,
        "<a href=\"/cart\">Cart ({})</a>\n</header>\n<main>\n{}</main>\n\
         <footer><small>session-id: {}</small></footer>\n</body>\n</html>\n",
        page.cart_size,
        body,
        escape_html(page.session_id)
    );
    html
}

fn ad_banner(html: &mut String, ad: Option<&Ad>) {
    if let Some(ad) = ad {
        let _ = writeln!(
            html,
            "<aside class=\"ad\"><strong>Ad</strong> <a href=\"{}\">{}</a></aside>",
            escape_html(&ad.redirect_url),
            escape_html(&ad.text)
        );
    }
}

fn recommendations_list(html: &mut String, recommendations: &[Product]) {
    if recommendations.is_empty() {
        return;
    }
    html.push_str("<section class=\"recommendations\">\n<h3>You May Also Like</h3>\n<ul>\n");
    for p in recommendations {
        let _ = writeln!(
            html,
            "<li><a href=\"/product/{}\">{}</a></li>",
            escape_html(&p.id),
            escape_html(&p.name)
        );
    }
    html.push_str("</ul>\n</section>\n");
}

pub fn home(page: &Page<'_>, products: &[PricedProduct], ad: Option<&Ad>) -> String {
    let mut body = String::from("<h2>Hot Products</h2>\n<ul class=\"products\">\n");
    for entry in products {
        let _ = writeln!(
            body,
            "<li><a href=\"/product/{}\"><img src=\"{}\" alt=\"\"><span>{}</span></a> <span class=\"price\">{}</span></li>",
            escape_html(&entry.product.id),
            escape_html(&entry.product.picture),
            escape_html(&entry.product.name),
            money(&entry.price)
        );
    }
    body.push_str("</ul>\n");
    ad_banner(&mut body, ad);
    layout(page, &body)
}

pub fn product(
    page: &Page<'_>,
    entry: &PricedProduct,
    recommendations: &[Product],
    ad: Option<&Ad>,
) -> String {
    let p = &entry.product;
    let mut body = String::new();
    let _ = write!(
        body,
        "<article class=\"product\">\n<img src=\"{}\" alt=\"\">\n<h2>{}</h2>\n\
         <p class=\"price\">{}</p>\n<p>{}</p>\n\
         <form method=\"POST\" action=\"/cart\">\n\
         <input type=\"hidden\" name=\"product_id\" value=\"{}\">\n\
         <select name=\"quantity\">",
        escape_html(&p.picture),
        escape_html(&p.name),
        money(&entry.price),
        escape_html(&p.description),
        escape_html(&p.id)
    );
    for q in 1..=10 {
        let _ = write!(body, "<option>{q}</option>");
    }
    body.push_str("</select>\n<button type=\"submit\">Add To Cart</button>\n</form>\n</article>\n");
    recommendations_list(&mut body, recommendations);
    ad_banner(&mut body, ad);
    layout(page, &body)
}

pub fn cart(
    page: &Page<'_>,
    lines: &[CartLine],
    shipping: &Money,
    total: &Money,
    recommendations: &[Product],
) -> String {
    let mut body = String::new();
    if lines.is_empty() {
        body.push_str("<h2>Your shopping cart is empty!</h2>\n<a href=\"/\">Continue Shopping</a>\n");
    } else {
        let _ = writeln!(body, "<h2>Cart ({})</h2>\n<table>", page.cart_size);
        for line in lines {
            let _ = writeln!(
                body,
                "<tr><td><a href=\"/product/{}\">{}</a></td><td>Quantity: {}</td><td>{}</td></tr>",
                escape_html(&line.product.id),
                escape_html(&line.product.name),
                line.quantity,
                money(&line.price)
            );
        }
        let _ = write!(
            body,
            "<tr><td>Shipping</td><td></td><td>{}</td></tr>\n\
             <tr><td>Total</td><td></td><td>{}</td></tr>\n</table>\n\
             <form method=\"POST\" action=\"/cart/empty\"><button type=\"submit\">Empty Cart</button></form>\n",
            money(shipping),
            money(total)
        );
        body.push_str(CHECKOUT_FORM);
    }
    recommendations_list(&mut body, recommendations);
    layout(page, &body)
}

const CHECKOUT_FORM: &str = "<form method=\"POST\" action=\"/cart/checkout\">\n\
<input type=\"email\" name=\"email\" value=\"someone@example.com\" required>\n\
<input type=\"text\" name=\"street_address\" value=\"1600 Amphitheatre Parkway\" required>\n\
<input type=\"number\" name=\"zip_code\" value=\"94043\" required>\n\
<input type=\"text\" name=\"city\" value=\"Mountain View\" required>\n\
<input type=\"text\" name=\"state\" value=\"CA\" required>\n\
<input type=\"text\" name=\"country\" value=\"United States\" required>\n\
<input type=\"text\" name=\"credit_card_number\" value=\"4432-8015-6152-0454\" required>\n\
<input type=\"number\" name=\"credit_card_expiration_month\" value=\"1\" required>\n\
<input type=\"number\" name=\"credit_card_expiration_year\" value=\"2030\" required>\n\
<input type=\"password\" name=\"credit_card_cvv\" value=\"672\" required>\n\
<button type=\"submit\">Place Order</button>\n</form>\n";

pub fn order(
    page: &Page<'_>,
    order: &OrderResult,
    total: &Money,
    recommendations: &[Product],
) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        "<h2>Your order is complete!</h2>\n\
         <p>Confirmation #: {}</p>\n<p>Tracking #: {}</p>\n<p>Total Paid: {}</p>\n\
         <a href=\"/\">Continue Shopping</a>\n",
        escape_html(&order.order_id),
        escape_html(&order.shipping_tracking_id),
        money(total)
    );
    recommendations_list(&mut body, recommendations);
    layout(page, &body)
}

pub fn error(status: u16, reason: &str, message: &str) -> String {
    let page = Page {
        title: "Error",
        session_id: "",
        currency: "",
        currencies: &[],
        cart_size: 0,
    };
    let body = format!(
        "<h2>Uh, oh!</h2>\n<p>Something has failed. Below are some details for debugging.</p>\n\
         <p><strong>HTTP Status:</strong> {} {}</p>\n<pre>{}</pre>\n",
        status,
        escape_html(reason),
        escape_html(message)
    );
    layout(&page, &body)
}
