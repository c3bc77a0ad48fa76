//! Plain-text order receipt.

use std::fmt::Write;

use domain::Order;

const RULE: &str = "----------------------------------------";

/// Renders the receipt handed to the notification sink and served to buyers.
pub fn render_receipt(order: &Order) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_receipt(&mut out, order);
    out
}

fn write_receipt(out: &mut String, order: &Order) -> std::fmt::Result {
    let customer = order.customer();

    writeln!(out, "ORDER RECEIPT")?;
    writeln!(out, "Order: {}", order.id())?;
    writeln!(
        out,
        "Date: {}",
        order.created_at().format("%Y-%m-%d %H:%M UTC")
    )?;
    writeln!(out, "Status: {}", order.fulfillment_state())?;
    if let Some(payment) = order.payment() {
        writeln!(out, "Payment: {} ({})", payment.external_id, payment.status)?;
    }
    writeln!(out, "{RULE}")?;

    if let Some(name) = &customer.name {
        writeln!(out, "{name}")?;
    }
    if let Some(email) = &customer.email {
        writeln!(out, "{email}")?;
    }
    writeln!(out, "{}", customer.address)?;
    writeln!(out, "{} {}", customer.postal_code, customer.city)?;
    writeln!(out, "{RULE}")?;

    for line in order.lines() {
        writeln!(
            out,
            "{:>3} x {:<24} {:>10} {:>10}",
            line.quantity,
            line.name,
            line.unit_price.to_string(),
            line.line_total().to_string()
        )?;
    }
    writeln!(out, "{RULE}")?;
    writeln!(out, "TOTAL ({}): {}", order.currency(), order.total())?;
    Ok(())
}
