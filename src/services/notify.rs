//! WhatsApp deep links. Nothing is sent from here: staff open the link and press send.

use crate::models::{Naira, Order};

const WHATSAPP_BASE: &str = "https://wa.me";
const COUNTRY_CODE: &str = "234";

/// Digits only, rewritten to the Nigerian international form where the number is local.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if let Some(rest) = digits.strip_prefix('0') {
        format!("{COUNTRY_CODE}{rest}")
    } else if digits.len() == 10 {
        format!("{COUNTRY_CODE}{digits}")
    } else {
        digits
    }
}

/// `₦1,250,000`
pub fn format_naira(amount: Naira) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}₦{grouped}")
}

/// Same escaping as JavaScript's `encodeURIComponent`.
fn encode_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9'
            | b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// `None` when the number has no digits to dial.
pub fn deep_link(phone: &str, text: &str) -> Option<String> {
    let number = normalize_phone(phone);
    if number.is_empty() {
        return None;
    }
    Some(format!("{WHATSAPP_BASE}/{number}?text={}", encode_component(text)))
}

pub fn delivery_message(order: &Order, receipt_url: &str, validity_hours: i64) -> String {
    format!(
        "*ORDER DELIVERED*\n\n\
         Hello {name},\n\
         Your order has been delivered!\n\n\
         *Details:*\n\
         • ID: {id}\n\
         • Item: {item}\n\
         • Qty: {qty}\n\
         • Total: {total}\n\n\
         *Delivery Address:*\n\
         {address}\n\n\
         *Receipt:*\n\
         {receipt_url}\n\n\
         *NOTE:* Receipt link is valid for {validity_hours}hrs. If not found contact our Support via our website.\n\n\
         _Thank you!_",
        name = order.customer_name,
        id = order.short_id(),
        item = order.order_details,
        qty = order.quantity,
        total = format_naira(order.total_amount),
        address = order.address,
    )
}

pub fn enquiry_message(order: &Order) -> String {
    format!(
        "*NEW ORDER ENQUIRY*\n\n\
         *Animal:* {item}\n\
         *Quantity:* {qty}\n\
         *Unit Price:* {unit}\n\
         *Total Amount:* {total}\n\n\
         *Customer Details:*\n\
         - Name: {name}\n\
         - Phone: {phone}\n\
         - Email: {email}\n\
         - Address: {address}",
        item = order.order_details,
        qty = order.quantity,
        unit = format_naira(order.unit_price),
        total = format_naira(order.total_amount),
        name = order.customer_name,
        phone = order.phone,
        email = order.email,
        address = order.address,
    )
}
