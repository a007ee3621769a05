// zahroshop/src/services/payment_mock.rs

//! Payment link generation. No gateway is contacted; the link points the
//! customer at the bank's payment page with the amount and merchant phone.

use tracing::{info, instrument};

/// Formats cents as a decimal amount with two fraction digits.
pub fn format_amount(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[instrument(skip(link_base, merchant_phone))]
pub fn build_payment_link(link_base: &str, amount_cents: i64, merchant_phone: &str) -> String {
  let link = format!(
    "{}?amount={}&phone={}",
    link_base,
    format_amount(amount_cents),
    merchant_phone
  );
  info!(%link, "Payment link generated.");
  link
}
