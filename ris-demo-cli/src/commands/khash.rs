//! Offline token encodings

use anyhow::{Context, Result};
use ris_lib::khash::{last4, mask_token, Khash};

use crate::ui;

pub fn run_khash(token: &str, merchant_id: Option<u64>) -> Result<()> {
    let encoded = std::env::var("RIS_CONFIG_KEY").context("RIS_CONFIG_KEY is not set")?;
    let fingerprint = std::env::var("RIS_CONFIG_KEY_FINGERPRINT")
        .context("RIS_CONFIG_KEY_FINGERPRINT is not set")?;
    let khash = Khash::from_encoded(&encoded, &fingerprint)?;

    let hashed = match merchant_id {
        Some(merchant_id) => khash.hash_gift_card(merchant_id, token),
        None => khash.hash_payment_token(token)?,
    };

    ui::field("KHASH", &hashed);
    ui::field("LAST4", &last4(token));
    Ok(())
}

pub fn run_mask(token: &str) -> Result<()> {
    ui::field("MASK", &mask_token(token)?);
    ui::field("LAST4", &last4(token));
    Ok(())
}
