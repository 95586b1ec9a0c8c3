//! Inquiry command - score a transaction

use anyhow::Result;
use ris_lib::{PaymentToken, Request};

use crate::ui;

pub struct InquiryArgs {
    pub merchant_id: String,
    pub session_id: String,
    pub order: Option<String>,
    pub total: String,
    pub currency: String,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub card: Option<String>,
    pub gift_card: Option<String>,
    pub mask: bool,
}

/// Assemble the inquiry for the given arguments.
pub fn build_request(args: InquiryArgs) -> Request {
    let mut inquiry = Request::inquiry();
    inquiry
        .set_merchant_id(args.merchant_id)
        .set_session_id(args.session_id)
        .set_total(args.total)
        .set_currency(args.currency);

    if let Some(order) = args.order {
        inquiry.set_order_number(order);
    }
    if let Some(email) = args.email {
        inquiry.set_email(email);
    }
    if let Some(ip) = args.ip_address {
        inquiry.set_ip_address(ip);
    }

    match (args.card, args.gift_card) {
        (Some(card), _) if args.mask => {
            inquiry.set_payment_masked(PaymentToken::card(card));
        }
        (Some(card), _) => {
            inquiry.set_payment(PaymentToken::card(card));
        }
        (None, Some(gift_card)) => {
            inquiry.set_payment(PaymentToken::gift_card(gift_card));
        }
        (None, None) => {
            inquiry.set_payment(PaymentToken::none());
        }
    }
    inquiry
}

pub async fn run(args: InquiryArgs, json: bool) -> Result<()> {
    let client = super::load_client()?;
    let inquiry = build_request(args);

    let spinner = ui::request_spinner("inquiry");
    let result = client.process(&inquiry).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            if response.has_errors() {
                ui::fail("RIS rejected the inquiry");
            } else {
                ui::ok("Inquiry scored");
            }
            super::print_response(&response, json)
        }
        Err(e) => {
            ui::fail(&format!("Inquiry failed: {}", e));
            if e.is_retryable() {
                ui::hint("The failure looks transient, try again");
            }
            Err(e.into())
        }
    }
}
