//! Update command - report the outcome of an earlier inquiry

use anyhow::Result;
use ris_lib::Request;

use crate::ui;

pub struct UpdateArgs {
    pub merchant_id: String,
    pub session_id: String,
    pub transaction_id: String,
    pub mode: String,
    pub auth: Option<String>,
    pub mack: Option<String>,
    pub refund_chargeback: Option<String>,
}

pub async fn run(args: UpdateArgs, json: bool) -> Result<()> {
    let client = super::load_client()?;

    let mut update = Request::update();
    update
        .set_mode(args.mode)
        .set_merchant_id(args.merchant_id)
        .set_session_id(args.session_id)
        .set_transaction_id(args.transaction_id);
    if let Some(auth) = args.auth {
        update.set_authorization_status(auth);
    }
    if let Some(mack) = args.mack {
        update.set_merchant_acknowledgment(mack);
    }
    if let Some(status) = args.refund_chargeback {
        update.set_refund_chargeback_status(status);
    }

    let spinner = ui::request_spinner("update");
    let result = client.process(&update).await;
    spinner.finish_and_clear();

    let response = result.map_err(|e| {
        ui::fail(&format!("Update failed: {}", e));
        e
    })?;
    ui::ok("Update accepted");
    super::print_response(&response, json)
}
