//! Request builder for inquiries and updates.
//!
//! A [`Request`] is a [`FieldMap`] plus an optional payment. The payment is
//! obfuscated when the request is turned into wire fields, so the raw token
//! never reaches the field map.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::{FieldMap, MERC, PENC, PENC_KHASH, PENC_MASK, PENC_NONE, PTOK};
use crate::khash::Khash;
use crate::payment::{PaymentToken, PaymentType};
use crate::Result;

/// Protocol version sent as `VERS`.
pub const PROTOCOL_VERSION: &str = "0720";

/// SDK identifier sent as `SDK` on inquiries.
pub const SDK_IDENTIFIER: &str = "RUST";

/// Default inquiry currency.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A cart line item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product type (`PROD_TYPE`).
    pub product_type: String,
    /// Item name or SKU (`PROD_ITEM`).
    pub item_name: String,
    /// Description (`PROD_DESC`).
    pub description: String,
    /// Quantity (`PROD_QUANT`).
    pub quantity: u64,
    /// Unit price in the lowest currency unit (`PROD_PRICE`).
    pub price: u64,
}

impl CartItem {
    /// Create a cart item.
    pub fn new(
        product_type: impl Into<String>,
        item_name: impl Into<String>,
        description: impl Into<String>,
        quantity: u64,
        price: u64,
    ) -> Self {
        Self {
            product_type: product_type.into(),
            item_name: item_name.into(),
            description: description.into(),
            quantity,
            price,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Encoding {
    Khash,
    Mask,
}

/// An outgoing RIS request.
#[derive(Clone, Debug)]
pub struct Request {
    fields: FieldMap,
    payment: Option<(PaymentToken, Encoding)>,
}

impl Request {
    fn base() -> Self {
        let mut fields = FieldMap::new();
        fields.set("VERS", PROTOCOL_VERSION).set(PENC, PENC_KHASH);
        Self {
            fields,
            payment: None,
        }
    }

    /// A risk inquiry (`MODE=Q`).
    pub fn inquiry() -> Self {
        let mut request = Self::base();
        request
            .fields
            .set("MODE", "Q")
            .set("CURR", DEFAULT_CURRENCY)
            .set("SDK", SDK_IDENTIFIER);
        request
    }

    /// An update of an earlier transaction (`MODE=U`).
    pub fn update() -> Self {
        let mut request = Self::base();
        request.fields.set("MODE", "U");
        request
    }

    /// Set any field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.set(key, value);
        self
    }

    /// Protocol version (`VERS`).
    pub fn set_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.set("VERS", version)
    }

    /// Request mode (`MODE`), e.g. `Q`, `P`, `W`, `J`, `U` or `X`.
    pub fn set_mode(&mut self, mode: impl Into<String>) -> &mut Self {
        self.set("MODE", mode)
    }

    /// Merchant id (`MERC`).
    pub fn set_merchant_id(&mut self, merchant_id: impl Into<String>) -> &mut Self {
        self.set(MERC, merchant_id)
    }

    /// Session id (`SESS`), unique over 30 days.
    pub fn set_session_id(&mut self, session_id: impl Into<String>) -> &mut Self {
        self.set("SESS", session_id)
    }

    /// Transaction id (`TRAN`), used by updates.
    pub fn set_transaction_id(&mut self, transaction_id: impl Into<String>) -> &mut Self {
        self.set("TRAN", transaction_id)
    }

    /// Merchant order number (`ORDR`).
    pub fn set_order_number(&mut self, order_number: impl Into<String>) -> &mut Self {
        self.set("ORDR", order_number)
    }

    /// Currency code (`CURR`).
    pub fn set_currency(&mut self, currency: impl Into<String>) -> &mut Self {
        self.set("CURR", currency)
    }

    /// Authorization status from the issuer (`AUTH`), `A` or `D`.
    pub fn set_authorization_status(&mut self, status: impl Into<String>) -> &mut Self {
        self.set("AUTH", status)
    }

    /// Merchant acknowledgment (`MACK`), `Y` or `N`.
    pub fn set_merchant_acknowledgment(&mut self, ack: impl Into<String>) -> &mut Self {
        self.set("MACK", ack)
    }

    /// Bankcard AVS street address reply (`AVST`), `M`, `N` or `X`.
    pub fn set_avs_address_reply(&mut self, reply: impl Into<String>) -> &mut Self {
        self.set("AVST", reply)
    }

    /// Bankcard AVS zip code reply (`AVSZ`).
    pub fn set_avs_zip_reply(&mut self, reply: impl Into<String>) -> &mut Self {
        self.set("AVSZ", reply)
    }

    /// Bankcard CVV reply (`CVVR`).
    pub fn set_cvv_reply(&mut self, reply: impl Into<String>) -> &mut Self {
        self.set("CVVR", reply)
    }

    /// Refund or chargeback status (`RFCB`), `R` or `C`. Updates only.
    pub fn set_refund_chargeback_status(&mut self, status: impl Into<String>) -> &mut Self {
        self.set("RFCB", status)
    }

    /// Order total in the lowest currency unit (`TOTL`).
    pub fn set_total(&mut self, total: impl Into<String>) -> &mut Self {
        self.set("TOTL", total)
    }

    /// Customer email (`EMAL`).
    pub fn set_email(&mut self, email: impl Into<String>) -> &mut Self {
        self.set("EMAL", email)
    }

    /// Customer name (`NAME`).
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.set("NAME", name)
    }

    /// Merchant's unique customer id (`UNIQ`).
    pub fn set_unique_customer_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.set("UNIQ", id)
    }

    /// Kount Central customer id (`CUSTOMER_ID`).
    pub fn set_kc_customer_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.set("CUSTOMER_ID", id)
    }

    /// Customer IP address (`IPAD`).
    pub fn set_ip_address(&mut self, ip_address: impl Into<String>) -> &mut Self {
        self.set("IPAD", ip_address)
    }

    /// Customer user agent (`UAGT`).
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) -> &mut Self {
        self.set("UAGT", user_agent)
    }

    /// Website id (`SITE`).
    pub fn set_website(&mut self, site: impl Into<String>) -> &mut Self {
        self.set("SITE", site)
    }

    /// User defined field (`UDF[label]`).
    pub fn set_user_defined_field(&mut self, label: &str, value: impl Into<String>) -> &mut Self {
        self.set(format!("UDF[{}]", label), value)
    }

    /// Cart contents as `PROD_*[i]` fields.
    pub fn set_cart(&mut self, cart: &[CartItem]) -> &mut Self {
        for (i, item) in cart.iter().enumerate() {
            self.fields
                .set(format!("PROD_TYPE[{}]", i), item.product_type.as_str())
                .set(format!("PROD_ITEM[{}]", i), item.item_name.as_str())
                .set(format!("PROD_DESC[{}]", i), item.description.as_str())
                .set(format!("PROD_QUANT[{}]", i), item.quantity.to_string())
                .set(format!("PROD_PRICE[{}]", i), item.price.to_string());
        }
        self
    }

    /// Turn KHASH payment encoding on (`PENC=KHASH`) or off (`PENC=`).
    pub fn set_khash_payment_encoding(&mut self, enabled: bool) -> &mut Self {
        self.set(PENC, if enabled { PENC_KHASH } else { PENC_NONE })
    }

    /// Attach a payment, hashed with KHASH when KHASH encoding is on.
    pub fn set_payment(&mut self, payment: PaymentToken) -> &mut Self {
        self.payment = Some((payment, Encoding::Khash));
        self
    }

    /// Attach a card payment to be masked.
    ///
    /// Other payment types, and tokens already obfuscated, fall back to
    /// [`Request::set_payment`].
    pub fn set_payment_masked(&mut self, payment: PaymentToken) -> &mut Self {
        if payment.payment_type() == &PaymentType::Card && !payment.is_obfuscated() {
            self.payment = Some((payment, Encoding::Mask));
            self
        } else {
            warn!(
                payment_type = %payment.payment_type(),
                "Masking applies to card payments only, using KHASH instead"
            );
            self.set_payment(payment)
        }
    }

    /// Fields set so far, payment excluded.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Attached payment, before obfuscation.
    pub fn payment(&self) -> Option<&PaymentToken> {
        self.payment.as_ref().map(|(payment, _)| payment)
    }

    /// Assemble the wire fields, obfuscating the payment.
    ///
    /// Sets `PTOK`, `PTYP` and `LAST4`, plus `PENC=MASK` for masked cards.
    /// Gift card hashing reads the merchant id from `MERC`.
    pub fn to_fields(&self, khash: &Khash) -> Result<FieldMap> {
        let mut fields = self.fields.clone();
        let Some((payment, encoding)) = &self.payment else {
            return Ok(fields);
        };

        let mut payment = payment.clone();
        match encoding {
            Encoding::Mask => {
                payment.apply_mask()?;
                fields.set(PENC, PENC_MASK);
            }
            Encoding::Khash => {
                let khash_enabled = fields.get(PENC) == Some(PENC_KHASH);
                if khash_enabled && payment.payment_type() != &PaymentType::NoPayment {
                    payment.apply_khash(khash, fields.get(MERC))?;
                }
            }
        }

        fields
            .insert(PTOK, payment.value().map(str::to_string))
            .set("PTYP", payment.payment_type().as_str())
            .set("LAST4", payment.last4());
        Ok(fields)
    }
}
