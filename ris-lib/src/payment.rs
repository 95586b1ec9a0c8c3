//! Payment tokens and the payment-type vocabulary.
//!
//! A [`PaymentToken`] carries the raw token, its type code and the last four
//! characters. Once obfuscated it is flagged, so applying KHASH a second time
//! leaves it untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::khash::{self, Khash};
use crate::{RisError, Result};

/// Payment type, sent as `PTYP`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    /// Credit or debit card (`CARD`).
    Card,
    /// Gift card (`GIFT`). Hashed with the merchant id as prefix.
    GiftCard,
    /// Check, token is the MICR line (`CHEK`).
    Check,
    /// PayPal payer id (`PYPL`).
    Paypal,
    /// Google payment (`GOOG`).
    Google,
    /// Apple Pay (`APAY`).
    ApplePay,
    /// Bill Me Later (`BLML`).
    BillMeLater,
    /// Green Dot MoneyPak (`GDMP`).
    GreenDotMoneyPak,
    /// Generic token (`TOKEN`).
    Token,
    /// No payment (`NONE`).
    NoPayment,
    /// BPAY (`BPAY`).
    BPay,
    /// Carte Bleue (`CARTE_BLEUE`).
    CarteBleue,
    /// ELV (`ELV`).
    Elv,
    /// GiroPay (`GIROPAY`).
    GiroPay,
    /// Interac (`INTERAC`).
    Interac,
    /// Mercado Pago (`MERCADE_PAGO`, spelled as the service expects).
    MercadoPago,
    /// Neteller (`NETELLER`).
    Neteller,
    /// POLi (`POLI`).
    Poli,
    /// SEPA (`SEPA`).
    Sepa,
    /// Skrill/Moneybookers (`SKRILL`).
    Skrill,
    /// Sofort (`SOFORT`).
    Sofort,
    /// Any other type code, sent verbatim.
    Other(String),
}

impl PaymentType {
    /// Wire code for this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Card => "CARD",
            Self::GiftCard => "GIFT",
            Self::Check => "CHEK",
            Self::Paypal => "PYPL",
            Self::Google => "GOOG",
            Self::ApplePay => "APAY",
            Self::BillMeLater => "BLML",
            Self::GreenDotMoneyPak => "GDMP",
            Self::Token => "TOKEN",
            Self::NoPayment => "NONE",
            Self::BPay => "BPAY",
            Self::CarteBleue => "CARTE_BLEUE",
            Self::Elv => "ELV",
            Self::GiroPay => "GIROPAY",
            Self::Interac => "INTERAC",
            Self::MercadoPago => "MERCADE_PAGO",
            Self::Neteller => "NETELLER",
            Self::Poli => "POLI",
            Self::Sepa => "SEPA",
            Self::Skrill => "SKRILL",
            Self::Sofort => "SOFORT",
            Self::Other(code) => code,
        }
    }

    /// Parse a wire code. Unknown codes become [`PaymentType::Other`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "CARD" => Self::Card,
            "GIFT" => Self::GiftCard,
            "CHEK" => Self::Check,
            "PYPL" => Self::Paypal,
            "GOOG" => Self::Google,
            "APAY" => Self::ApplePay,
            "BLML" => Self::BillMeLater,
            "GDMP" => Self::GreenDotMoneyPak,
            "TOKEN" => Self::Token,
            "NONE" => Self::NoPayment,
            "BPAY" => Self::BPay,
            "CARTE_BLEUE" => Self::CarteBleue,
            "ELV" => Self::Elv,
            "GIROPAY" => Self::GiroPay,
            "INTERAC" => Self::Interac,
            "MERCADE_PAGO" => Self::MercadoPago,
            "NETELLER" => Self::Neteller,
            "POLI" => Self::Poli,
            "SEPA" => Self::Sepa,
            "SKRILL" => Self::Skrill,
            "SOFORT" => Self::Sofort,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment token with its type, last four characters and obfuscation flag.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentToken {
    payment_type: PaymentType,
    token: Option<String>,
    last4: String,
    obfuscated: bool,
}

impl PaymentToken {
    /// Create a payment of any type.
    pub fn new(payment_type: PaymentType, token: impl Into<String>) -> Self {
        Self {
            payment_type,
            token: Some(token.into()),
            last4: String::new(),
            obfuscated: false,
        }
    }

    /// Create a payment from a wire type code and token.
    ///
    /// `NONE` yields [`PaymentToken::none`] regardless of the token.
    pub fn from_code(code: &str, token: impl Into<String>) -> Self {
        match PaymentType::from_code(code) {
            PaymentType::NoPayment => Self::none(),
            payment_type => Self::new(payment_type, token),
        }
    }

    /// A card number.
    pub fn card(number: impl Into<String>) -> Self {
        Self::new(PaymentType::Card, number)
    }

    /// A gift card number.
    pub fn gift_card(number: impl Into<String>) -> Self {
        Self::new(PaymentType::GiftCard, number)
    }

    /// A check MICR line.
    pub fn check(micr: impl Into<String>) -> Self {
        Self::new(PaymentType::Check, micr)
    }

    /// A PayPal payer id.
    pub fn paypal(payer_id: impl Into<String>) -> Self {
        Self::new(PaymentType::Paypal, payer_id)
    }

    /// A Google payment id.
    pub fn google(id: impl Into<String>) -> Self {
        Self::new(PaymentType::Google, id)
    }

    /// An Apple Pay id.
    pub fn apple_pay(id: impl Into<String>) -> Self {
        Self::new(PaymentType::ApplePay, id)
    }

    /// A Bill Me Later id.
    pub fn bill_me_later(id: impl Into<String>) -> Self {
        Self::new(PaymentType::BillMeLater, id)
    }

    /// A Green Dot MoneyPak id.
    pub fn green_dot_money_pak(id: impl Into<String>) -> Self {
        Self::new(PaymentType::GreenDotMoneyPak, id)
    }

    /// A generic payment token.
    pub fn token(id: impl Into<String>) -> Self {
        Self::new(PaymentType::Token, id)
    }

    /// No payment. Carries no token and is never obfuscated.
    pub fn none() -> Self {
        Self {
            payment_type: PaymentType::NoPayment,
            token: None,
            last4: String::new(),
            obfuscated: false,
        }
    }

    /// Mark a token the caller has already obfuscated.
    pub fn already_obfuscated(mut self) -> Self {
        self.obfuscated = true;
        self
    }

    /// Override the last four characters sent as `LAST4`.
    pub fn with_last4(mut self, last4: impl Into<String>) -> Self {
        self.last4 = last4.into();
        self
    }

    /// Payment type.
    pub fn payment_type(&self) -> &PaymentType {
        &self.payment_type
    }

    /// Token value, hashed or masked once obfuscated.
    pub fn value(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Last four characters recorded so far.
    pub fn last4(&self) -> &str {
        &self.last4
    }

    /// Whether the token has been obfuscated.
    pub fn is_obfuscated(&self) -> bool {
        self.obfuscated
    }

    /// Record the last four characters of the raw token, unless already set.
    pub fn calculate_last4(&mut self) {
        if self.last4.is_empty() {
            if let Some(token) = &self.token {
                self.last4 = khash::last4(token);
            }
        }
    }

    /// Replace the token with its KHASH.
    ///
    /// Gift cards need the merchant id. A no-op for already obfuscated
    /// tokens and for payments without a token.
    pub fn apply_khash(&mut self, khash: &Khash, merchant_id: Option<&str>) -> Result<()> {
        if self.obfuscated {
            return Ok(());
        }
        self.calculate_last4();
        let Some(token) = self.token.as_deref() else {
            return Ok(());
        };

        let hashed = if self.payment_type == PaymentType::GiftCard {
            let merchant_id = merchant_id
                .ok_or_else(|| RisError::invalid_data("MERC", "gift card hashing needs a merchant id"))?
                .trim()
                .parse::<u64>()
                .map_err(|e| RisError::invalid_data("MERC", e.to_string()))?;
            khash.hash_gift_card(merchant_id, token)
        } else {
            khash.hash_payment_token(token)?
        };

        self.token = Some(hashed);
        self.obfuscated = true;
        Ok(())
    }

    /// Replace the token with its MASK.
    pub fn apply_mask(&mut self) -> Result<()> {
        if self.obfuscated {
            return Ok(());
        }
        self.calculate_last4();
        let Some(token) = self.token.as_deref() else {
            return Ok(());
        };
        let masked = khash::mask_token(token)?;
        self.token = Some(masked);
        self.obfuscated = true;
        Ok(())
    }
}

impl fmt::Debug for PaymentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match (&self.token, self.obfuscated) {
            (None, _) => None,
            (Some(value), true) => Some(value.as_str()),
            (Some(_), false) => Some("[REDACTED]"),
        };
        f.debug_struct("PaymentToken")
            .field("payment_type", &self.payment_type)
            .field("token", &token)
            .field("last4", &self.last4)
            .field("obfuscated", &self.obfuscated)
            .finish()
    }
}
