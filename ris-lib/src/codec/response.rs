//! Decoded RIS response and its typed accessors.
//!
//! The response is a flat `KEY=VALUE` map. Grouped data is spread over
//! indexed keys with a count field. RIS-native groups are 0-indexed while
//! Kount Central (`KC_*`) groups are 1-indexed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;

/// A rule triggered by the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTriggered {
    /// Rule id (`RULE_ID_i`).
    pub id: String,
    /// Rule description (`RULE_DESCRIPTION_i`).
    pub description: String,
}

/// A Kount Central event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KcEvent {
    /// `KC_EVENT_i_DECISION`
    pub decision: String,
    /// `KC_EVENT_i_EXPRESSION`
    pub expression: String,
    /// `KC_EVENT_i_CODE`
    pub code: String,
}

/// A rule counter triggered by the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// `COUNTER_NAME_i`
    pub name: String,
    /// `COUNTER_VALUE_i`
    pub value: String,
}

/// Decoded RIS response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    fields: BTreeMap<String, String>,
}

macro_rules! scalar_fields {
    ($($(#[$doc:meta])* $name:ident => $key:literal;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Option<&str> {
                self.get($key)
            }
        )*
    };
}

impl Response {
    /// Wrap already-decoded fields.
    pub fn from_fields(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    /// Parse a `KEY=VALUE` response body.
    pub fn parse(body: &str) -> Result<Self> {
        super::parse_response(body.as_bytes())
    }

    /// Raw value of any response key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the response has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields in key order.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    scalar_fields! {
        /// Response version (`VERS`).
        version => "VERS";
        /// Request mode echoed back (`MODE`).
        mode => "MODE";
        /// Merchant id (`MERC`).
        merchant_id => "MERC";
        /// Session id (`SESS`).
        session_id => "SESS";
        /// Kount transaction id (`TRAN`).
        transaction_id => "TRAN";
        /// Merchant order number (`ORDR`).
        order_number => "ORDR";
        /// Error code (`ERRO`), present on failed inquiries.
        error_code => "ERRO";
        /// Auto decision (`AUTO`): `A`, `R`, `D` or `E`.
        auto => "AUTO";
        /// Legacy reason (`REAS`).
        reason => "REAS";
        /// Merchant-defined decision reason code (`REASON_CODE`).
        reason_code => "REASON_CODE";
        /// Kount score (`SCOR`).
        score => "SCOR";
        /// Omniscore (`OMNISCORE`).
        omniscore => "OMNISCORE";
        /// Persona geolocation country (`GEOX`).
        geox => "GEOX";
        /// Card brand (`BRND`).
        brand => "BRND";
        /// Velocity (`VELO`).
        velo => "VELO";
        /// Maximum velocity (`VMAX`).
        vmax => "VMAX";
        /// Riskiest network type (`NETW`).
        network => "NETW";
        /// Know-your-customer flag (`KYCF`).
        know_your_customer => "KYCF";
        /// Device region (`REGN`).
        region => "REGN";
        /// Kaptcha flag (`KAPT`).
        kaptcha => "KAPT";
        /// Website id (`SITE`).
        site => "SITE";
        /// Proxy flag (`PROXY`).
        proxy => "PROXY";
        /// Number of emails in the persona (`EMAILS`).
        emails => "EMAILS";
        /// Country of the HTTP request (`HTTP_COUNTRY`).
        http_country => "HTTP_COUNTRY";
        /// Device timezone (`TIMEZONE`).
        time_zone => "TIMEZONE";
        /// Number of cards in the persona (`CARDS`).
        cards => "CARDS";
        /// Remote control flag (`PC_REMOTE`).
        pc_remote => "PC_REMOTE";
        /// Number of devices in the persona (`DEVICES`).
        devices => "DEVICES";
        /// Device layers (`DEVICE_LAYERS`).
        device_layers => "DEVICE_LAYERS";
        /// Mobile forwarder flag (`MOBILE_FORWARDER`).
        mobile_forwarder => "MOBILE_FORWARDER";
        /// Voice device flag (`VOICE_DEVICE`).
        voice_device => "VOICE_DEVICE";
        /// Device local time (`LOCALTIME`).
        local_time => "LOCALTIME";
        /// Mobile device type (`MOBILE_TYPE`).
        mobile_type => "MOBILE_TYPE";
        /// Device fingerprint (`FINGERPRINT`).
        fingerprint => "FINGERPRINT";
        /// Flash flag (`FLASH`).
        flash => "FLASH";
        /// Device language (`LANGUAGE`).
        language => "LANGUAGE";
        /// Device country (`COUNTRY`).
        country => "COUNTRY";
        /// JavaScript flag (`JAVASCRIPT`).
        javascript => "JAVASCRIPT";
        /// Cookies flag (`COOKIES`).
        cookies => "COOKIES";
        /// Mobile device flag (`MOBILE_DEVICE`).
        mobile_device => "MOBILE_DEVICE";
        /// Pierced IP address (`PIP_IPAD`).
        pierced_ip_address => "PIP_IPAD";
        /// Pierced IP latitude (`PIP_LAT`).
        pierced_ip_latitude => "PIP_LAT";
        /// Pierced IP longitude (`PIP_LON`).
        pierced_ip_longitude => "PIP_LON";
        /// Pierced IP country (`PIP_COUNTRY`).
        pierced_ip_country => "PIP_COUNTRY";
        /// Pierced IP region (`PIP_REGION`).
        pierced_ip_region => "PIP_REGION";
        /// Pierced IP city (`PIP_CITY`).
        pierced_ip_city => "PIP_CITY";
        /// Pierced IP organization (`PIP_ORG`).
        pierced_ip_organization => "PIP_ORG";
        /// Proxy IP address (`IP_IPAD`).
        ip_address => "IP_IPAD";
        /// Proxy IP latitude (`IP_LAT`).
        ip_latitude => "IP_LAT";
        /// Proxy IP longitude (`IP_LON`).
        ip_longitude => "IP_LON";
        /// Proxy IP country (`IP_COUNTRY`).
        ip_country => "IP_COUNTRY";
        /// Proxy IP region (`IP_REGION`).
        ip_region => "IP_REGION";
        /// Proxy IP city (`IP_CITY`).
        ip_city => "IP_CITY";
        /// Proxy IP organization (`IP_ORG`).
        ip_organization => "IP_ORG";
        /// Date the device was first seen (`DDFS`).
        device_first_seen => "DDFS";
        /// User agent string (`UAS`).
        user_agent => "UAS";
        /// Device screen resolution, height by width (`DSR`).
        screen_resolution => "DSR";
        /// Operating system (`OS`).
        os => "OS";
        /// Browser (`BROWSER`).
        browser => "BROWSER";
        /// Kount Central customer id (`KC_CUSTOMER_ID`).
        kc_customer_id => "KC_CUSTOMER_ID";
        /// Kount Central decision (`KC_DECISION`).
        kc_decision => "KC_DECISION";
        /// MasterCard fraud score (`MASTERCARD`).
        mastercard_fraud_score => "MASTERCARD";
        /// Previously whitelisted flag (`PREVIOUSLY_WHITELISTED`).
        previously_whitelisted => "PREVIOUSLY_WHITELISTED";
        /// 3-D Secure merchant response (`3D_SECURE_MERCHANT_RESPONSE`).
        three_d_secure_merchant_response => "3D_SECURE_MERCHANT_RESPONSE";
    }

    /// Parse a count field, defaulting to 0.
    fn count(&self, key: &str) -> usize {
        match self.get(key) {
            None => {
                debug!(key, "Count field absent, assuming 0");
                0
            }
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = raw, "Count field is not a number, assuming 0");
                0
            }),
        }
    }

    /// Count used to walk an indexed group. Every item needs at least one
    /// field, so a count above the field total is clamped to it.
    fn group_len(&self, key: &str) -> usize {
        let count = self.count(key);
        let limit = self.fields.len();
        if count > limit {
            warn!(key, count, limit, "Count field exceeds response size, clamping");
            limit
        } else {
            count
        }
    }

    fn item(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Number of rules triggered (`RULES_TRIGGERED`).
    pub fn rules_triggered_count(&self) -> usize {
        self.count("RULES_TRIGGERED")
    }

    /// Rules triggered, in index order.
    pub fn rules_triggered(&self) -> Vec<RuleTriggered> {
        (0..self.group_len("RULES_TRIGGERED"))
            .map(|i| RuleTriggered {
                id: self.item(&format!("RULE_ID_{}", i)),
                description: self.item(&format!("RULE_DESCRIPTION_{}", i)),
            })
            .collect()
    }

    /// Number of warnings (`WARNING_COUNT`).
    pub fn warning_count(&self) -> usize {
        self.count("WARNING_COUNT")
    }

    /// Warnings (`WARNING_0` ..).
    pub fn warnings(&self) -> Vec<String> {
        (0..self.group_len("WARNING_COUNT"))
            .map(|i| self.item(&format!("WARNING_{}", i)))
            .collect()
    }

    /// Number of errors (`ERROR_COUNT`). Absent on successful responses.
    pub fn error_count(&self) -> usize {
        self.count("ERROR_COUNT")
    }

    /// Errors (`ERROR_0` ..).
    pub fn errors(&self) -> Vec<String> {
        (0..self.group_len("ERROR_COUNT"))
            .map(|i| self.item(&format!("ERROR_{}", i)))
            .collect()
    }

    /// Whether the response reports any error.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of Kount Central warnings (`KC_WARNING_COUNT`).
    pub fn kc_warning_count(&self) -> usize {
        self.count("KC_WARNING_COUNT")
    }

    /// Kount Central warnings (`KC_WARNING_1` ..).
    pub fn kc_warnings(&self) -> Vec<String> {
        (1..=self.group_len("KC_WARNING_COUNT"))
            .map(|i| self.item(&format!("KC_WARNING_{}", i)))
            .collect()
    }

    /// Number of Kount Central errors (`KC_ERROR_COUNT`).
    pub fn kc_error_count(&self) -> usize {
        self.count("KC_ERROR_COUNT")
    }

    /// Kount Central errors (`KC_ERROR_1` ..).
    pub fn kc_errors(&self) -> Vec<String> {
        (1..=self.group_len("KC_ERROR_COUNT"))
            .map(|i| self.item(&format!("KC_ERROR_{}", i)))
            .collect()
    }

    /// Number of Kount Central events (`KC_TRIGGERED_COUNT`).
    pub fn kc_event_count(&self) -> usize {
        self.count("KC_TRIGGERED_COUNT")
    }

    /// Kount Central events (`KC_EVENT_1_*` ..).
    pub fn kc_events(&self) -> Vec<KcEvent> {
        (1..=self.group_len("KC_TRIGGERED_COUNT"))
            .map(|i| KcEvent {
                decision: self.item(&format!("KC_EVENT_{}_DECISION", i)),
                expression: self.item(&format!("KC_EVENT_{}_EXPRESSION", i)),
                code: self.item(&format!("KC_EVENT_{}_CODE", i)),
            })
            .collect()
    }

    /// Number of counters triggered (`COUNTERS_TRIGGERED`).
    pub fn counters_triggered_count(&self) -> usize {
        self.count("COUNTERS_TRIGGERED")
    }

    /// Counters triggered, in index order.
    pub fn counters_triggered(&self) -> Vec<Counter> {
        (0..self.group_len("COUNTERS_TRIGGERED"))
            .map(|i| Counter {
                name: self.item(&format!("COUNTER_NAME_{}", i)),
                value: self.item(&format!("COUNTER_VALUE_{}", i)),
            })
            .collect()
    }

    /// Fields whose key starts with `prefix`, keyed with the prefix stripped.
    pub fn prefixed(&self, prefix: &str) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .map(|stripped| (stripped.to_string(), value.clone()))
            })
            .collect()
    }

    /// LexisNexis Chargeback Defender attributes (`CBD_*`).
    pub fn lexis_nexis_cbd_attributes(&self) -> BTreeMap<String, String> {
        self.prefixed("CBD_")
    }

    /// LexisNexis Instant ID attributes (`INSTANTID_*`).
    pub fn lexis_nexis_instant_id_attributes(&self) -> BTreeMap<String, String> {
        self.prefixed("INSTANTID_")
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.fields {
            writeln!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
