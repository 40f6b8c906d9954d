//! Card detection request and response types.

use jiff::{Timestamp, tz::TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card_detection::{
    CardDetectionError,
    crypto::{ParamValue, SignParams},
    regions::{
        AMAZON_REGIONS, ITUNES_REGIONS, RAZER_REGIONS, XBOX_REGIONS, contains_id, contains_name,
    },
};

/// Card-issuing product families known to the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductMark {
    Sephora,
    Razer,
    ITunes,
    Amazon,
    Xbox,
    Nike,
    Nd,
}

impl ProductMark {
    pub const ALL: [Self; 7] = [
        Self::Sephora,
        Self::Razer,
        Self::ITunes,
        Self::Amazon,
        Self::Xbox,
        Self::Nike,
        Self::Nd,
    ];

    /// Wire tag, case-sensitive.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sephora => "sephora",
            Self::Razer => "Razer",
            Self::ITunes => "iTunes",
            Self::Amazon => "amazon",
            Self::Xbox => "xBox",
            Self::Nike => "nike",
            Self::Nd => "nd",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mark| mark.as_str() == tag)
    }

    /// Result queries for these products must carry a PIN.
    #[must_use]
    pub const fn requires_pin(self) -> bool {
        matches!(self, Self::Sephora | Self::Nike | Self::Nd)
    }
}

/// Upstream card status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    Waiting,
    Testing,
    Valid,
    Invalid,
    Redeemed,
    Failed,
    LowPoints,
}

impl CardStatus {
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => Self::Waiting,
            1 => Self::Testing,
            2 => Self::Valid,
            3 => Self::Invalid,
            4 => Self::Redeemed,
            5 => Self::Failed,
            6 => Self::LowPoints,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn code(self) -> i64 {
        self as i64
    }
}

/// Submit a batch of cards for checking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCardRequest {
    pub cards: Vec<String>,
    pub product_mark: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_type: Option<i32>,
}

impl CheckCardRequest {
    /// Region id, treating zero as absent.
    #[must_use]
    pub fn region_id(&self) -> Option<i32> {
        self.region_id.filter(|id| *id != 0)
    }

    #[must_use]
    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref().filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn auto_type(&self) -> Option<i32> {
        self.auto_type.filter(|auto| *auto != 0)
    }

    /// Check product-specific region requirements.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for missing data and `UnsupportedRegion` for regions outside
    /// the product's table.
    pub fn validate(&self) -> Result<(), CardDetectionError> {
        if self.cards.is_empty() {
            return Err(CardDetectionError::invalid_request("cards cannot be empty"));
        }

        if self.product_mark.is_empty() {
            return Err(CardDetectionError::invalid_product_mark());
        }

        let Some(mark) = ProductMark::from_tag(&self.product_mark) else {
            return Ok(());
        };

        match mark {
            ProductMark::ITunes => match self.region_id() {
                None if self.auto_type() != Some(1) => Err(CardDetectionError::invalid_request(
                    "iTunes cards require regionId or autoType=1",
                )),
                Some(id) if !contains_id(ITUNES_REGIONS, id) => {
                    Err(CardDetectionError::unsupported_region())
                }
                _ => Ok(()),
            },
            ProductMark::Amazon => {
                require_region_id(self.region_id(), AMAZON_REGIONS, "Amazon cards require regionId")
            }
            ProductMark::Razer => {
                require_region_id(self.region_id(), RAZER_REGIONS, "Razer cards require regionId")
            }
            ProductMark::Xbox => match self.region_name() {
                None => Err(CardDetectionError::invalid_request(
                    "Xbox cards require regionName",
                )),
                Some(name) if !contains_name(XBOX_REGIONS, name) => {
                    Err(CardDetectionError::unsupported_region())
                }
                Some(_) => Ok(()),
            },
            ProductMark::Sephora | ProductMark::Nike | ProductMark::Nd => Ok(()),
        }
    }
}

fn require_region_id(
    id: Option<i32>,
    table: &[crate::card_detection::regions::Region],
    missing: &str,
) -> Result<(), CardDetectionError> {
    match id {
        None => Err(CardDetectionError::invalid_request(missing)),
        Some(id) if !contains_id(table, id) => Err(CardDetectionError::unsupported_region()),
        Some(_) => Ok(()),
    }
}

/// Fetch the result for one card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCardResultRequest {
    pub product_mark: String,
    pub card_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_code: Option<String>,
}

impl CheckCardResultRequest {
    #[must_use]
    pub fn pin_code(&self) -> Option<&str> {
        self.pin_code.as_deref().filter(|pin| !pin.is_empty())
    }

    /// # Errors
    ///
    /// Returns `InvalidRequest` when the card number, product or a required PIN is missing.
    pub fn validate(&self) -> Result<(), CardDetectionError> {
        if self.card_no.is_empty() {
            return Err(CardDetectionError::invalid_request("cardNo cannot be empty"));
        }

        if self.product_mark.is_empty() {
            return Err(CardDetectionError::invalid_product_mark());
        }

        let needs_pin = ProductMark::from_tag(&self.product_mark).is_some_and(ProductMark::requires_pin);

        if needs_pin && self.pin_code().is_none() {
            return Err(CardDetectionError::invalid_request(format!(
                "{} cards require pinCode",
                self.product_mark
            )));
        }

        Ok(())
    }
}

/// Upstream envelope for a batch submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCardResponse {
    pub code: i32,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: bool,
}

/// Upstream envelope for a result query; `data` is hex ciphertext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCardResultResponse {
    pub code: i32,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: String,
}

/// Decrypted result for one card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResult {
    #[serde(default)]
    pub card_no: String,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub pin_code: String,
    #[serde(default)]
    pub message: String,
    /// Either a preformatted string or a Unix timestamp.
    #[serde(default)]
    pub check_time: Value,
    #[serde(default)]
    pub region_name: String,
    #[serde(default, alias = "regionID")]
    pub region_id: i64,
}

impl CardResult {
    #[must_use]
    pub fn card_status(&self) -> Option<CardStatus> {
        CardStatus::from_code(self.status)
    }

    /// Check time as `YYYY-MM-DD HH:MM:SS` local time for Unix timestamps, otherwise as sent.
    #[must_use]
    pub fn check_time_string(&self) -> String {
        format_check_time(&self.check_time, &TimeZone::system())
    }
}

fn format_check_time(value: &Value, tz: &TimeZone) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Number(number) => {
            let Some(seconds) = number.as_f64() else {
                return number.to_string();
            };

            if seconds > 1_000_000_000.0 {
                #[allow(clippy::cast_possible_truncation)]
                let whole = seconds.trunc() as i64;

                if let Ok(timestamp) = Timestamp::from_second(whole) {
                    return timestamp
                        .to_zoned(tz.clone())
                        .strftime("%Y-%m-%d %H:%M:%S")
                        .to_string();
                }
            }

            format!("{seconds:.0}")
        }
        other => other.to_string(),
    }
}

/// Plaintext request body before encryption. Field order matches the upstream.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub card_no: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pin_code: String,
    pub product_mark: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_type: Option<i32>,
    pub timestamp: String,
    pub sign: String,
}

impl WireRequest {
    pub(crate) fn for_check(request: &CheckCardRequest, timestamp: String) -> Self {
        Self {
            cards: request.cards.clone(),
            product_mark: request.product_mark.clone(),
            region_id: request.region_id(),
            region_name: request.region_name().unwrap_or_default().to_string(),
            auto_type: request.auto_type(),
            timestamp,
            ..Self::default()
        }
    }

    pub(crate) fn for_result(request: &CheckCardResultRequest, timestamp: String) -> Self {
        Self {
            card_no: request.card_no.clone(),
            pin_code: request.pin_code().unwrap_or_default().to_string(),
            product_mark: request.product_mark.clone(),
            timestamp,
            ..Self::default()
        }
    }

    /// Non-empty fields in canonical form.
    pub(crate) fn sign_params(&self) -> SignParams {
        let mut params = SignParams::new();

        if !self.cards.is_empty() {
            params.insert("cards".into(), ParamValue::List(self.cards.clone()));
        }

        let texts = [
            ("cardNo", &self.card_no),
            ("pinCode", &self.pin_code),
            ("productMark", &self.product_mark),
            ("regionName", &self.region_name),
            ("timestamp", &self.timestamp),
        ];

        for (key, value) in texts {
            if !value.is_empty() {
                params.insert(key.into(), ParamValue::Text(value.clone()));
            }
        }

        if let Some(id) = self.region_id {
            params.insert("regionId".into(), ParamValue::Number(id.into()));
        }

        if let Some(auto) = self.auto_type {
            params.insert("autoType".into(), ParamValue::Number(auto.into()));
        }

        params
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct EncryptedPayload {
    pub data: String,
}
