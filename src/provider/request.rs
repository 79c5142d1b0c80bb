//! Per-operation parameter shapes expected by the provider.
//!
//! Each builder validates its input and returns the flat [`SignableRequest`]
//! that is signed and posted to the matching [`Endpoint`].

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::crypto::params::{ParamValue, SignableRequest};
use crate::error::ValidationError;
use crate::provider::target::Endpoint;

pub const PAYMENT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Phone,
    Email,
    Profile,
}

impl IdentifierKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            IdentifierKind::Phone => "phone",
            IdentifierKind::Email => "email",
            IdentifierKind::Profile => "profile",
        }
    }

    /// Provider parameter carrying this identifier, if the provider has one.
    pub const fn provider_field(self) -> Option<&'static str> {
        match self {
            IdentifierKind::Phone => Some("customer_phone"),
            IdentifierKind::Email => Some("customer_email"),
            IdentifierKind::Profile => None,
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The customer a subscription belongs to, addressed by exactly one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub value: String,
}

impl Identifier {
    pub fn new(kind: IdentifierKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Picks the identifier out of the optional inbound fields.
    ///
    /// Empty strings count as absent. Returns `Ok(None)` when nothing was
    /// supplied and an error when more than one field was.
    pub fn from_fields(
        phone: Option<&str>,
        email: Option<&str>,
        profile: Option<&str>,
    ) -> Result<Option<Self>, ValidationError> {
        let mut present = [
            (IdentifierKind::Phone, phone),
            (IdentifierKind::Email, email),
            (IdentifierKind::Profile, profile),
        ]
        .into_iter()
        .filter_map(|(kind, value)| value.filter(|v| !v.is_empty()).map(|v| (kind, v)));

        match (present.next(), present.next()) {
            (None, _) => Ok(None),
            (Some((kind, value)), None) => Ok(Some(Identifier::new(kind, value))),
            (Some(_), Some(_)) => Err(ValidationError::ConflictingIdentifiers),
        }
    }

    fn provider_field(&self, endpoint: Endpoint) -> Result<&'static str, ValidationError> {
        self.kind
            .provider_field()
            .ok_or(ValidationError::UnsupportedIdentifier {
                endpoint,
                kind: self.kind,
            })
    }
}

/// Parameters for [`Endpoint::SetActivity`].
pub fn activate_subscription(
    subscription: impl Into<ParamValue>,
    identifier: &Identifier,
    is_active: bool,
) -> Result<SignableRequest, ValidationError> {
    let field = identifier.provider_field(Endpoint::SetActivity)?;

    Ok(SignableRequest::new()
        .with("subscription", subscription)
        .with("active_user", if is_active { "1" } else { "0" })
        .with(field, identifier.value.as_str()))
}

/// Parameters for [`Endpoint::SetSubscriptionDiscount`].
///
/// The discount is forwarded in the form it was given, after checking it is a
/// number within `0..=100`.
pub fn set_discount(
    subscription: impl Into<ParamValue>,
    discount: ParamValue,
) -> Result<SignableRequest, ValidationError> {
    let percent = discount_percent(&discount)?;
    if !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::DiscountOutOfRange(percent));
    }

    Ok(SignableRequest::new()
        .with("subscription_id", subscription)
        .with("discount", discount))
}

fn discount_percent(discount: &ParamValue) -> Result<f64, ValidationError> {
    match discount {
        ParamValue::Int(i) => Ok(*i as f64),
        ParamValue::Float(f) => Ok(*f),
        ParamValue::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidDiscount),
        ParamValue::Bool(_) => Err(ValidationError::InvalidDiscount),
    }
}

/// Parameters for [`Endpoint::SetSubscriptionPaymentDate`].
///
/// `now` is the current local wall-clock time; the new date must be after it.
pub fn set_payment_date(
    subscription: impl Into<ParamValue>,
    date: &str,
    identifier: &Identifier,
    now: NaiveDateTime,
) -> Result<SignableRequest, ValidationError> {
    parse_payment_date(date, now)?;
    let field = identifier.provider_field(Endpoint::SetSubscriptionPaymentDate)?;

    Ok(SignableRequest::new()
        .with("subscription", subscription)
        .with("date", date)
        .with("auth_type", field)
        .with(field, identifier.value.as_str()))
}

/// Parses a `YYYY-MM-DD HH:MM` date strictly after `now`.
pub fn parse_payment_date(date: &str, now: NaiveDateTime) -> Result<NaiveDateTime, ValidationError> {
    if !has_payment_date_shape(date) {
        return Err(ValidationError::InvalidDateFormat(date.to_owned()));
    }

    let parsed = NaiveDateTime::parse_from_str(date, PAYMENT_DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDateFormat(date.to_owned()))?;

    if parsed <= now {
        return Err(ValidationError::DateNotInFuture(date.to_owned()));
    }

    Ok(parsed)
}

/// Zero-padded `dddd-dd-dd dd:dd`; chrono alone would accept unpadded fields.
fn has_payment_date_shape(date: &str) -> bool {
    const SHAPE: &[u8; 16] = b"dddd-dd-dd dd:dd";

    date.len() == SHAPE.len()
        && date.bytes().zip(SHAPE.iter()).all(|(byte, expected)| match expected {
            b'd' => byte.is_ascii_digit(),
            other => byte == *other,
        })
}
