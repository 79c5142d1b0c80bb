use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::Local;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::crypto::params::ParamValue;
use crate::error::{ApiError, Error, ValidationError};
use crate::provider::request::Identifier;
use crate::state::AppState;

const ACTIVITY_FAILED: &str = "Failed to update subscription activity";
const DISCOUNT_FAILED: &str = "Failed to update subscription discount";
const PAYMENT_DATE_FAILED: &str = "Failed to update subscription payment date";

const IDENTIFIER_FIELDS: &str = "phone, email, or profile";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActivityBody {
    prodamus_url: Option<String>,
    secret_key: Option<String>,
    subscription: Option<ParamValue>,
    phone: Option<ParamValue>,
    email: Option<ParamValue>,
    profile: Option<ParamValue>,
    is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDiscountBody {
    prodamus_url: Option<String>,
    secret_key: Option<String>,
    subscription: Option<ParamValue>,
    discount: Option<ParamValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPaymentDateBody {
    prodamus_url: Option<String>,
    secret_key: Option<String>,
    subscription: Option<ParamValue>,
    date: Option<String>,
    phone: Option<ParamValue>,
    email: Option<ParamValue>,
    profile: Option<ParamValue>,
}

/// Collects every missing required field so they are reported together.
///
/// Accessors return a placeholder for absent fields; [`RequiredFields::finish`]
/// fails whenever one was handed out.
#[derive(Default)]
struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    fn text(&mut self, name: &'static str, value: Option<String>) -> String {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    /// A required scalar where `0` and `false` are meaningful, such as a discount.
    fn scalar(&mut self, name: &'static str, value: Option<ParamValue>) -> ParamValue {
        self.scalar_where(name, value, |v| !v.is_blank())
    }

    /// A required scalar that also counts `0` and `false` as missing.
    fn truthy(&mut self, name: &'static str, value: Option<ParamValue>) -> ParamValue {
        self.scalar_where(name, value, |v| !v.is_falsy())
    }

    fn scalar_where(
        &mut self,
        name: &'static str,
        value: Option<ParamValue>,
        present: fn(&ParamValue) -> bool,
    ) -> ParamValue {
        match value.filter(present) {
            Some(value) => value,
            None => {
                self.missing.push(name);
                ParamValue::Str(String::new())
            }
        }
    }

    fn flag(&mut self, name: &'static str, value: Option<bool>) -> bool {
        value.unwrap_or_else(|| {
            self.missing.push(name);
            false
        })
    }

    /// Identifier fields may arrive as numbers (a bare phone number); they are
    /// forwarded in their string form.
    fn identifier(
        &mut self,
        phone: Option<ParamValue>,
        email: Option<ParamValue>,
        profile: Option<ParamValue>,
    ) -> Result<Option<Identifier>, ValidationError> {
        let [phone, email, profile] = [phone, email, profile]
            .map(|field| field.filter(|v| !v.is_falsy()).map(|v| v.to_string()));
        let identifier =
            Identifier::from_fields(phone.as_deref(), email.as_deref(), profile.as_deref());
        if matches!(identifier, Ok(None)) {
            self.missing.push(IDENTIFIER_FIELDS);
        }
        identifier
    }

    fn finish(self, example: Value) -> Result<(), ValidationError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingParameters {
                missing: self.missing,
                example,
            })
        }
    }
}

fn missing_identifier(example: Value) -> ValidationError {
    ValidationError::MissingParameters {
        missing: vec![IDENTIFIER_FIELDS],
        example,
    }
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ValidationError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))
}

fn activity_example() -> Value {
    json!({
        "prodamusUrl": "https://example.payform.ru",
        "secretKey": "your_secret_key",
        "subscription": "123456",
        "phone": "+79001234567",
        "email": "user@example.com (instead of phone)",
        "profile": "user_profile_id (instead of phone)",
        "isActive": false
    })
}

fn discount_example() -> Value {
    json!({
        "prodamusUrl": "https://example.payform.ru",
        "secretKey": "your_secret_key",
        "subscription": "123456",
        "discount": 25
    })
}

fn payment_date_example() -> Value {
    json!({
        "prodamusUrl": "https://example.payform.ru",
        "secretKey": "your_secret_key",
        "subscription": "123456",
        "date": "2025-12-31 23:59",
        "phone": "+79001234567",
        "email": "user@example.com (instead of phone)",
        "profile": "user_profile_id (instead of phone)"
    })
}

/// `POST /setActivity`
pub async fn set_activity(
    State(state): State<AppState>,
    payload: Result<Json<SetActivityBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let fail = |error: Error| ApiError::new(ACTIVITY_FAILED, error, state.expose_internal());

    let body = parse_body(payload).map_err(|e| fail(e.into()))?;

    let mut fields = RequiredFields::default();
    let prodamus_url = fields.text("prodamusUrl", body.prodamus_url);
    let secret_key = fields.text("secretKey", body.secret_key);
    let subscription = fields.truthy("subscription", body.subscription);
    let identifier = fields.identifier(body.phone, body.email, body.profile);
    let is_active = fields.flag("isActive", body.is_active);
    fields.finish(activity_example()).map_err(|e| fail(e.into()))?;

    let identifier = identifier
        .map_err(|e| fail(e.into()))?
        .ok_or_else(|| fail(missing_identifier(activity_example()).into()))?;

    let data = state
        .client
        .set_activity(
            &prodamus_url,
            &secret_key,
            subscription.clone(),
            &identifier,
            is_active,
        )
        .await
        .map_err(fail)?;

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Subscription {} successfully",
            if is_active { "activated" } else { "deactivated" }
        ),
        "data": data,
        "request": {
            "subscription": subscription,
            "identifier": identifier.value,
            "identifierType": identifier.kind,
            "isActive": is_active,
        }
    })))
}

/// `POST /setSubscriptionDiscount`
pub async fn set_subscription_discount(
    State(state): State<AppState>,
    payload: Result<Json<SetDiscountBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let fail = |error: Error| ApiError::new(DISCOUNT_FAILED, error, state.expose_internal());

    let body = parse_body(payload).map_err(|e| fail(e.into()))?;

    let mut fields = RequiredFields::default();
    let prodamus_url = fields.text("prodamusUrl", body.prodamus_url);
    let secret_key = fields.text("secretKey", body.secret_key);
    let subscription = fields.truthy("subscription", body.subscription);
    let discount = fields.scalar("discount", body.discount);
    fields.finish(discount_example()).map_err(|e| fail(e.into()))?;

    let data = state
        .client
        .set_subscription_discount(
            &prodamus_url,
            &secret_key,
            subscription.clone(),
            discount.clone(),
        )
        .await
        .map_err(fail)?;

    Ok(Json(json!({
        "success": true,
        "message": "Subscription discount updated successfully",
        "data": data,
        "request": {
            "subscription": subscription,
            "discount": discount,
        }
    })))
}

/// `POST /setSubscriptionPaymentDate`
pub async fn set_subscription_payment_date(
    State(state): State<AppState>,
    payload: Result<Json<SetPaymentDateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let fail = |error: Error| ApiError::new(PAYMENT_DATE_FAILED, error, state.expose_internal());

    let body = parse_body(payload).map_err(|e| fail(e.into()))?;

    let mut fields = RequiredFields::default();
    let prodamus_url = fields.text("prodamusUrl", body.prodamus_url);
    let secret_key = fields.text("secretKey", body.secret_key);
    let subscription = fields.truthy("subscription", body.subscription);
    let date = fields.text("date", body.date);
    let identifier = fields.identifier(body.phone, body.email, body.profile);
    fields.finish(payment_date_example()).map_err(|e| fail(e.into()))?;

    let identifier = identifier
        .map_err(|e| fail(e.into()))?
        .ok_or_else(|| fail(missing_identifier(payment_date_example()).into()))?;

    let data = state
        .client
        .set_subscription_payment_date(
            &prodamus_url,
            &secret_key,
            subscription.clone(),
            &date,
            &identifier,
            Local::now().naive_local(),
        )
        .await
        .map_err(fail)?;

    Ok(Json(json!({
        "success": true,
        "message": "Subscription payment date updated successfully",
        "data": data,
        "request": {
            "subscription": subscription,
            "newDate": date,
            "identifier": identifier.value,
            "identifierType": identifier.kind,
        }
    })))
}
