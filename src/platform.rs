//! Lookups against the hosting platform's member API.
//!
//! The platform answers identity queries with a one-element JSON array:
//! the member's name (or id) on success, the string `"false"` when no such
//! member exists.

use serde_json::Value;

use crate::error::{AppError, AppResult};

pub async fn member_name_by_id(client: &reqwest::Client, member_id: i64) -> AppResult<Option<String>> {
    let url = format!("{}/Member/IdentifyById", *crate::env::PLATFORM_API_URL);
    let response = client
        .get(url)
        .query(&[("userid", member_id)])
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(AppError::PlatformApi(format!(
            "member lookup by id returned {}",
            response.status(),
        )));
    }
    let body: Value = response.json().await?;

    match first_element(&body)? {
        Value::String(s) if s == "false" => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(AppError::PlatformApi(format!(
            "unexpected member name payload: {other}"
        ))),
    }
}

pub async fn member_id_by_name(client: &reqwest::Client, name: &str) -> AppResult<Option<i64>> {
    let url = format!("{}/Member/Identify", *crate::env::PLATFORM_API_URL);
    let response = client.get(url).query(&[("username", name)]).send().await?;
    if !response.status().is_success() {
        return Err(AppError::PlatformApi(format!(
            "member lookup by name returned {}",
            response.status(),
        )));
    }
    let body: Value = response.json().await?;

    match first_element(&body)? {
        Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| {
            AppError::PlatformApi(format!("member id out of range: {n}"))
        }),
        Value::String(s) => match s.parse::<i64>() {
            Ok(id) => Ok(Some(id)),
            // "false", or any other non-numeric answer
            Err(_) => Ok(None),
        },
        other => Err(AppError::PlatformApi(format!(
            "unexpected member id payload: {other}"
        ))),
    }
}

fn first_element(body: &Value) -> AppResult<&Value> {
    body.as_array()
        .and_then(|elements| elements.first())
        .ok_or_else(|| AppError::PlatformApi(format!("unexpected response shape: {body}")))
}
