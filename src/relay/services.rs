use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use reqwest::{
    header::{ACCEPT, ORIGIN, REFERER},
    Client,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{
    config::{Credential, PortalConfig},
    error::AppError,
    relay::dto::DataKind,
    state::RelayState,
};

/// The two upstream hops: portal login, then the authenticated data API.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Returns the raw login response body.
    async fn login(&self, credential: &Credential) -> anyhow::Result<Value>;
    async fn fetch(&self, kind: DataKind, token: &str) -> anyhow::Result<Value>;
}

#[derive(Clone)]
pub struct HttpPortal {
    client: Client,
    config: PortalConfig,
}

impl HttpPortal {
    pub fn new(config: PortalConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("build http client")?;
        Ok(Self { client, config })
    }

    fn data_url(&self, kind: DataKind) -> String {
        format!(
            "{}/{}",
            self.config.data_base_url.trim_end_matches('/'),
            kind.path()
        )
    }
}

#[async_trait]
impl Portal for HttpPortal {
    async fn login(&self, credential: &Credential) -> anyhow::Result<Value> {
        let res = self
            .client
            .post(&self.config.login_url)
            .header(ORIGIN, &self.config.login_origin)
            .json(&json!({
                "mobilenumber": credential.mobile_number,
                "password": credential.password,
            }))
            .send()
            .await
            .context("portal login request")?;
        debug!(status = %res.status(), "portal login responded");
        res.json::<Value>()
            .await
            .context("decode portal login response")
    }

    async fn fetch(&self, kind: DataKind, token: &str) -> anyhow::Result<Value> {
        let url = self.data_url(kind);
        let res = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(ORIGIN, &self.config.data_origin)
            .header(REFERER, format!("{}/", self.config.data_origin))
            .bearer_auth(token)
            .json(&json!({ "method": kind.method() }))
            .send()
            .await
            .with_context(|| format!("data api request {}", url))?;
        debug!(status = %res.status(), kind = ?kind, "data api responded");
        res.json::<Value>()
            .await
            .with_context(|| format!("decode data api response {}", url))
    }
}

/// A usable bearer token: present, a string, and non-empty.
pub(crate) fn bearer_token(login: &Value) -> Option<&str> {
    login
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}

/// Resolves the PIN, logs in, and relays the downstream JSON untouched.
/// Every call re-authenticates.
pub async fn relay(
    state: &RelayState,
    pin: Option<&str>,
    kind: DataKind,
) -> Result<Value, AppError> {
    let credential = match pin.and_then(|p| state.config.credentials.get(p)) {
        Some(c) => c,
        None => {
            warn!(kind = ?kind, "unknown pin");
            return Err(AppError::InvalidPin);
        }
    };

    let login = state
        .portal
        .login(credential)
        .await
        .map_err(AppError::Upstream)?;

    let Some(token) = bearer_token(&login) else {
        warn!(mobile = %credential.mobile_number, "portal login returned no token");
        return Err(AppError::LoginFailed);
    };

    let data = state
        .portal
        .fetch(kind, token)
        .await
        .map_err(AppError::Upstream)?;

    info!(kind = ?kind, "relayed portal data");
    Ok(data)
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::fake::FakePortal;
    use super::*;

    #[test]
    fn bearer_token_requires_non_empty_string() {
        assert_eq!(bearer_token(&json!({ "token": "abc" })), Some("abc"));
        assert_eq!(bearer_token(&json!({ "token": "" })), None);
        assert_eq!(bearer_token(&json!({ "token": null })), None);
        assert_eq!(bearer_token(&json!({ "token": 42 })), None);
        assert_eq!(bearer_token(&json!({ "message": "bad password" })), None);
    }

    #[test]
    fn data_url_joins_base_and_kind() {
        let portal = HttpPortal::new(PortalConfig {
            login_url: "http://portal.test/login".into(),
            login_origin: "http://portal.test".into(),
            data_base_url: "http://data.test/api/".into(),
            data_origin: "http://app.test".into(),
            timeout_secs: Some(5),
        })
        .expect("client builds");
        assert_eq!(portal.data_url(DataKind::Attendance), "http://data.test/api/attendance");
        assert_eq!(portal.data_url(DataKind::Profile), "http://data.test/api/profile");
    }

    #[tokio::test]
    async fn unknown_pin_makes_no_network_call() {
        let portal = Arc::new(FakePortal::with_login(json!({ "token": "t" })));
        let state = RelayState::fake(portal.clone());

        for pin in [Some("000000"), Some(""), None] {
            let err = relay(&state, pin, DataKind::Attendance).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidPin));
        }
        assert_eq!(portal.logins(), 0);
        assert_eq!(portal.fetches(), 0);
    }

    #[tokio::test]
    async fn missing_token_never_reaches_data_api() {
        let portal = Arc::new(FakePortal::with_login(json!({ "error": "invalid" })));
        let state = RelayState::fake(portal.clone());

        let err = relay(&state, Some("123456"), DataKind::Profile).await.unwrap_err();
        assert!(matches!(err, AppError::LoginFailed));
        assert_eq!(portal.logins(), 1);
        assert_eq!(portal.fetches(), 0);
    }

    #[tokio::test]
    async fn relays_downstream_json_verbatim() {
        let mut fake = FakePortal::with_login(json!({ "token": "t-1" }));
        fake.data_body = json!({ "overallattperformance": { "totalpercentage": 87.5 } });
        let portal = Arc::new(fake);
        let state = RelayState::fake(portal.clone());

        let data = relay(&state, Some("123456"), DataKind::Attendance).await.unwrap();
        assert_eq!(data, json!({ "overallattperformance": { "totalpercentage": 87.5 } }));
        assert_eq!(*portal.last_method.lock(), Some("314"));
    }

    #[tokio::test]
    async fn fetch_failure_is_upstream_error() {
        let mut fake = FakePortal::with_login(json!({ "token": "t-1" }));
        fake.fail_fetch = true;
        let state = RelayState::fake(Arc::new(fake));

        let err = relay(&state, Some("123456"), DataKind::Profile).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
