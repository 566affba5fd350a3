use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use url::Url;

use super::{AccessService, AuthUser, Device, License, NewDevice, Session, UpgradePlan};

const DEVICE_COLUMNS: &str = "id,device_name,device_fingerprint,last_seen,active,created_at";

/// REST client for the hosted auth (`/auth/v1`) and table (`/rest/v1`) APIs.
pub struct SupabaseAccess {
    client: Client,
    base: Url,
    anon_key: String,
    session: RwLock<Option<Session>>,
}

impl SupabaseAccess {
    pub fn new(base: &str, anon_key: &str) -> Result<Self> {
        // `Url::join` drops the last path segment unless it ends in '/'.
        let with_slash = format!("{}/", base.trim_end_matches('/'));
        let base = Url::parse(&with_slash).with_context(|| format!("invalid service url {}", base))?;
        Ok(Self {
            client: Client::new(),
            base,
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
        })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Table endpoint with PostgREST filters.
    fn table(&self, table: &str, query: &[(&str, String)]) -> Result<Url> {
        self.url(&format!("rest/v1/{}", table), query)
    }

    /// Request carrying the project key and, when signed in, the user token.
    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", token))
    }

    async fn fetch<T: DeserializeOwned>(&self, op: &str, req: RequestBuilder) -> Result<T> {
        let resp = checked(op, req.send().await?).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).with_context(|| format!("{}: unexpected response", op))
    }

    async fn execute(&self, op: &str, req: RequestBuilder) -> Result<()> {
        checked(op, req.send().await?).await?;
        Ok(())
    }

    async fn store_session(&self, session: Session) -> AuthUser {
        let user = session.user.clone();
        *self.session.write().await = Some(session);
        user
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn eq(v: &str) -> String {
    format!("eq.{}", v)
}

/// Turn a non-2xx response into an error carrying the service's message.
async fn checked(op: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or(body);
    Err(anyhow!("{} failed: {} - {}", op, status.as_u16(), msg))
}

/// Total from a `Content-Range` header such as `0-4/5` or `*/0`.
fn parse_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .and_then(|s| s.rsplit('/').next())
        .and_then(|n| n.parse().ok())
}

/// Sign-up answers with a full session when confirmation is off, or with
/// the bare user otherwise.
fn parse_sign_up(body: Value) -> Result<(AuthUser, Option<Session>)> {
    if body.get("access_token").is_some() {
        let session: Session = serde_json::from_value(body)?;
        return Ok((session.user.clone(), Some(session)));
    }
    let user_value = body.get("user").cloned().unwrap_or(body);
    let user: AuthUser = serde_json::from_value(user_value).context("sign_up: missing user")?;
    Ok((user, None))
}

#[async_trait::async_trait]
impl AccessService for SupabaseAccess {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let url = self.url("auth/v1/signup", &[])?;
        let req = self
            .request(Method::POST, url)
            .await
            .json(&json!({ "email": email, "password": password }));
        let body: Value = self.fetch("sign_up", req).await?;
        let (user, session) = parse_sign_up(body)?;
        if let Some(session) = session {
            self.store_session(session).await;
        }
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let url = self.url("auth/v1/token", &[("grant_type", "password".to_string())])?;
        let req = self
            .request(Method::POST, url)
            .await
            .json(&json!({ "email": email, "password": password }));
        let session: Session = self.fetch("sign_in", req).await?;
        Ok(self.store_session(session).await)
    }

    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_out(&self) -> Result<()> {
        if self.session.read().await.is_none() {
            return Ok(());
        }
        let url = self.url("auth/v1/logout", &[])?;
        let req = self.request(Method::POST, url).await;
        self.execute("sign_out", req).await?;
        *self.session.write().await = None;
        Ok(())
    }

    async fn ensure_profile(&self, user_id: &str) -> Result<()> {
        let url = self.table("profiles", &[("select", "id".into()), ("id", eq(user_id))])?;
        let rows: Vec<Value> = self.fetch("ensure_profile", self.request(Method::GET, url).await).await?;
        if !rows.is_empty() {
            return Ok(());
        }
        let url = self.table("profiles", &[])?;
        let req = self
            .request(Method::POST, url)
            .await
            .json(&json!({ "id": user_id, "plan": "basic", "status": "active" }));
        self.execute("ensure_profile", req).await
    }

    async fn list_devices(&self, user_id: &str) -> Result<Vec<Device>> {
        let url = self.table(
            "devices",
            &[
                ("select", DEVICE_COLUMNS.into()),
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".into()),
            ],
        )?;
        self.fetch("list_devices", self.request(Method::GET, url).await).await
    }

    async fn find_active_device(&self, user_id: &str, fingerprint: &str) -> Result<Option<Device>> {
        let url = self.table(
            "devices",
            &[
                ("select", DEVICE_COLUMNS.into()),
                ("user_id", eq(user_id)),
                ("device_fingerprint", eq(fingerprint)),
                ("active", "eq.true".into()),
                ("limit", "1".into()),
            ],
        )?;
        let rows: Vec<Device> = self.fetch("find_active_device", self.request(Method::GET, url).await).await?;
        Ok(rows.into_iter().next())
    }

    async fn deactivate_device(&self, user_id: &str, device_id: &str) -> Result<()> {
        let url = self.table("devices", &[("id", eq(device_id)), ("user_id", eq(user_id))])?;
        let req = self
            .request(Method::PATCH, url)
            .await
            .json(&json!({ "active": false, "last_seen": now_rfc3339() }));
        self.execute("deactivate_device", req).await
    }

    async fn count_active_devices(&self, user_id: &str) -> Result<u64> {
        let url = self.table(
            "devices",
            &[("select", "id".into()), ("user_id", eq(user_id)), ("active", "eq.true".into())],
        )?;
        let req = self.request(Method::HEAD, url).await.header("Prefer", "count=exact");
        let resp = checked("count_active_devices", req.send().await?).await?;
        Ok(parse_total(resp.headers()).unwrap_or(0))
    }

    async fn register_device(&self, device: &NewDevice) -> Result<()> {
        let url = self.table("devices", &[])?;
        let req = self.request(Method::POST, url).await.json(device);
        self.execute("register_device", req).await
    }

    async fn touch_device(&self, device_id: &str) -> Result<()> {
        let url = self.table("devices", &[("id", eq(device_id))])?;
        let req = self
            .request(Method::PATCH, url)
            .await
            .json(&json!({ "last_seen": now_rfc3339() }));
        self.execute("touch_device", req).await
    }

    async fn active_license(&self, user_id: &str) -> Result<Option<License>> {
        let url = self.table(
            "licenses",
            &[
                ("select", "*".into()),
                ("user_id", eq(user_id)),
                ("active", "eq.true".into()),
                ("or", format!("(expires_at.is.null,expires_at.gt.{})", now_rfc3339())),
                ("limit", "1".into()),
            ],
        )?;
        let rows: Vec<License> = self.fetch("active_license", self.request(Method::GET, url).await).await?;
        Ok(rows.into_iter().next())
    }

    async fn can_register_device(&self, user_id: &str) -> Result<bool> {
        let url = self.url("rest/v1/rpc/can_register_device", &[])?;
        let req = self
            .request(Method::POST, url)
            .await
            .json(&json!({ "p_user_id": user_id }));
        self.fetch("can_register_device", req).await
    }

    async fn upgrade_license(&self, user_id: &str, plan: &UpgradePlan) -> Result<()> {
        let url = self.table("licenses", &[("user_id", eq(user_id))])?;
        let req = self.request(Method::PATCH, url).await.json(&json!({
            "max_devices": plan.max_devices,
            "expires_at": plan.expires_at,
            "active": true,
        }));
        self.execute("upgrade_license", req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_encodes_filters() {
        let svc = SupabaseAccess::new("https://proj.example.co", "anon").unwrap();
        let url = svc
            .table("devices", &[("user_id", eq("u-1")), ("active", "eq.true".into())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://proj.example.co/rest/v1/devices?user_id=eq.u-1&active=eq.true"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let svc = SupabaseAccess::new("https://gw.example.co/supabase", "anon").unwrap();
        let url = svc.table("licenses", &[]).unwrap();
        assert_eq!(url.as_str(), "https://gw.example.co/supabase/rest/v1/licenses");

        let svc = SupabaseAccess::new("https://gw.example.co/supabase/", "anon").unwrap();
        let url = svc.url("auth/v1/logout", &[]).unwrap();
        assert_eq!(url.as_str(), "https://gw.example.co/supabase/auth/v1/logout");
    }

    #[test]
    fn test_invalid_base_rejected() {
        assert!(SupabaseAccess::new("not a url", "anon").is_err());
    }

    #[test]
    fn test_parse_total() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("0-2/3"));
        assert_eq!(parse_total(&headers), Some(3));
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("*/0"));
        assert_eq!(parse_total(&headers), Some(0));
        assert_eq!(parse_total(&HeaderMap::new()), None);
    }

    #[test]
    fn test_parse_sign_up_with_session() {
        let body = json!({
            "access_token": "tok",
            "refresh_token": "ref",
            "user": { "id": "u-1", "email": "a@b.c" }
        });
        let (user, session) = parse_sign_up(body).unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(session.unwrap().access_token, "tok");
    }

    #[test]
    fn test_parse_sign_up_pending_confirmation() {
        let body = json!({ "id": "u-2", "email": "x@y.z", "confirmation_sent_at": "2025-01-01T00:00:00Z" });
        let (user, session) = parse_sign_up(body).unwrap();
        assert_eq!(user.id, "u-2");
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_without_session_is_noop() {
        let svc = SupabaseAccess::new("https://proj.example.co", "anon").unwrap();
        svc.sign_out().await.unwrap();
        assert!(svc.current_session().await.unwrap().is_none());
    }
}
