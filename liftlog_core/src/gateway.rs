//! HTTP client for the remote workout API.
//!
//! Thin plumbing over `reqwest`: one method per endpoint, JSON in and out,
//! no retries and no caching. The API authenticates with a session cookie;
//! the client captures it at login and replays it on every request so it
//! can be persisted between runs.
//!
//! Failures map onto [`Error`]:
//! - transport problems and timeouts → [`Error::Http`]
//! - HTTP 401 → [`Error::Unauthorized`]
//! - any other non-success status → [`Error::Api`] with the server's message

use crate::config::ApiConfig;
use crate::{
    Calendar, CreateCalendarRequest, CreateSnapshotRequest, CreateUserRequest,
    CreateWorkoutRequest, Error, ListParams, LoginRequest, Result, Snapshot,
    UpdateCalendarRequest, UpdateSnapshotRequest, UpdateUserRequest, UpdateWorkoutRequest, User,
    Workout,
};
use reqwest::header::{HeaderMap, ACCEPT, COOKIE, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error body shape used by the API for 4xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Calendar, its snapshots and the user's workouts, fetched together
#[derive(Clone, Debug)]
pub struct CalendarBundle {
    pub calendar: Calendar,
    pub snapshots: Vec<Snapshot>,
    pub workouts: Vec<Workout>,
}

/// Client for the workout API
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    cookie: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("liftlog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie: None,
        })
    }

    /// Reuse a cookie captured by an earlier login
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(ACCEPT, "*/*");

        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn dispatch(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, path, e);
            Error::Http(e)
        })?;

        tracing::debug!("{} {} -> {}", method, path, response.status().as_u16());
        Ok(response)
    }

    /// Send a request made with the stored session; 401 means it expired
    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Response> {
        let response = self.dispatch(method, path, builder).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        Err(api_error(response).await)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: Option<&ListParams>) -> Result<T> {
        let mut builder = self.request(Method::GET, path);
        if let Some(params) = params {
            builder = builder.query(params);
        }
        let response = self.send(Method::GET, path, builder).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let builder = self.request(Method::POST, path).json(body);
        let response = self.send(Method::POST, path, builder).await?;
        Ok(response.json().await?)
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let builder = self.request(Method::PATCH, path).json(body);
        let response = self.send(Method::PATCH, path, builder).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, path);
        self.send(Method::DELETE, path, builder).await?;
        Ok(())
    }

    /// Keep the cookie from a login-style response, if it set one
    fn capture_cookie(&mut self, headers: &HeaderMap) {
        if let Some(cookie) = cookie_header(headers) {
            tracing::debug!("Captured session cookie");
            self.cookie = Some(cookie);
        }
    }

    // ========================================================================
    // Auth and users
    // ========================================================================

    /// Post credentials and keep the cookie the API answers with
    ///
    /// A 401 here is a rejected login, not an expired session, so it comes
    /// back as [`Error::Api`] with the server's message.
    async fn authenticate<B: Serialize>(&mut self, path: &str, body: &B) -> Result<User> {
        let builder = self.request(Method::POST, path).json(body);
        let response = self.dispatch(Method::POST, path, builder).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        self.capture_cookie(response.headers());
        Ok(response.json().await?)
    }

    pub async fn login(&mut self, credentials: &LoginRequest) -> Result<User> {
        self.authenticate("/auth/login", credentials).await
    }

    /// Create an account; the API logs the new user in
    pub async fn register(&mut self, request: &CreateUserRequest) -> Result<User> {
        self.authenticate("/users", request).await
    }

    pub async fn list_users(&self, params: &ListParams) -> Result<Vec<User>> {
        self.get("/users", Some(params)).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.get(&format!("/users/{}", user_id), None).await
    }

    pub async fn update_user(&self, user_id: &str, request: &UpdateUserRequest) -> Result<User> {
        self.patch(&format!("/users/{}", user_id), request).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.delete(&format!("/users/{}", user_id)).await
    }

    // ========================================================================
    // Workouts
    // ========================================================================

    pub async fn create_workout(&self, user_id: &str, request: &CreateWorkoutRequest) -> Result<Workout> {
        self.post(&format!("/users/{}/workouts", user_id), request).await
    }

    pub async fn list_workouts(&self, user_id: &str, params: &ListParams) -> Result<Vec<Workout>> {
        self.get(&format!("/users/{}/workouts", user_id), Some(params)).await
    }

    pub async fn get_workout(&self, user_id: &str, workout_id: &str) -> Result<Workout> {
        self.get(&format!("/users/{}/workouts/{}", user_id, workout_id), None)
            .await
    }

    pub async fn update_workout(
        &self,
        user_id: &str,
        workout_id: &str,
        request: &UpdateWorkoutRequest,
    ) -> Result<Workout> {
        self.patch(&format!("/users/{}/workouts/{}", user_id, workout_id), request)
            .await
    }

    pub async fn delete_workout(&self, user_id: &str, workout_id: &str) -> Result<()> {
        self.delete(&format!("/users/{}/workouts/{}", user_id, workout_id))
            .await
    }

    // ========================================================================
    // Calendars
    // ========================================================================

    pub async fn create_calendar(&self, user_id: &str, request: &CreateCalendarRequest) -> Result<Calendar> {
        self.post(&format!("/users/{}/calendars", user_id), request).await
    }

    pub async fn list_calendars(&self, user_id: &str, params: &ListParams) -> Result<Vec<Calendar>> {
        self.get(&format!("/users/{}/calendars", user_id), Some(params)).await
    }

    pub async fn get_calendar(&self, user_id: &str, calendar_id: &str) -> Result<Calendar> {
        self.get(&format!("/users/{}/calendars/{}", user_id, calendar_id), None)
            .await
    }

    pub async fn update_calendar(
        &self,
        user_id: &str,
        calendar_id: &str,
        request: &UpdateCalendarRequest,
    ) -> Result<Calendar> {
        self.patch(&format!("/users/{}/calendars/{}", user_id, calendar_id), request)
            .await
    }

    pub async fn delete_calendar(&self, user_id: &str, calendar_id: &str) -> Result<()> {
        self.delete(&format!("/users/{}/calendars/{}", user_id, calendar_id))
            .await
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    fn snapshots_path(user_id: &str, calendar_id: &str) -> String {
        format!("/users/{}/calendars/{}/snapshots", user_id, calendar_id)
    }

    pub async fn create_snapshot(
        &self,
        user_id: &str,
        calendar_id: &str,
        request: &CreateSnapshotRequest,
    ) -> Result<Snapshot> {
        self.post(&Self::snapshots_path(user_id, calendar_id), request)
            .await
    }

    pub async fn list_snapshots(
        &self,
        user_id: &str,
        calendar_id: &str,
        params: &ListParams,
    ) -> Result<Vec<Snapshot>> {
        self.get(&Self::snapshots_path(user_id, calendar_id), Some(params))
            .await
    }

    pub async fn get_snapshot(&self, user_id: &str, calendar_id: &str, snapshot_id: &str) -> Result<Snapshot> {
        let path = format!("{}/{}", Self::snapshots_path(user_id, calendar_id), snapshot_id);
        self.get(&path, None).await
    }

    pub async fn update_snapshot(
        &self,
        user_id: &str,
        calendar_id: &str,
        snapshot_id: &str,
        request: &UpdateSnapshotRequest,
    ) -> Result<Snapshot> {
        let path = format!("{}/{}", Self::snapshots_path(user_id, calendar_id), snapshot_id);
        self.patch(&path, request).await
    }

    pub async fn delete_snapshot(&self, user_id: &str, calendar_id: &str, snapshot_id: &str) -> Result<()> {
        let path = format!("{}/{}", Self::snapshots_path(user_id, calendar_id), snapshot_id);
        self.delete(&path).await
    }

    // ========================================================================
    // Joined fetches
    // ========================================================================

    /// Fetch a calendar, its snapshots and the user's workouts concurrently
    ///
    /// Fails as a whole if any of the three requests fails.
    pub async fn load_calendar_bundle(&self, user_id: &str, calendar_id: &str) -> Result<CalendarBundle> {
        let all = ListParams::default();
        let (calendar, snapshots, workouts) = tokio::try_join!(
            self.get_calendar(user_id, calendar_id),
            self.list_snapshots(user_id, calendar_id, &all),
            self.list_workouts(user_id, &all),
        )?;

        tracing::debug!(
            "Loaded calendar {} with {} snapshots and {} workouts",
            calendar.id,
            snapshots.len(),
            workouts.len()
        );

        Ok(CalendarBundle {
            calendar,
            snapshots,
            workouts,
        })
    }
}

/// Collapse `Set-Cookie` headers into a `Cookie` header value
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

async fn api_error(response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    }
}

/// Best human-readable message for a failed response
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_cookie_header_from_set_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("sid=abc123; Path=/; HttpOnly; Secure"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("csrf=xyz; Path=/"));

        assert_eq!(cookie_header(&headers).as_deref(), Some("sid=abc123; csrf=xyz"));
        assert_eq!(cookie_header(&HeaderMap::new()), None);
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(status, r#"{"message": "name is required"}"#),
            "name is required"
        );
        assert_eq!(error_message(status, "plain failure"), "plain failure");
        assert_eq!(error_message(status, ""), "Bad Request");
        assert_eq!(error_message(status, r#"{"message": ""}"#), r#"{"message": ""}"#);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ApiConfig {
            base_url: "http://localhost:8080/".into(),
            timeout_ms: 1000,
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert!(client.cookie().is_none());
        assert_eq!(
            client.with_cookie(Some("sid=1".into())).cookie(),
            Some("sid=1")
        );
    }
}
