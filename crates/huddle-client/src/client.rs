//! REST client for the messaging server.
//!
//! One [`Client`] per server. It owns the HTTP connection pool, the session
//! token and the last server version it saw; nothing is kept in globals, so
//! several clients can talk to different servers side by side.

use std::sync::RwLock;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use huddle_shared::constants::{
    HEADER_ACCEPT_LANGUAGE, HEADER_AUTH, HEADER_BEARER, HEADER_REQUESTED_WITH, HEADER_TOKEN,
    HEADER_USER_AGENT, HEADER_X_VERSION_ID, INTL_INVALID_RESPONSE, INTL_INVALID_RESPONSE_DEFAULT,
};
use huddle_shared::{
    Channel, ChannelId, ChannelMember, ChannelNotifyProps, ChannelStats, CustomEmoji, FileInfo,
    FileUploadResponse, IntlMessage, Job, JobType, Post, PostId, PostList, Role, ServerError,
    Team, TeamId, TeamMember, UserId, UserProfile,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::{emit_event, ClientEvent};

const EVENT_CAPACITY: usize = 16;

/// A decoded response: headers plus the JSON body.
#[derive(Debug)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub data: Value,
}

/// One file of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

pub struct Client {
    config: ClientConfig,
    http: reqwest::Client,
    token: RwLock<Option<String>>,
    server_version: RwLock<String>,
    events: broadcast::Sender<ClientEvent>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            token: RwLock::new(config.token.clone()),
            server_version: RwLock::new(String::new()),
            config,
            http,
            events,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|p| p.into_inner()) = token.filter(|t| !t.is_empty());
    }

    /// Last `X-Version-Id` seen, empty before the first response.
    pub fn server_version(&self) -> String {
        self.server_version.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Receiver for [`ClientEvent`]s raised from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    // -- Routes --

    pub fn base_route(&self) -> String {
        self.config.api_base()
    }

    pub fn users_route(&self) -> String {
        format!("{}/users", self.base_route())
    }

    pub fn user_route(&self, user_id: &UserId) -> String {
        format!("{}/{}", self.users_route(), user_id)
    }

    pub fn teams_route(&self) -> String {
        format!("{}/teams", self.base_route())
    }

    pub fn team_route(&self, team_id: &TeamId) -> String {
        format!("{}/{}", self.teams_route(), team_id)
    }

    pub fn channels_route(&self) -> String {
        format!("{}/channels", self.base_route())
    }

    pub fn channel_route(&self, channel_id: &ChannelId) -> String {
        format!("{}/{}", self.channels_route(), channel_id)
    }

    pub fn channel_member_route(&self, channel_id: &ChannelId, user_id: &UserId) -> String {
        format!("{}/members/{}", self.channel_route(channel_id), user_id)
    }

    pub fn posts_route(&self) -> String {
        format!("{}/posts", self.base_route())
    }

    pub fn post_route(&self, post_id: &PostId) -> String {
        format!("{}/{}", self.posts_route(), post_id)
    }

    pub fn files_route(&self) -> String {
        format!("{}/files", self.base_route())
    }

    pub fn roles_route(&self) -> String {
        format!("{}/roles", self.base_route())
    }

    pub fn jobs_route(&self) -> String {
        format!("{}/jobs", self.base_route())
    }

    pub fn emoji_route(&self) -> String {
        format!("{}/emoji", self.base_route())
    }

    pub fn system_route(&self) -> String {
        format!("{}/system", self.base_route())
    }

    // -- Users --

    /// Log in and keep the session token the server hands back.
    pub async fn login(&self, login_id: &str, password: &str) -> Result<UserProfile> {
        let url = format!("{}/login", self.users_route());
        let body = json!({
            "device_id": "",
            "login_id": login_id,
            "password": password,
            "token": "",
        });
        let response = self
            .do_fetch_with_response(self.request(Method::POST, &url).json(&body), &url)
            .await?;

        if let Some(token) = response
            .headers
            .get(HEADER_TOKEN)
            .and_then(|v| v.to_str().ok())
        {
            self.set_token(Some(token.to_string()));
        }

        tracing::info!(login_id, "logged in");
        decode(response.data)
    }

    /// End the session. The token is only dropped when the server accepted
    /// the logout; the remembered server version is always reset.
    pub async fn logout(&self) -> Result<()> {
        let url = format!("{}/logout", self.users_route());
        let result = self
            .do_fetch_with_response(self.request(Method::POST, &url), &url)
            .await;

        if result.is_ok() {
            self.set_token(None);
        }
        self.server_version
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .clear();

        result.map(|_| ())
    }

    pub async fn get_me(&self) -> Result<UserProfile> {
        self.get(format!("{}/me", self.users_route())).await
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<UserProfile> {
        self.get(self.user_route(user_id)).await
    }

    pub async fn get_profiles(&self, page: u32, per_page: u32) -> Result<Vec<UserProfile>> {
        self.get(format!("{}?page={page}&per_page={per_page}", self.users_route()))
            .await
    }

    pub async fn get_profiles_by_ids(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>> {
        self.post(format!("{}/ids", self.users_route()), user_ids).await
    }

    pub async fn get_profiles_in_channel(
        &self,
        channel_id: &ChannelId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>> {
        self.get(format!(
            "{}?in_channel={channel_id}&page={page}&per_page={per_page}",
            self.users_route()
        ))
        .await
    }

    pub async fn get_profiles_not_in_channel(
        &self,
        team_id: &TeamId,
        channel_id: &ChannelId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>> {
        self.get(format!(
            "{}?in_team={team_id}&not_in_channel={channel_id}&page={page}&per_page={per_page}",
            self.users_route()
        ))
        .await
    }

    // -- Teams --

    pub async fn get_my_teams(&self) -> Result<Vec<Team>> {
        self.get(format!("{}/me/teams", self.users_route())).await
    }

    pub async fn get_my_team_members(&self) -> Result<Vec<TeamMember>> {
        self.get(format!("{}/me/teams/members", self.users_route()))
            .await
    }

    pub async fn get_team(&self, team_id: &TeamId) -> Result<Team> {
        self.get(self.team_route(team_id)).await
    }

    // -- Channels --

    pub async fn get_my_channels(&self, team_id: &TeamId) -> Result<Vec<Channel>> {
        self.get(format!("{}/me/teams/{team_id}/channels", self.users_route()))
            .await
    }

    pub async fn get_my_channel_members(&self, team_id: &TeamId) -> Result<Vec<ChannelMember>> {
        self.get(format!(
            "{}/me/teams/{team_id}/channels/members",
            self.users_route()
        ))
        .await
    }

    pub async fn get_channel(&self, channel_id: &ChannelId) -> Result<Channel> {
        self.get(self.channel_route(channel_id)).await
    }

    pub async fn get_channel_stats(&self, channel_id: &ChannelId) -> Result<ChannelStats> {
        self.get(format!("{}/stats", self.channel_route(channel_id)))
            .await
    }

    /// Tell the server the current user switched to `channel_id`. The
    /// server marks both channels read.
    pub async fn view_channel(
        &self,
        channel_id: &ChannelId,
        prev_channel_id: Option<&ChannelId>,
    ) -> Result<()> {
        let body = json!({
            "channel_id": channel_id,
            "prev_channel_id": prev_channel_id.map(ChannelId::as_str).unwrap_or_default(),
        });
        let _: Value = self
            .post(format!("{}/members/me/view", self.channels_route()), &body)
            .await?;
        Ok(())
    }

    pub async fn update_channel_notify_props(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
        props: &ChannelNotifyProps,
    ) -> Result<()> {
        let _: Value = self
            .put(
                format!("{}/notify_props", self.channel_member_route(channel_id, user_id)),
                props,
            )
            .await?;
        Ok(())
    }

    // -- Posts --

    pub async fn create_post(&self, post: &Post) -> Result<Post> {
        self.post(self.posts_route(), post).await
    }

    pub async fn get_post(&self, post_id: &PostId) -> Result<Post> {
        self.get(self.post_route(post_id)).await
    }

    pub async fn delete_post(&self, post_id: &PostId) -> Result<()> {
        let _: Value = self.delete(self.post_route(post_id)).await?;
        Ok(())
    }

    pub async fn get_posts(&self, channel_id: &ChannelId, page: u32, per_page: u32) -> Result<PostList> {
        self.get(format!(
            "{}/posts?page={page}&per_page={per_page}",
            self.channel_route(channel_id)
        ))
        .await
    }

    /// Posts created, edited or deleted in `channel_id` after `since`
    /// (milliseconds since the epoch).
    pub async fn get_posts_since(&self, channel_id: &ChannelId, since: i64) -> Result<PostList> {
        self.get(format!("{}/posts?since={since}", self.channel_route(channel_id)))
            .await
    }

    pub async fn get_post_thread(&self, post_id: &PostId) -> Result<PostList> {
        self.get(format!("{}/thread", self.post_route(post_id))).await
    }

    pub async fn search_posts(&self, team_id: &TeamId, terms: &str, is_or_search: bool) -> Result<PostList> {
        let body = json!({ "terms": terms, "is_or_search": is_or_search });
        self.post(format!("{}/posts/search", self.team_route(team_id)), &body)
            .await
    }

    pub async fn get_flagged_posts(&self, user_id: &UserId, page: u32, per_page: u32) -> Result<PostList> {
        self.get(format!(
            "{}/posts/flagged?page={page}&per_page={per_page}",
            self.user_route(user_id)
        ))
        .await
    }

    pub async fn get_file_infos_for_post(&self, post_id: &PostId) -> Result<Vec<FileInfo>> {
        self.get(format!("{}/files/info", self.post_route(post_id)))
            .await
    }

    pub async fn get_open_graph_metadata(&self, url: &str) -> Result<Value> {
        self.post(format!("{}/opengraph", self.base_route()), &json!({ "url": url }))
            .await
    }

    // -- Files --

    /// Upload attachments for a post in `channel_id`. Resolves to
    /// [`ClientError::Cancelled`] as soon as `cancel` fires.
    pub async fn upload_files(
        &self,
        channel_id: &ChannelId,
        files: Vec<UploadFile>,
        client_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<FileUploadResponse> {
        let url = self.files_route();
        let mut form = Form::new().text("channel_id", channel_id.to_string());
        for file in files {
            let part = Part::bytes(file.data.to_vec())
                .file_name(file.name)
                .mime_str(&file.mime_type)?;
            form = form.part("files", part);
        }
        for client_id in client_ids {
            form = form.text("client_ids", client_id.clone());
        }

        let request = self.request(Method::POST, &url).multipart(form);
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(channel = %channel_id, "upload cancelled");
                Err(ClientError::Cancelled)
            }
            response = self.do_fetch_with_response(request, &url) => decode(response?.data),
        }
    }

    // -- Roles --

    pub async fn get_roles_by_names(&self, names: &[String]) -> Result<Vec<Role>> {
        self.post(format!("{}/names", self.roles_route()), names).await
    }

    pub async fn get_role_by_name(&self, name: &str) -> Result<Role> {
        self.get(format!("{}/name/{name}", self.roles_route())).await
    }

    // -- Jobs --

    pub async fn create_job(&self, job_type: JobType, data: &Value) -> Result<Job> {
        let body = json!({ "type": job_type, "data": data });
        self.post(self.jobs_route(), &body).await
    }

    pub async fn get_job(&self, id: &str) -> Result<Job> {
        self.get(format!("{}/{id}", self.jobs_route())).await
    }

    pub async fn get_jobs(&self, page: u32, per_page: u32) -> Result<Vec<Job>> {
        self.get(format!("{}?page={page}&per_page={per_page}", self.jobs_route()))
            .await
    }

    pub async fn get_jobs_by_type(&self, job_type: JobType, page: u32, per_page: u32) -> Result<Vec<Job>> {
        self.get(format!(
            "{}/type/{}?page={page}&per_page={per_page}",
            self.jobs_route(),
            job_type.as_str()
        ))
        .await
    }

    pub async fn cancel_job(&self, id: &str) -> Result<()> {
        let _: Value = self
            .post(format!("{}/{id}/cancel", self.jobs_route()), &json!({}))
            .await?;
        Ok(())
    }

    // -- Admin --

    pub async fn get_config(&self) -> Result<Value> {
        self.get(format!("{}/config", self.base_route())).await
    }

    pub async fn update_config(&self, config: &Value) -> Result<Value> {
        self.put(format!("{}/config", self.base_route()), config).await
    }

    pub async fn reload_config(&self) -> Result<()> {
        let _: Value = self
            .post(format!("{}/config/reload", self.base_route()), &json!({}))
            .await?;
        Ok(())
    }

    pub async fn get_logs(&self, page: u32, per_page: u32) -> Result<Vec<String>> {
        self.get(format!(
            "{}/logs?page={page}&logs_per_page={per_page}",
            self.base_route()
        ))
        .await
    }

    pub async fn get_audits(&self, page: u32, per_page: u32) -> Result<Vec<Value>> {
        self.get(format!(
            "{}/audits?page={page}&per_page={per_page}",
            self.base_route()
        ))
        .await
    }

    // -- Emoji --

    pub async fn get_custom_emojis(&self, page: u32, per_page: u32) -> Result<Vec<CustomEmoji>> {
        self.get(format!("{}?page={page}&per_page={per_page}", self.emoji_route()))
            .await
    }

    pub async fn get_custom_emoji_by_name(&self, name: &str) -> Result<CustomEmoji> {
        self.get(format!("{}/name/{name}", self.emoji_route())).await
    }

    pub async fn create_custom_emoji(&self, emoji: &CustomEmoji, image: UploadFile) -> Result<CustomEmoji> {
        let url = self.emoji_route();
        let part = Part::bytes(image.data.to_vec())
            .file_name(image.name)
            .mime_str(&image.mime_type)?;
        let emoji_json = serde_json::to_string(emoji)?;
        let form = Form::new().part("image", part).text("emoji", emoji_json);

        let response = self
            .do_fetch_with_response(self.request(Method::POST, &url).multipart(form), &url)
            .await?;
        decode(response.data)
    }

    pub async fn delete_custom_emoji(&self, id: &str) -> Result<()> {
        let _: Value = self.delete(format!("{}/{id}", self.emoji_route())).await?;
        Ok(())
    }

    // -- System --

    pub async fn ping(&self) -> Result<Value> {
        let now = chrono::Utc::now().timestamp_millis();
        self.get(format!("{}/ping?time={now}", self.system_route())).await
    }

    // -- Helpers --

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        self.do_fetch(self.request(Method::GET, &url), &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, url: String, body: &B) -> Result<T> {
        self.do_fetch(self.request(Method::POST, &url).json(body), &url)
            .await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, url: String, body: &B) -> Result<T> {
        self.do_fetch(self.request(Method::PUT, &url).json(body), &url)
            .await
    }

    async fn delete<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        self.do_fetch(self.request(Method::DELETE, &url), &url).await
    }

    /// A request carrying the session and locale headers.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, url)
            .header(HEADER_REQUESTED_WITH, "XMLHttpRequest");

        // Without a token the cookie store carries the session.
        if let Some(token) = self.token() {
            builder = builder.header(HEADER_AUTH, format!("{HEADER_BEARER} {token}"));
        }
        if let Some(user_agent) = &self.config.user_agent {
            builder = builder.header(HEADER_USER_AGENT, user_agent);
        }
        if let Some(locale) = &self.config.accept_language {
            builder = builder.header(HEADER_ACCEPT_LANGUAGE, locale);
        }
        builder
    }

    async fn do_fetch<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = self.do_fetch_with_response(request, url).await?;
        decode(response.data)
    }

    pub async fn do_fetch_with_response(&self, request: RequestBuilder, url: &str) -> Result<FetchResponse> {
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let data: Value = match serde_json::from_slice(&body) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(url, status = status.as_u16(), error = %e, "undecodable response body");
                return Err(ClientError::InvalidResponse(invalid_response()));
            }
        };

        self.track_server_version(&headers);

        if status.is_success() {
            return Ok(FetchResponse { status, headers, data });
        }

        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if self.config.log_errors {
            tracing::error!(url, status = status.as_u16(), "{message}");
        }

        Err(ClientError::Server(ServerError {
            message,
            server_error_id: data
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            status_code: data
                .get("status_code")
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or_else(|| status.as_u16()),
            url: url.to_string(),
        }))
    }

    fn track_server_version(&self, headers: &HeaderMap) {
        let Some(version) = headers
            .get(HEADER_X_VERSION_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
        else {
            return;
        };

        {
            let mut current = self.server_version.write().unwrap_or_else(|p| p.into_inner());
            if *current == version {
                return;
            }
            *current = version.to_string();
        }

        tracing::info!(version, "server version changed");
        emit_event(
            &self.events,
            ClientEvent::ServerVersionChanged {
                version: version.to_string(),
            },
        );
    }
}

fn invalid_response() -> IntlMessage {
    IntlMessage::new(INTL_INVALID_RESPONSE, INTL_INVALID_RESPONSE_DEFAULT)
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| {
        tracing::warn!(error = %e, "response does not match the expected shape");
        ClientError::InvalidResponse(invalid_response())
    })
}
