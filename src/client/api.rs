//! The `Api` facade and its builder

use super::base_url::normalize_base_url;
use crate::config::{load_auth_file, search_auth_file, AUTH_FILE_NAME};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig, RequestConfig};
use crate::pagination::{PageSize, PageSource, PageStream, Paginator};
use crate::partition::{Chunks, PartitionPayload, Threshold};
use crate::request::{validate, Params, RequestOptions};
use crate::sqlview::{plan, RowStream, SqlViewOptions, SqlViewType};
use crate::types::{JsonValue, Method, Row};
use crate::utils::{is_valid_uid, version_to_int};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use reqwest::Response;
use std::fmt;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Lowest API version accepted in URLs
pub const MIN_API_VERSION: u32 = 25;

/// Responses of a partitioned POST, one per chunk
pub type ResponseStream<'a> = Pin<Box<dyn Stream<Item = Result<Response>> + Send + 'a>>;

/// Rows of a SQL view, decoded from the streamed `data.csv` body
pub type SqlViewRows = RowStream<BoxStream<'static, reqwest::Result<Bytes>>>;

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Api`]
#[derive(Clone)]
pub struct ApiBuilder {
    server: String,
    username: String,
    password: String,
    api_version: Option<u32>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    rate_limit: Option<RateLimiterConfig>,
}

impl ApiBuilder {
    /// Start a builder from a server and credentials
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
            password: password.into(),
            api_version: None,
            user_agent: None,
            timeout: None,
            rate_limit: None,
        }
    }

    /// Pin the API version used in URLs (`/api/{version}`)
    #[must_use]
    pub fn api_version(mut self, version: u32) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Set an optional API version
    #[must_use]
    pub fn maybe_api_version(mut self, version: Option<u32>) -> Self {
        self.api_version = version;
        self
    }

    /// Override the user agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Timeout for every request, body included (none unless set)
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Throttle outgoing requests
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Validate the settings and build the client
    pub fn build(self) -> Result<Api> {
        let base_url = normalize_base_url(&self.server)?;
        let api_version = check_api_version(self.api_version)?;

        let mut config = HttpClientConfig::builder().basic_auth(&self.username, self.password);
        if let Some(agent) = self.user_agent {
            config = config.user_agent(agent);
        }
        if let Some(timeout) = self.timeout {
            config = config.timeout(timeout);
        }
        if let Some(rate_limit) = self.rate_limit {
            config = config.rate_limit(rate_limit);
        }

        let http = HttpClient::with_config(config.build())?;

        Ok(Api {
            http,
            base_url,
            api_version,
            username: self.username,
            info: OnceCell::new(),
        })
    }
}

impl fmt::Debug for ApiBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiBuilder")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"***")
            .field("api_version", &self.api_version)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

fn check_api_version(version: Option<u32>) -> Result<Option<u32>> {
    match version {
        Some(v) if v < MIN_API_VERSION => Err(Error::client(format!(
            "`api_version` must be {MIN_API_VERSION} or greater: {v}"
        ))),
        other => Ok(other),
    }
}

// ============================================================================
// Api
// ============================================================================

/// Client for one DHIS2 instance
pub struct Api {
    http: HttpClient,
    base_url: String,
    api_version: Option<u32>,
    username: String,
    info: OnceCell<JsonValue>,
}

impl Api {
    /// Create a client with default settings
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        ApiBuilder::new(server, username, password).build()
    }

    /// Start a builder
    pub fn builder(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> ApiBuilder {
        ApiBuilder::new(server, username, password)
    }

    /// Start a builder from an auth file
    ///
    /// Without a path, `dish.json` is searched in `$DHIS_HOME` and then in
    /// the home directory.
    pub fn from_auth_file(path: Option<&Path>) -> Result<ApiBuilder> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => search_auth_file(AUTH_FILE_NAME)?,
        };
        let section = load_auth_file(&path)?;
        Ok(ApiBuilder::new(
            section.baseurl,
            section.username,
            section.password,
        ))
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Normalized base URL, e.g. `https://play.dhis2.org/demo`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Change the server; cached server info is dropped
    pub fn set_base_url(&mut self, server: &str) -> Result<()> {
        self.base_url = normalize_base_url(server)?;
        self.info = OnceCell::new();
        Ok(())
    }

    /// Pinned API version, if any
    pub fn api_version(&self) -> Option<u32> {
        self.api_version
    }

    /// Change the pinned API version
    pub fn set_api_version(&mut self, version: Option<u32>) -> Result<()> {
        self.api_version = check_api_version(version)?;
        Ok(())
    }

    /// API root, e.g. `https://play.dhis2.org/demo/api/30`
    pub fn api_url(&self) -> String {
        match self.api_version {
            Some(v) => format!("{}/api/{}", self.base_url, v),
            None => format!("{}/api", self.base_url),
        }
    }

    /// Username used for authentication
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Underlying transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    // ------------------------------------------------------------------------
    // Server info
    // ------------------------------------------------------------------------

    /// `system/info`, fetched once and cached
    pub async fn info(&self) -> Result<&JsonValue> {
        self.info
            .get_or_try_init(|| self.get_json("system/info", None))
            .await
    }

    /// Server version string, e.g. `2.30`
    pub async fn version(&self) -> Result<String> {
        self.info_field("version").await
    }

    /// Server build revision
    pub async fn revision(&self) -> Result<String> {
        self.info_field("revision").await
    }

    /// Minor version number, e.g. `30` for `2.30`
    pub async fn version_int(&self) -> Result<Option<u32>> {
        Ok(version_to_int(&self.version().await?))
    }

    async fn info_field(&self, field: &str) -> Result<String> {
        self.info()
            .await?
            .get(field)
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::decode(format!("system/info has no `{field}`")))
    }

    // ------------------------------------------------------------------------
    // Verbs
    // ------------------------------------------------------------------------

    /// Send a validated request and check the response status
    ///
    /// GET requests ask for `{endpoint}.{file_type}`; writes go to the bare
    /// endpoint.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Response> {
        let file_type = validate(
            endpoint,
            &options.file_type,
            options.json.as_ref(),
            options.params.as_ref(),
        )?;

        let mut url = format!("{}/{}", self.api_url(), endpoint);
        if method.is_read() {
            url = format!("{url}.{file_type}");
        }

        let mut config = RequestConfig::new();
        if let Some(params) = &options.params {
            config = config.query_pairs(params.to_query());
        }
        if let Some(body) = options.json {
            if matches!(method, Method::POST | Method::PUT | Method::PATCH) {
                config = config.json(body);
            }
        }
        if let Some(timeout) = options.timeout {
            config = config.timeout(timeout);
        }

        let response = self.http.request(method, &url, config).await?;
        check_status(response).await
    }

    /// GET as JSON
    pub async fn get(&self, endpoint: &str, params: Option<&Params>) -> Result<Response> {
        self.request(
            Method::GET,
            endpoint,
            RequestOptions::new().maybe_params(params),
        )
        .await
    }

    /// GET with another file type (`csv`, `xml`, `pdf`, `xlsx`)
    pub async fn get_as(
        &self,
        endpoint: &str,
        file_type: &str,
        params: Option<&Params>,
    ) -> Result<Response> {
        self.request(
            Method::GET,
            endpoint,
            RequestOptions::new()
                .file_type(file_type)
                .maybe_params(params),
        )
        .await
    }

    /// GET and parse the JSON body
    pub async fn get_json(&self, endpoint: &str, params: Option<&Params>) -> Result<JsonValue> {
        let body = self.get(endpoint, params).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST a JSON payload
    pub async fn post(
        &self,
        endpoint: &str,
        json: Option<JsonValue>,
        params: Option<&Params>,
    ) -> Result<Response> {
        self.write(Method::POST, endpoint, json, params).await
    }

    /// PUT a JSON payload
    pub async fn put(
        &self,
        endpoint: &str,
        json: Option<JsonValue>,
        params: Option<&Params>,
    ) -> Result<Response> {
        self.write(Method::PUT, endpoint, json, params).await
    }

    /// PATCH a JSON payload
    pub async fn patch(
        &self,
        endpoint: &str,
        json: Option<JsonValue>,
        params: Option<&Params>,
    ) -> Result<Response> {
        self.write(Method::PATCH, endpoint, json, params).await
    }

    /// DELETE a resource
    pub async fn delete(&self, endpoint: &str, params: Option<&Params>) -> Result<Response> {
        self.request(
            Method::DELETE,
            endpoint,
            RequestOptions::new().maybe_params(params),
        )
        .await
    }

    async fn write(
        &self,
        method: Method,
        endpoint: &str,
        json: Option<JsonValue>,
        params: Option<&Params>,
    ) -> Result<Response> {
        let mut options = RequestOptions::new().maybe_params(params);
        options.json = json;
        self.request(method, endpoint, options).await
    }

    // ------------------------------------------------------------------------
    // Paging
    // ------------------------------------------------------------------------

    /// Lazy page stream over a paged collection
    ///
    /// The first page is fetched before this returns.
    pub async fn get_paged(
        &self,
        endpoint: &str,
        params: Option<Params>,
        page_size: PageSize,
    ) -> Result<PageStream<'_>> {
        Paginator::new(self, endpoint, page_size, params)?
            .pages()
            .await
    }

    /// All pages of a collection merged into `{key: [...]}`
    pub async fn get_paged_merged(
        &self,
        endpoint: &str,
        params: Option<Params>,
        page_size: PageSize,
    ) -> Result<JsonValue> {
        Paginator::new(self, endpoint, page_size, params)?
            .merge()
            .await
    }

    // ------------------------------------------------------------------------
    // Partitioned writes
    // ------------------------------------------------------------------------

    /// POST a `{key: [...]}` payload in chunks of at most `threshold` items
    ///
    /// Payload, threshold and endpoint are checked before anything is sent.
    /// Chunks are posted one at a time as the stream is polled; the first
    /// failure ends the stream.
    pub fn post_partitioned(
        &self,
        endpoint: &str,
        payload: JsonValue,
        params: Option<Params>,
        threshold: Threshold,
    ) -> Result<ResponseStream<'_>> {
        validate(endpoint, "json", None, params.as_ref())?;
        let payload = PartitionPayload::new(payload)?;

        info!(
            "Posting {} '{}' items to {} in {} chunks",
            payload.len(),
            payload.key(),
            endpoint,
            payload.chunk_count(threshold)
        );

        let state = PartitionState {
            api: self,
            endpoint: endpoint.to_string(),
            params,
            chunks: payload.chunks(threshold),
            sent: 0,
        };

        Ok(Box::pin(stream::try_unfold(state, |state| next_chunk(state))))
    }

    // ------------------------------------------------------------------------
    // SQL views
    // ------------------------------------------------------------------------

    /// Stream the rows of a SQL view
    ///
    /// The view type is looked up first. `QUERY` views need `var` and cannot
    /// be executed; other views may be filtered with `criteria` and
    /// materialized with `execute` before reading.
    pub async fn get_sqlview(&self, uid: &str, options: SqlViewOptions) -> Result<SqlViewRows> {
        if !is_valid_uid(uid) {
            warn!("'{}' does not look like a valid UID", uid);
        }

        let descriptor = self
            .get_json(
                &format!("sqlViews/{uid}"),
                Some(&Params::new().with("fields", "type")),
            )
            .await?;
        let view_type = descriptor
            .get("type")
            .and_then(JsonValue::as_str)
            .map(SqlViewType::from)
            .ok_or_else(|| Error::decode(format!("sqlViews/{uid} has no `type`")))?;

        let plan = plan(&view_type, &options)?;
        debug!("SQL view {} is of type {}", uid, view_type);

        if plan.materialize {
            self.post(&format!("sqlViews/{uid}/execute"), None, None)
                .await?;
        }

        let response = self
            .request(
                Method::GET,
                &format!("sqlViews/{uid}/data"),
                RequestOptions::new().file_type("csv").params(plan.params),
            )
            .await?;

        Ok(RowStream::new(response.bytes_stream().boxed(), options.csv))
    }

    /// Read every row of a SQL view
    pub async fn get_sqlview_rows(&self, uid: &str, options: SqlViewOptions) -> Result<Vec<Row>> {
        self.get_sqlview(uid, options).await?.try_collect().await
    }
}

#[async_trait]
impl PageSource for Api {
    async fn fetch_page(&self, endpoint: &str, params: &Params) -> Result<JsonValue> {
        self.get_json(endpoint, Some(params)).await
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DHIS2 Base URL: '{}'\nAPI URL: '{}'\nUsername: '{}'",
            self.base_url,
            self.api_url(),
            self.username
        )
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("username", &self.username)
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}

/// Map a non-success status to a request error carrying the body text
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let description = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to read error body from {}: {}", url, e);
            String::new()
        }
    };
    debug!("{} -> {}", url, status.as_u16());
    Err(Error::request(status.as_u16(), url, description))
}

struct PartitionState<'a> {
    api: &'a Api,
    endpoint: String,
    params: Option<Params>,
    chunks: Chunks,
    sent: usize,
}

async fn next_chunk(
    mut state: PartitionState<'_>,
) -> Result<Option<(Response, PartitionState<'_>)>> {
    let Some(chunk) = state.chunks.next() else {
        debug!("{}: {} chunks posted", state.endpoint, state.sent);
        return Ok(None);
    };

    state.sent += 1;
    debug!(
        "{}: posting chunk {} ({} left)",
        state.endpoint,
        state.sent,
        state.chunks.len()
    );

    let response = state
        .api
        .post(&state.endpoint, Some(chunk), state.params.as_ref())
        .await?;
    Ok(Some((response, state)))
}
