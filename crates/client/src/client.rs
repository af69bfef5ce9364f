//! Omeda API client
//!
//! Owns client configuration, environment selection, endpoint construction,
//! and the request pipeline that every resource dispatches through.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::environment::Environment;
use crate::error::{OmedaError, Result};
use crate::http::HttpClient;
use crate::params::ParameterSet;
use crate::resources::{BrandApi, CustomerApi, OmailApi, Resource, UtilityApi};

/// Header carrying the licensed application id, sent on every request
pub const APP_ID_HEADER: &str = "x-omeda-appid";
/// Header identifying the input source, sent on mutating requests only
pub const INPUT_ID_HEADER: &str = "x-omeda-inputid";

/// Fixed base path of the REST surface on both hosts
const BASE_PATH: &str = "/webservices/rest";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Client for the Omeda marketing/CRM REST API
///
/// Holds the validated settings, the target environment, and the shared
/// HTTP transport. Resource accessors ([`OmedaClient::brand`],
/// [`OmedaClient::customer`], [`OmedaClient::omail`],
/// [`OmedaClient::utility`]) borrow the client, so one configured client
/// serves any number of calls.
#[derive(Debug, Clone)]
pub struct OmedaClient {
    params: ParameterSet,
    environment: Environment,
    http: HttpClient,
    base_url: Option<String>,
}

impl OmedaClient {
    /// Option name for the licensed client key
    pub const CLIENT_KEY: &'static str = "client_key";
    /// Option name for the brand abbreviation
    pub const BRAND_KEY: &'static str = "brand_key";
    /// Option name for the licensed application id
    pub const APP_ID: &'static str = "app_id";
    /// Option name for the input tracking id
    pub const INPUT_ID: &'static str = "input_id";

    /// Create an unconfigured client targeting production
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::Network`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a client and apply settings in one step
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::Config`] if any required setting is missing
    /// or empty.
    pub fn with_settings<I, K, V>(settings: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut client = Self::new()?;
        client.configure(settings)?;
        Ok(client)
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> OmedaClientBuilder {
        OmedaClientBuilder::default()
    }

    /// Replace the current configuration with a freshly validated one
    ///
    /// The four recognized options are [`Self::CLIENT_KEY`],
    /// [`Self::BRAND_KEY`], [`Self::APP_ID`], and [`Self::INPUT_ID`]; all
    /// are required. Unknown keys are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::Config`] if any required option is missing or
    /// empty. The previous configuration is kept in that case.
    pub fn configure<I, K, V>(&mut self, settings: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::recognized_options()?;
        params.apply(settings)?;
        self.params = params;
        Ok(())
    }

    /// Switch between the staging and production hosts
    ///
    /// Only the host changes; settings, headers, and endpoints are shared
    /// by both environments.
    pub fn use_staging(&mut self, staging: bool) {
        self.environment = if staging { Environment::Staging } else { Environment::Production };
    }

    /// Get the environment requests are currently sent to
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Check whether requests target the staging host
    pub fn is_using_staging(&self) -> bool {
        self.environment.is_staging()
    }

    /// Check whether requests target the production host
    pub fn is_using_production(&self) -> bool {
        !self.environment.is_staging()
    }

    /// Check whether every required setting has a non-empty value
    pub fn has_valid_config(&self) -> bool {
        self.params.is_valid()
    }

    /// Get the applied settings keyed by option name
    pub fn settings(&self) -> &std::collections::BTreeMap<String, String> {
        self.params.values()
    }

    /// Build a brand-scoped endpoint: `/brand/{brand_key}/{path}`
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::Config`] if the brand key is absent or empty.
    pub fn brand_endpoint(&self, path: &str) -> Result<String> {
        let brand_key = self.params.get(Self::BRAND_KEY)?;
        Ok(format!("/brand/{}/{}", brand_key, path.trim_matches('/')))
    }

    /// Build a client-scoped endpoint: `/client/{client_key}/{path}`
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::Config`] if the client key is absent or empty.
    pub fn client_endpoint(&self, path: &str) -> Result<String> {
        let client_key = self.params.get(Self::CLIENT_KEY)?;
        Ok(format!("/client/{}/{}", client_key, path.trim_matches('/')))
    }

    /// Dispatch a request against the selected environment
    ///
    /// This is the single pipeline every resource call goes through:
    /// configuration is checked, the full URL is derived from the endpoint
    /// and environment, the body is rendered, identification headers are
    /// attached, and the response status is inspected.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method to use
    /// * `endpoint` - Endpoint path below the REST base, e.g. `/brand/x/comp/*`
    /// * `body` - Optional request body rendered per `content_type`
    /// * `content_type` - Declared body type, normalized to lower case
    ///
    /// # Returns
    ///
    /// The raw response, guaranteed to carry a success status.
    ///
    /// # Errors
    ///
    /// * [`OmedaError::Config`] if required settings are missing or invalid
    /// * [`OmedaError::InvalidArgument`] if the body cannot be rendered
    /// * [`OmedaError::Network`] if dispatch fails before a status exists
    /// * [`OmedaError::Api`] for any non-success response status, carrying
    ///   the status code and raw body
    #[instrument(skip(self, body))]
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        content_type: &str,
    ) -> Result<Response> {
        self.params.ensure_valid()?;

        let content_type = content_type.trim().to_ascii_lowercase();
        let url = self.endpoint_url(endpoint);
        let payload = render_body(body, &content_type)?;
        let headers = self.request_headers(&method, &content_type)?;

        debug!(%method, %url, "dispatching API request");

        let mut request = self.http.request(method, &url).headers(headers);
        if let Some(payload) = payload {
            request = request.body(payload);
        }

        let response = self.http.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let content = response.text().await.unwrap_or_default();
            warn!(%status, %url, "API request returned error status");
            return Err(OmedaError::Api { status: status.as_u16(), content });
        }

        Ok(response)
    }

    /// Dispatch a GET request with no body
    ///
    /// # Errors
    ///
    /// Same contract as [`OmedaClient::request`].
    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        self.request(Method::GET, endpoint, None, JSON_CONTENT_TYPE).await
    }

    /// Dispatch a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Same contract as [`OmedaClient::request`].
    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Response> {
        self.request(Method::POST, endpoint, Some(body), JSON_CONTENT_TYPE).await
    }

    /// Decode a response body into a structured JSON value
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::Parse`] if the body is not valid JSON or
    /// decodes to a bare scalar, and [`OmedaError::Network`] if the body
    /// cannot be read.
    pub async fn parse_api_response(&self, response: Response) -> Result<Value> {
        let content = response
            .text()
            .await
            .map_err(|err| OmedaError::Network(format!("failed to read response body: {err}")))?;
        decode_structured(&content)
    }

    /// Look up a resource by its registered name
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::UnknownResource`] for names that are not
    /// registered.
    pub fn resource(&self, name: &str) -> Result<Resource<'_>> {
        match name {
            BrandApi::NAME => Ok(Resource::Brand(self.brand())),
            CustomerApi::NAME => Ok(Resource::Customer(self.customer())),
            OmailApi::NAME => Ok(Resource::Omail(self.omail())),
            UtilityApi::NAME => Ok(Resource::Utility(self.utility())),
            _ => Err(OmedaError::UnknownResource(name.to_string())),
        }
    }

    /// Access brand lookups
    pub fn brand(&self) -> BrandApi<'_> {
        BrandApi::new(self)
    }

    /// Access customer lookups and writes
    pub fn customer(&self) -> CustomerApi<'_> {
        CustomerApi::new(self)
    }

    /// Access email deployment operations
    pub fn omail(&self) -> OmailApi<'_> {
        OmailApi::new(self)
    }

    /// Access utility operations
    pub fn utility(&self) -> UtilityApi<'_> {
        UtilityApi::new(self)
    }

    fn recognized_options() -> Result<ParameterSet> {
        let mut params = ParameterSet::new();
        params.define(Self::CLIENT_KEY, None, true)?;
        params.define(Self::BRAND_KEY, None, true)?;
        params.define(Self::APP_ID, None, true)?;
        params.define(Self::INPUT_ID, None, true)?;
        Ok(params)
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_matches('/');
        match &self.base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), endpoint),
            None => format!("https://{}{}/{}", self.environment.host(), BASE_PATH, endpoint),
        }
    }

    fn request_headers(&self, method: &Method, content_type: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let app_id = self.params.get(Self::APP_ID)?;
        headers.insert(APP_ID_HEADER, header_value(Self::APP_ID, app_id)?);

        if is_mutating(method) {
            let input_id = self.params.get(Self::INPUT_ID)?;
            headers.insert(INPUT_ID_HEADER, header_value(Self::INPUT_ID, input_id)?);
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_str(content_type).map_err(|_| {
                    OmedaError::InvalidArgument(format!(
                        "content type is not a valid header value: {content_type}"
                    ))
                })?,
            );
        }

        Ok(headers)
    }
}

/// Builder for [`OmedaClient`]
#[derive(Debug, Default)]
pub struct OmedaClientBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    base_url: Option<String>,
    settings: Vec<(String, String)>,
}

impl OmedaClientBuilder {
    /// Set the request timeout (defaults to 30 seconds)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the User-Agent sent with every request
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Replace the fixed host and base path with an explicit URL prefix
    ///
    /// Intended for tests and local proxies. Clients without an override
    /// target the fixed Omeda hosts.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Apply settings as part of building the client
    pub fn settings<I, K, V>(mut self, settings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.settings =
            settings.into_iter().map(|(k, v)| (k.as_ref().to_string(), v.into())).collect();
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::Network`] if the HTTP client cannot be built,
    /// or [`OmedaError::Config`] if supplied settings fail validation.
    pub fn build(self) -> Result<OmedaClient> {
        let mut http = HttpClient::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        if let Some(agent) = self.user_agent {
            http = http.user_agent(agent);
        }

        let mut client = OmedaClient {
            params: OmedaClient::recognized_options()?,
            environment: Environment::default(),
            http: http.build()?,
            base_url: self.base_url,
        };

        if !self.settings.is_empty() {
            client.configure(self.settings)?;
        }

        Ok(client)
    }
}

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::DELETE)
}

fn header_value(option: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| OmedaError::Config(format!("option {option} is not a valid header value")))
}

/// Render an optional body according to the declared content type
///
/// Strings pass through unchanged, scalars are stringified, and structured
/// values are serialized to JSON. An empty rendering counts as no body.
fn render_body(body: Option<Value>, content_type: &str) -> Result<Option<String>> {
    let Some(body) = body else { return Ok(None) };

    let rendered = match body {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Array(_) | Value::Object(_) => {
            if content_type != JSON_CONTENT_TYPE {
                return Err(OmedaError::InvalidArgument(format!(
                    "structured bodies require {JSON_CONTENT_TYPE}, got {content_type}"
                )));
            }
            serde_json::to_string(&body).map_err(|err| {
                OmedaError::InvalidArgument(format!("failed to serialize request body: {err}"))
            })?
        }
        scalar => scalar.to_string(),
    };

    if rendered.is_empty() { Ok(None) } else { Ok(Some(rendered)) }
}

/// Decode text into JSON, accepting only objects and arrays
pub(crate) fn decode_structured(content: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(content)
        .map_err(|err| OmedaError::Parse(format!("response body is not valid JSON: {err}")))?;

    if value.is_object() || value.is_array() {
        Ok(value)
    } else {
        Err(OmedaError::Parse(format!("expected a JSON object or array, got: {value}")))
    }
}
