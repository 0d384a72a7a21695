//! Cookie + CSRF session against a Specify 7 server.

use crate::{Error, Result};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use taxport_core::{Filter, Record, RecordExt, ResourceStore, api_link, collection_endpoint};
use tracing::{debug, info};

const LOGIN_ENDPOINT: &str = "/context/login/";
const USER_ENDPOINT: &str = "/context/user.json";
const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// REQUEST METHOD
// =============================================================================

/// HTTP methods the API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Put,
    Post,
    Delete,
}

impl RequestMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Put => "PUT",
            RequestMethod::Post => "POST",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for RequestMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "PUT" => Ok(RequestMethod::Put),
            "POST" => Ok(RequestMethod::Post),
            "DELETE" => Ok(RequestMethod::Delete),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RequestMethod> for reqwest::Method {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

// =============================================================================
// DOMAIN HIERARCHY
// =============================================================================

/// Levels of the Specify scoping hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    Institution,
    Division,
    Discipline,
    Collection,
}

#[derive(Debug, Deserialize)]
struct LoginContext {
    #[serde(default)]
    collections: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct CollectionPage {
    objects: Vec<Record>,
}

// =============================================================================
// SESSION
// =============================================================================

/// An HTTP session with a Specify server.
///
/// Holds the cookie jar, the CSRF token, the collections offered at login,
/// and, once logged in, the current user and the ids of the logged-in
/// collection's ancestors.
#[derive(Debug)]
pub struct SpecifySession {
    domain: String,
    client: reqwest::Client,
    csrf_token: Option<String>,
    collections: BTreeMap<String, i64>,
    hierarchy: BTreeMap<Scope, i64>,
    specify_user: Option<Record>,
}

impl SpecifySession {
    /// Open a session with the server at `domain`, e.g. `http://localhost`.
    ///
    /// Reads the CSRF token and the names of the collections available for
    /// login.
    pub async fn connect(domain: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let domain = domain.into().trim_end_matches('/').to_string();

        let mut session = Self {
            domain,
            client,
            csrf_token: None,
            collections: BTreeMap::new(),
            hierarchy: BTreeMap::new(),
            specify_user: None,
        };

        let resp = session
            .send_request(RequestMethod::Get, LOGIN_ENDPOINT, None)
            .await?;
        let token = csrf_cookie(&resp).ok_or(Error::MissingCsrfToken)?;
        let context: LoginContext = read_json(resp, StatusCode::OK).await?;

        session.csrf_token = Some(token);
        session.collections = context.collections;
        Ok(session)
    }

    /// Send `method` to `endpoint` (a path on the session's domain), with
    /// `body` as JSON when given.
    pub async fn send_request(
        &self,
        method: RequestMethod,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        self.send(method, endpoint, &[], body).await
    }

    async fn send(
        &self,
        method: RequestMethod,
        endpoint: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.domain, endpoint);
        let params = query
            .iter()
            .map(|(field, value)| format!("{}={}", field, value))
            .collect::<Vec<_>>()
            .join("&");
        // credentials never reach the log
        let shown_body = body.map(|body| {
            if endpoint == LOGIN_ENDPOINT {
                "{credentials}".to_string()
            } else {
                body.to_string()
            }
        });
        match (params.is_empty(), shown_body) {
            (true, None) => info!("{} | {}", method, url),
            (true, Some(body)) => info!("{} | {} | {}", method, url, body),
            (false, None) => info!("{} | {}?{}", method, url, params),
            (false, Some(body)) => info!("{} | {}?{} | {}", method, url, params, body),
        }

        let mut request = self.client.request(method.into(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request.send().await?;
        debug!("{} | {} -> {}", method, url, resp.status());
        Ok(resp)
    }

    // =========================================================================
    // LOGIN
    // =========================================================================

    /// Log in as `username` to the collection `collection_id`.
    ///
    /// On success the current user and the collection's discipline, division
    /// and institution ids are available.
    pub async fn login(&mut self, username: &str, password: &str, collection_id: i64) -> Result<()> {
        let credentials = json!({
            "username": username,
            "password": password,
            "collection": collection_id,
        });
        let resp = self
            .send_request(RequestMethod::Put, LOGIN_ENDPOINT, Some(&credentials))
            .await?;

        let status = resp.status();
        let token = csrf_cookie(&resp);
        match status {
            StatusCode::FORBIDDEN => return Err(Error::InvalidCredentials(resp.text().await?)),
            StatusCode::BAD_REQUEST => return Err(Error::BadRequest(resp.text().await?)),
            s if !s.is_success() => {
                return Err(Error::UnexpectedStatus {
                    status: s.as_u16(),
                    body: resp.text().await?,
                });
            }
            _ => {}
        }
        if token.is_some() {
            self.csrf_token = token;
        }

        let resp = self
            .send_request(RequestMethod::Get, USER_ENDPOINT, None)
            .await?;
        let user: Record = read_json(resp, StatusCode::OK).await?;
        let hierarchy = self.resolve_hierarchy(collection_id).await?;

        info!("Logged in as {}", user.str_field("name").unwrap_or(username));
        self.specify_user = Some(user);
        self.hierarchy = hierarchy;
        Ok(())
    }

    /// End the server-side session and forget the current user.
    pub async fn logout(&mut self) -> Result<()> {
        self.require_login()?;
        let body = json!({
            "username": null,
            "password": null,
            "collection": self.domain_id(Scope::Collection),
        });
        let resp = self
            .send_request(RequestMethod::Put, LOGIN_ENDPOINT, Some(&body))
            .await?;
        if !resp.status().is_success() {
            return Err(unexpected(resp).await);
        }
        self.specify_user = None;
        self.hierarchy.clear();
        Ok(())
    }

    /// Ids of the collection's discipline, division and institution.
    /// Runs before the session counts as logged in.
    async fn resolve_hierarchy(&self, collection_id: i64) -> Result<BTreeMap<Scope, i64>> {
        let collection = self.get_record("collection", collection_id).await?;
        let discipline_id = collection.uri_id("discipline")?;
        let discipline = self.get_record("discipline", discipline_id).await?;
        let division_id = discipline.uri_id("division")?;
        let division = self.get_record("division", division_id).await?;
        let institution_id = division.uri_id("institution")?;

        Ok(BTreeMap::from([
            (Scope::Institution, institution_id),
            (Scope::Division, division_id),
            (Scope::Discipline, discipline_id),
            (Scope::Collection, collection_id),
        ]))
    }

    fn require_login(&self) -> Result<()> {
        if self.specify_user.is_none() {
            return Err(Error::NotLoggedIn);
        }
        Ok(())
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Id of the collection called `name`, if the server offers it.
    pub fn collection_id(&self, name: &str) -> Option<i64> {
        self.collections.get(name).copied()
    }

    /// Collections available for login, by name.
    pub fn collections(&self) -> &BTreeMap<String, i64> {
        &self.collections
    }

    /// Id of the logged-in record at `scope`.
    pub fn domain_id(&self, scope: Scope) -> Option<i64> {
        self.hierarchy.get(&scope).copied()
    }

    /// The logged-in Specify user record.
    pub fn specify_user(&self) -> Option<&Record> {
        self.specify_user.as_ref()
    }

    // =========================================================================
    // RESOURCES
    // =========================================================================

    /// Fetch the record `id` of `table`.
    ///
    /// Independent to-one relationships come back as resource URIs;
    /// dependent records are inlined.
    pub async fn fetch_resource(&self, table: &str, id: i64) -> Result<Record> {
        self.require_login()?;
        self.get_record(table, id).await
    }

    async fn get_record(&self, table: &str, id: i64) -> Result<Record> {
        let resp = self
            .send_request(RequestMethod::Get, &api_link(table, id), None)
            .await?;
        read_json(resp, StatusCode::OK).await
    }

    /// Fetch the first page of `table` records matching `filter`.
    pub async fn fetch_collection(&self, table: &str, filter: &Filter) -> Result<Vec<Record>> {
        self.require_login()?;
        let resp = self
            .send(
                RequestMethod::Get,
                &collection_endpoint(table),
                filter.pairs(),
                None,
            )
            .await?;
        let page: CollectionPage = read_json(resp, StatusCode::OK).await?;
        Ok(page.objects)
    }

    /// Create a `table` record from `data`.
    ///
    /// Relationships are given as resource URIs; dependent records can be
    /// created inline.
    pub async fn create_resource(&self, table: &str, data: &Record) -> Result<Record> {
        self.require_login()?;
        let body = Value::Object(data.clone());
        let resp = self
            .send_request(RequestMethod::Post, &collection_endpoint(table), Some(&body))
            .await?;
        read_json(resp, StatusCode::CREATED).await
    }

    /// Change `fields` of record `id` in `table`, leaving other fields as
    /// they are.
    ///
    /// The current record is fetched first so the server receives a complete
    /// record carrying the current `version`.
    pub async fn update_resource(&self, table: &str, id: i64, fields: Record) -> Result<Record> {
        let mut current = self.fetch_resource(table, id).await?;
        current.extend(fields);
        let body = Value::Object(current);

        let resp = self
            .send_request(RequestMethod::Put, &api_link(table, id), Some(&body))
            .await?;
        match resp.status() {
            StatusCode::OK => Ok(serde_json::from_str(&resp.text().await?)?),
            StatusCode::BAD_REQUEST => Err(Error::MissingVersion(resp.text().await?)),
            StatusCode::CONFLICT => Err(Error::VersionMismatch(resp.text().await?)),
            _ => Err(unexpected(resp).await),
        }
    }
}

// =============================================================================
// RESOURCESTORE
// =============================================================================

impl ResourceStore for SpecifySession {
    async fn fetch_resource(&self, table: &str, id: i64) -> taxport_core::Result<Record> {
        SpecifySession::fetch_resource(self, table, id)
            .await
            .map_err(taxport_core::Error::store)
    }

    async fn fetch_collection(&self, table: &str, filter: &Filter) -> taxport_core::Result<Vec<Record>> {
        SpecifySession::fetch_collection(self, table, filter)
            .await
            .map_err(taxport_core::Error::store)
    }

    async fn create_resource(&self, table: &str, data: Record) -> taxport_core::Result<Record> {
        SpecifySession::create_resource(self, table, &data)
            .await
            .map_err(taxport_core::Error::store)
    }

    async fn update_resource(&self, table: &str, id: i64, fields: Record) -> taxport_core::Result<Record> {
        SpecifySession::update_resource(self, table, id, fields)
            .await
            .map_err(taxport_core::Error::store)
    }
}

// =============================================================================
// RESPONSE HELPERS
// =============================================================================

fn csrf_cookie(resp: &Response) -> Option<String> {
    resp.cookies()
        .find(|cookie| cookie.name() == CSRF_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

async fn unexpected(resp: Response) -> Error {
    let status = resp.status().as_u16();
    match resp.text().await {
        Ok(body) => Error::UnexpectedStatus { status, body },
        Err(err) => Error::Http(err),
    }
}

/// Decode a JSON body, mapping 403 to `NoPermission` and any status other
/// than `expected` to `UnexpectedStatus`.
async fn read_json<T: serde::de::DeserializeOwned>(resp: Response, expected: StatusCode) -> Result<T> {
    let status = resp.status();
    if status == StatusCode::FORBIDDEN {
        return Err(Error::NoPermission(resp.text().await?));
    }
    if status != expected {
        return Err(unexpected(resp).await);
    }
    Ok(serde_json::from_str(&resp.text().await?)?)
}
