// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use escola_app::{
    FetchQuery, FormPayload, MutationOutcome, Record, RecordBatch, RecordKey, RecordMutator,
    RecordSource, Resource, ServerPagination,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Credentials for the back-office API, handed to the client explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let token = token.trim();
        Self {
            token: (!token.is_empty()).then(|| token.to_owned()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    session: Session,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, session: Session) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base_url = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("parse api.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            session,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// `GET {base}/{resource}` with paging, search, and active filters as
    /// query parameters.
    pub fn list<R: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &FetchQuery,
    ) -> Result<RecordBatch<R>> {
        let url = self.list_url(resource, query)?;
        tracing::debug!(%url, "listing records");
        let response = self.send(self.http.get(url))?;
        let envelope: ListEnvelope<R> = read_envelope(response, resource.path())?;
        if !envelope.success {
            return Err(refusal(envelope.message));
        }

        let records = envelope.data.unwrap_or_default();
        tracing::debug!(
            resource = resource.path(),
            count = records.len(),
            paged = envelope.pagination.is_some(),
            "records listed"
        );
        Ok(RecordBatch {
            records,
            pagination: envelope.pagination,
        })
    }

    pub fn create(&self, resource: Resource, form: &FormPayload) -> Result<MutationOutcome> {
        check_form(resource, form)?;
        let url = self.endpoint(&[resource.path()])?;
        self.mutate(self.http.post(url).json(form), resource)
    }

    pub fn update(
        &self,
        resource: Resource,
        key: &RecordKey,
        form: &FormPayload,
    ) -> Result<MutationOutcome> {
        check_form(resource, form)?;
        let url = self.endpoint(&[resource.path(), &key.to_string()])?;
        self.mutate(self.http.put(url).json(form), resource)
    }

    pub fn delete(&self, resource: Resource, key: &RecordKey) -> Result<MutationOutcome> {
        let url = self.endpoint(&[resource.path(), &key.to_string()])?;
        tracing::info!(resource = resource.path(), %key, "deleting record");
        self.mutate(self.http.delete(url), resource)
    }

    pub fn list_url(&self, resource: Resource, query: &FetchQuery) -> Result<Url> {
        let mut url = self.endpoint(&[resource.path()])?;
        let mut params = Vec::new();
        if query.page > 0 {
            params.push(("page", query.page.to_string()));
        }
        if query.per_page > 0 {
            params.push(("limit", query.per_page.to_string()));
        }
        if !query.search.is_empty() {
            params.push(("search", query.search.clone()));
        }
        for (name, value) in &query.filters {
            params.push((name.as_str(), value.clone()));
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("api.base_url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request
            .send()
            .map_err(|error| request_error(self.base_url(), self.timeout, error))
    }

    fn mutate(&self, request: RequestBuilder, resource: Resource) -> Result<MutationOutcome> {
        let response = self.send(request)?;
        let envelope: MutationEnvelope = read_envelope(response, resource.path())?;
        if !envelope.success {
            return Err(refusal(envelope.message));
        }
        Ok(MutationOutcome {
            key: envelope
                .data
                .filter(|data| data.get("id").is_some() || data.get("codigo").is_some())
                .map(|data| data.key()),
            message: envelope.message,
        })
    }
}

/// A `Client` bound to one collection.
#[derive(Debug, Clone)]
pub struct ResourceClient<R> {
    client: Client,
    resource: Resource,
    record: PhantomData<fn() -> R>,
}

impl<R> ResourceClient<R> {
    pub fn new(client: Client, resource: Resource) -> Self {
        Self {
            client,
            resource,
            record: PhantomData,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl<R: DeserializeOwned> RecordSource<R> for ResourceClient<R> {
    fn fetch(&self, query: &FetchQuery) -> Result<RecordBatch<R>> {
        self.client.list(self.resource, query)
    }
}

impl<R> RecordMutator for ResourceClient<R> {
    fn create(&self, form: &FormPayload) -> Result<MutationOutcome> {
        self.client.create(self.resource, form)
    }

    fn update(&self, key: &RecordKey, form: &FormPayload) -> Result<MutationOutcome> {
        self.client.update(self.resource, key, form)
    }

    fn delete(&self, key: &RecordKey) -> Result<MutationOutcome> {
        self.client.delete(self.resource, key)
    }
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<R> {
    success: bool,
    data: Option<Vec<R>>,
    pagination: Option<ServerPagination>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MutationEnvelope {
    success: bool,
    data: Option<Value>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}

fn check_form(resource: Resource, form: &FormPayload) -> Result<()> {
    if form.resource() != resource {
        bail!(
            "{} form sent to {}",
            form.resource().path(),
            resource.path()
        );
    }
    form.validate()?;
    Ok(())
}

fn read_envelope<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(clean_error_response(status, &body));
    }
    response
        .json()
        .with_context(|| format!("decode {what} response"))
}

fn refusal(message: Option<String>) -> anyhow::Error {
    match message.filter(|message| !message.trim().is_empty()) {
        Some(message) => anyhow!("request refused: {message}"),
        None => anyhow!("request refused by server"),
    }
}

fn request_error(base_url: &str, timeout: Duration, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "request to {} timed out after {}s",
            base_url,
            timeout.as_secs_f32()
        );
    }
    anyhow!(
        "cannot reach {} -- check api.base_url in the config file ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if !body.is_empty() && body.len() < 100 && !body.contains('{') && !body.contains('<') {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::{Client, DEFAULT_TIMEOUT, Session, clean_error_response, refusal};
    use escola_app::{FetchQuery, Resource};
    use reqwest::StatusCode;

    fn client(base: &str) -> Client {
        Client::new(base, DEFAULT_TIMEOUT, Session::anonymous()).expect("client should build")
    }

    #[test]
    fn base_url_is_validated() {
        assert!(Client::new("  ", DEFAULT_TIMEOUT, Session::anonymous()).is_err());
        let error = Client::new("ftp://example.org", DEFAULT_TIMEOUT, Session::anonymous())
            .expect_err("ftp is not allowed");
        assert!(error.to_string().contains("http or https"));
        assert_eq!(client("http://localhost:3000/api/").base_url(), "http://localhost:3000/api");
    }

    #[test]
    fn list_url_sends_only_meaningful_params() -> anyhow::Result<()> {
        let client = client("http://localhost:3000/api");
        let bare = client.list_url(Resource::Students, &FetchQuery::default())?;
        assert_eq!(bare.as_str(), "http://localhost:3000/api/students");

        let query = FetchQuery {
            page: 2,
            per_page: 10,
            search: "ana maria".to_owned(),
            filters: vec![("status".to_owned(), "active".to_owned())],
        };
        let url = client.list_url(Resource::Classes, &query)?;
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/classes?page=2&limit=10&search=ana+maria&status=active"
        );
        Ok(())
    }

    #[test]
    fn base_without_path_still_joins() -> anyhow::Result<()> {
        let url = client("http://localhost:3000").list_url(Resource::Payments, &FetchQuery::default())?;
        assert_eq!(url.as_str(), "http://localhost:3000/payments");
        Ok(())
    }

    #[test]
    fn session_ignores_blank_tokens() {
        assert_eq!(Session::with_token("  ").token(), None);
        assert_eq!(Session::with_token(" abc ").token(), Some("abc"));
    }

    #[test]
    fn error_bodies_are_cleaned() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            clean_error_response(status, r#"{"success":false,"message":"erro interno"}"#)
                .to_string(),
            "server error (500): erro interno"
        );
        assert_eq!(
            clean_error_response(status, r#"{"error":"bad gateway"}"#).to_string(),
            "server error (500): bad gateway"
        );
        assert_eq!(
            clean_error_response(status, "upstream down").to_string(),
            "server error (500): upstream down"
        );
        assert_eq!(
            clean_error_response(status, "<html><body>oops</body></html>").to_string(),
            "server returned 500"
        );
    }

    #[test]
    fn refusal_prefers_server_message() {
        assert_eq!(
            refusal(Some("aluno inexistente".to_owned())).to_string(),
            "request refused: aluno inexistente"
        );
        assert_eq!(refusal(Some(" ".to_owned())).to_string(), "request refused by server");
    }
}
