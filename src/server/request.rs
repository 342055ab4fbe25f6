use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage. Header names are lowercased.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Inbound request as handed over by the transport layer.
///
/// Only the pieces the dispatcher consumes are modelled: method, path,
/// a flat parameter map (one key to one-or-many values, in arrival order)
/// and headers. Bodies are never parsed here.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    path: String,
    params: Vec<(String, Vec<String>)>,
    headers: HeaderVec,
}

impl Request {
    /// Build a request from a method and a request URI. The query string, if
    /// any, is decoded into the parameter map; the fragment is dropped.
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let uri = uri.split('#').next().unwrap_or_default();
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        let mut request = Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            params: Vec::new(),
            headers: HeaderVec::new(),
        };
        if let Some(query) = query {
            for (key, value) in parse_query_params(query) {
                request.push_param(key, value);
            }
        }
        request
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Append a value to parameter `key`, keeping earlier values.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_param(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.into()));
        self
    }

    fn push_param(&mut self, key: String, value: String) {
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.params.push((key, vec![value])),
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All parameters in arrival order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// First value of a parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.param_values(name).first().map(String::as_str)
    }

    #[must_use]
    pub fn param_values(&self, name: &str) -> &[String] {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_slice())
            .unwrap_or_default()
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl<B> From<&http::Request<B>> for Request {
    fn from(req: &http::Request<B>) -> Self {
        let uri = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_string(), |pq| pq.as_str().to_string());
        let mut request = Request::new(req.method().clone(), &uri);
        for (name, value) in req.headers() {
            match value.to_str() {
                Ok(value) => {
                    request.headers.push((Arc::from(name.as_str()), value.to_string()));
                }
                Err(_) => debug!(header = %name, "Skipping non-ASCII header value"),
            }
        }
        request
    }
}

/// Decode an `application/x-www-form-urlencoded` query string into ordered
/// key/value pairs. Repeated keys yield repeated pairs.
#[must_use]
pub fn parse_query_params(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
