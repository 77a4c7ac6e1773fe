use crate::infrastructure::server_impl::environ::{keys, Environ};
use std::fmt::Write;

const DEFAULT_HOST: &str = "localhost";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Normalized, read-only view over an [Environ].
///
/// Missing or empty values are defaulted, never rejected, so building a view
/// cannot fail.
#[derive(Debug, Copy, Clone)]
pub struct RequestView<'e, 'a> {
    environment: &'e Environ<'a>,
    method: &'e str,
    path: &'e str,
    query: Option<&'e str>,
}

impl<'e, 'a> RequestView<'e, 'a> {
    pub fn new(environment: &'e Environ<'a>) -> Self {
        Self {
            environment,
            method: environment.get(keys::REQUEST_METHOD).unwrap_or_default(),
            path: normalize_path(environment.get(keys::PATH_INFO)),
            query: environment.get(keys::QUERY_STRING),
        }
    }

    pub fn environment(&self) -> &'e Environ<'a> {
        self.environment
    }

    pub fn method(&self) -> &'e str {
        self.method
    }

    pub fn path(&self) -> &'e str {
        self.path
    }

    pub fn query(&self) -> Option<&'e str> {
        self.query
    }

    pub fn stream(&self) -> &'a [u8] {
        self.environment.input()
    }

    pub fn scheme(&self) -> Scheme {
        let env = self.environment;
        let by_scheme = env
            .get(keys::URL_SCHEME)
            .is_some_and(|c| c.eq_ignore_ascii_case("https"));
        let by_flag = env
            .get(keys::HTTPS)
            .is_some_and(|c| c.eq_ignore_ascii_case("on") || c == "1");

        if by_scheme || by_flag {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    /// Absolute URL of the request, rebuilt on every call.
    pub fn url(&self) -> String {
        let scheme = self.scheme();
        let mut url = String::with_capacity(64);
        url.push_str(scheme.as_str());
        url.push_str("://");

        match non_empty(self.environment.get(keys::HTTP_HOST)) {
            Some(host) => url.push_str(host),
            None => {
                let host = non_empty(self.environment.get(keys::SERVER_NAME));
                url.push_str(host.unwrap_or(DEFAULT_HOST));

                if let Some(port) = non_empty(self.environment.get(keys::SERVER_PORT)) {
                    let default_port = port.trim().parse::<u16>().ok() == Some(scheme.default_port());
                    if !default_port {
                        let _ = write!(url, ":{port}");
                    }
                }
            }
        }

        url.push_str(self.path);
        if let Some(query) = self.query {
            url.push('?');
            url.push_str(query);
        }

        url
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|c| !c.is_empty())
}

fn normalize_path(raw: Option<&str>) -> &str {
    match non_empty(raw) {
        None | Some("/") => "/",
        Some(path) => path.strip_suffix('/').unwrap_or(path),
    }
}
