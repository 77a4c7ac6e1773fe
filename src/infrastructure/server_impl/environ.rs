//! Raw request environment, keyed the CGI/WSGI way.

use crate::infrastructure::server_impl::headers::HeaderMap;
use compact_str::CompactString;
use fnv::FnvHashMap;

pub mod keys {
    pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
    pub const PATH_INFO: &str = "PATH_INFO";
    pub const QUERY_STRING: &str = "QUERY_STRING";
    pub const URL_SCHEME: &str = "wsgi.url_scheme";
    pub const HTTPS: &str = "HTTPS";
    pub const SERVER_NAME: &str = "SERVER_NAME";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const HTTP_HOST: &str = "HTTP_HOST";
    pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
    pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";

    pub const HEADER_PREFIX: &str = "HTTP_";
}

/// A possibly partial set of environment variables plus the request body.
///
/// Nothing is validated here; every consumer must cope with missing keys.
#[derive(Debug, Clone, Default)]
pub struct Environ<'a> {
    vars: FnvHashMap<CompactString, CompactString>,
    input: &'a [u8],
}

impl<'a> Environ<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            vars: Default::default(),
            input,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<CompactString>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<CompactString>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<CompactString> {
        self.vars.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|c| c.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Stores a request header under its `HTTP_*` name.
    pub fn insert_header(&mut self, name: &str, value: impl Into<CompactString>) {
        let key = header_to_key(name);
        self.vars.insert(key, value.into());
    }

    /// Rebuilds the request headers from the `HTTP_*` variables, plus the two
    /// content headers CGI keeps unprefixed.
    pub fn headers(&self) -> HeaderMap {
        self.vars
            .iter()
            .filter_map(|(key, value)| {
                let name = match key.as_str() {
                    keys::CONTENT_TYPE | keys::CONTENT_LENGTH => key_to_header(key),
                    other => key_to_header(other.strip_prefix(keys::HEADER_PREFIX)?),
                };
                Some((name, value.clone()))
            })
            .collect()
    }
}

fn header_to_key(name: &str) -> CompactString {
    let normalized = name.to_ascii_uppercase().replace('-', "_");
    match normalized.as_str() {
        keys::CONTENT_TYPE | keys::CONTENT_LENGTH => normalized.into(),
        _ => compact_str::format_compact!("{}{normalized}", keys::HEADER_PREFIX),
    }
}

fn key_to_header(key: &str) -> CompactString {
    key.to_ascii_lowercase().replace('_', "-").into()
}
