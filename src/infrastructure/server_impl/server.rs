use crate::infrastructure::server_impl::environ::{keys, Environ};
use crate::infrastructure::server_impl::request::RequestView;
use crate::infrastructure::server_impl::response::{Response, StatusCode};
use crate::infrastructure::server_impl::router::Service;
use crate::AnyResult;
use compact_str::{format_compact, CompactString, ToCompactString};
use eyre::{bail, eyre};
use httparse::{ParserConfig, Status};
use memchr::memchr;

const MAX_HEADERS: usize = 32;

/// Strips a single leading and a single trailing `/`.
pub fn normalize_base_uri(base_uri: &str) -> &str {
    let base = base_uri.strip_prefix('/').unwrap_or(base_uri);
    base.strip_suffix('/').unwrap_or(base)
}

/// Mounts a single [Service] below a base path and feeds it environments.
#[derive(Debug)]
pub struct Gateway<S> {
    mount: CompactString,
    service: S,
}

impl<S: Service> Gateway<S> {
    pub fn new(base_uri: &str, service: S) -> Self {
        let base = normalize_base_uri(base_uri);
        let mount = if base.is_empty() {
            CompactString::default()
        } else {
            format_compact!("/{base}")
        };

        Self { mount, service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn call(&self, environ: &Environ<'_>) -> AnyResult<Response> {
        let request = RequestView::new(environ);

        let Some(uri) = self.relative_uri(request.path()) else {
            tracing::debug!(path = request.path(), mount = %self.mount, "outside of mount point");
            return Ok(Response::from_status_code(
                StatusCode::NotFound,
                "route not found",
            ));
        };

        let headers = environ.headers();
        tracing::debug!(
            service = self.service.name(),
            method = request.method(),
            url = %request.url(),
            uri,
            "dispatching"
        );
        self.service.handle(&request, uri, &headers)
    }

    fn relative_uri<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.mount.is_empty() {
            return Some(path);
        }

        match path.strip_prefix(self.mount.as_str())? {
            "" => Some("/"),
            rest if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }
}

fn parse_body(body: &[u8], content_length: Option<usize>) -> &[u8] {
    if let Some(length) = content_length {
        return &body[..length.min(body.len())];
    }

    if body.first() == Some(&b'\0') {
        return &[];
    }

    memchr(b'\0', body).map(|idx| &body[..idx]).unwrap_or(body)
}

/// Reduces a request target to origin-form (`/path?query`). Absolute-form
/// loses its scheme and authority; asterisk-form and anything else not rooted
/// at `/` is rejected.
fn origin_form(target: &str) -> AnyResult<&str> {
    if target.starts_with('/') {
        return Ok(target);
    }

    let Some((_, rest)) = target.split_once("://") else {
        bail!("unsupported request target: {target}");
    };

    match rest.find(['/', '?']) {
        Some(idx) if rest[idx..].starts_with('/') => Ok(&rest[idx..]),
        // authority followed directly by a query, or nothing at all
        Some(_) | None => Ok("/"),
    }
}

/// Turns a raw HTTP/1.1 request into an [Environ].
///
/// Only complete requests are accepted; the body is whatever follows the
/// header block, cut at `Content-Length` when present.
pub fn parse_http<'a>(
    request: &'a [u8],
    server_name: &str,
    server_port: u16,
) -> AnyResult<Environ<'a>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let body_idx = match ParserConfig::default().parse_request(&mut req, request)? {
        Status::Complete(idx) => idx,
        Status::Partial => bail!("incomplete request"),
    };

    let method = req.method.ok_or_else(|| eyre!("request without method"))?;
    let target = origin_form(req.path.ok_or_else(|| eyre!("request without path"))?)?;
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let content_length = req
        .headers
        .iter()
        .find(|c| unicase::eq(c.name, "content-length"))
        .map(|c| std::str::from_utf8(c.value))
        .transpose()?
        .map(|c| c.trim().parse::<usize>())
        .transpose()?;

    let mut environ = Environ::new(parse_body(&request[body_idx..], content_length))
        .with(keys::REQUEST_METHOD, method)
        .with(keys::PATH_INFO, path)
        .with(keys::URL_SCHEME, "http")
        .with(keys::SERVER_NAME, server_name)
        .with(keys::SERVER_PORT, server_port.to_compact_string());

    if let Some(query) = query {
        environ.insert(keys::QUERY_STRING, query);
    }

    // obs-text is legal in header values; keep the header rather than the request failing
    for header in req.headers.iter() {
        environ.insert_header(header.name, &*String::from_utf8_lossy(header.value));
    }

    Ok(environ)
}
