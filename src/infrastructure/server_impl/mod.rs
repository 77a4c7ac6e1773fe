pub mod environ;
pub mod headers;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
