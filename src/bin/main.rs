use std::sync::Arc;

use eyre::WrapErr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

use stackinabox_gateway::api::AdminService;
use stackinabox_gateway::application::LocalSessionManager;
use stackinabox_gateway::config::ServerConfig;
use stackinabox_gateway::infrastructure::server_impl::response::{Response, StatusCode};
use stackinabox_gateway::infrastructure::server_impl::server::{parse_http, Gateway};
use stackinabox_gateway::AnyResult;

const BUFFER_SIZE: usize = 8192;

type AdminGateway = Gateway<AdminService<Arc<LocalSessionManager>>>;

#[tokio::main]
async fn main() -> AnyResult<()> {
    let config = ServerConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    run(config).await
}

async fn run(config: ServerConfig) -> AnyResult<()> {
    let manager = Arc::new(LocalSessionManager::new());
    let admin = AdminService::new(manager, &config.admin_base_uri);
    let gateway = Arc::new(Gateway::new(&config.admin_base_uri, admin));
    let config = Arc::new(config);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, base_uri = %config.admin_base_uri, "listening");

    loop {
        let (socket, peer) = listener.accept().await?;
        let gateway = gateway.clone();
        let config = config.clone();

        tokio::spawn(async move {
            if let Err(err) = serve(socket, &gateway, &config).await {
                tracing::warn!(%peer, ?err, "connection failed");
            }
        });
    }
}

async fn serve(
    mut socket: TcpStream,
    gateway: &AdminGateway,
    config: &ServerConfig,
) -> AnyResult<()> {
    let mut buf = vec![0; BUFFER_SIZE];

    let n = socket.read(&mut buf).await?;
    // socket closed
    if n == 0 {
        return Ok(());
    }

    let response = match parse_http(&buf[..n], &config.server_name, config.port) {
        Ok(environ) => gateway.call(&environ).unwrap_or_else(|err| {
            tracing::error!(?err, "service failed");
            Response::from_status_code(StatusCode::InternalServerError, "Internal Server Error")
        }),
        Err(err) => {
            tracing::debug!(?err, "unparseable request");
            Response::from_status_code(StatusCode::BadRequest, "Bad Request")
        }
    };

    tracing::debug!(status = response.status(), "responding");
    socket.write_all(&response.into_http()).await?;
    socket.shutdown().await?;
    Ok(())
}
