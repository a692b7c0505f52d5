//! Server module for Babel Core.
//!
//! This module contains the HTTP/1.1 server and the request handlers.

pub mod logging;
pub mod routes;

use std::future::Future;
use std::sync::Arc;

use hyper::Request;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::service::TranslationService;
use logging::with_request_logging;

/// Start the Babel HTTP server and run it until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the server fails to bind to
/// the configured address.
pub async fn run(config: &Config) -> Result<()> {
    let service = Arc::new(TranslationService::from_config(config)?);
    let listener = TcpListener::bind(config.server.address).await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
    };

    serve(listener, service, shutdown).await
}

/// Serve HTTP on `listener` until `shutdown` resolves, then free every resident model.
///
/// Connections already accepted finish on their own tasks; their translations are
/// refused with 503 once the registry is shut down.
///
/// # Errors
///
/// Returns an error if the listener's local address cannot be read.
pub async fn serve<F>(listener: TcpListener, service: Arc<TranslationService>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    info!(%addr, "Babel HTTP server started");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!(%peer, "New connection");
                        let service = Arc::clone(&service);
                        tokio::spawn(async move {
                            let io = TokioIo::new(stream);
                            let handler = service_fn(move |req: Request<hyper::body::Incoming>| {
                                let service = Arc::clone(&service);
                                async move {
                                    let response = with_request_logging(req, |req| async move {
                                        routes::handle(req, service)
                                            .await
                                            .unwrap_or_else(|never| match never {})
                                    })
                                    .await;
                                    Ok::<_, std::convert::Infallible>(response)
                                }
                            });

                            if let Err(e) = http1::Builder::new().serve_connection(io, handler).await {
                                warn!(%peer, error = %e, "Error serving connection");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Error accepting connection");
                    }
                }
            }
            () = &mut shutdown => {
                info!("Shutdown signal received, stopping accept loop");
                break;
            }
        }
    }

    service.shutdown().await;
    info!("Babel HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use babel_abstraction::LanguagePair;
    use babel_models::{ModelArtifact, ModelCatalog};

    #[tokio::test]
    async fn test_serve_stops_on_shutdown_and_frees_models() {
        let catalog = ModelCatalog::from_entries([(
            LanguagePair::new("heb", "arb"),
            ModelArtifact::new("opus-mt-he-ar"),
        )]);
        let service =
            Arc::new(TranslationService::with_catalog(Arc::new(catalog), &Config::default()).unwrap());
        service.translate("heb", "arb", "shalom").await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        serve(listener, Arc::clone(&service), async {}).await.unwrap();

        assert!(service.registry().resident_pairs().is_empty());
        let err = service.translate("heb", "arb", "shalom").await.unwrap_err();
        assert_eq!(err, babel_abstraction::EngineError::ShuttingDown);
        assert!(service.registry().resident_pairs().is_empty());
    }

    #[tokio::test]
    async fn test_run_fails_without_catalog() {
        let mut config = Config::default();
        config.models.catalog_path = "/nonexistent/translator_config.json".into();
        config.server.address = "127.0.0.1:0".parse().unwrap();

        let err = run(&config).await.unwrap_err();
        assert!(matches!(err, crate::error::BabelError::Catalog(_)));
    }
}
