//! # Pont Core
//!
//! `pont-core` is the library behind the `pont` bridge. It lets a browser client that can
//! only speak **gRPC-Web over HTTP/1.1** call a backend that only speaks **gRPC over HTTP/2**,
//! one unary call at a time.
//!
//! ## Key Components
//!
//! * **[`frame`]:** Encoding and decoding of gRPC-Web data and trailer frames.
//! * **[`MethodRouter`]:** Resolves request paths to the closed set of [`HabitMethod`]s.
//! * **[`CallExecutor`]:** Performs the upstream call over a shared, lazily connected channel.
//! * **[`GrpcWebProxy`]:** The `axum` middleware tying everything together, including CORS
//!   preflight handling.
//! * **[`ProxyConfig`]:** Listener, namespace and upstream settings, loadable from TOML.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pont_core::{CallExecutor, GrpcWebProxy, MethodRouter, ProxyConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProxyConfig::default();
//! let executor = CallExecutor::connect_lazy(&config.upstream)?;
//! let proxy = GrpcWebProxy::new(MethodRouter::new(&config.service), executor);
//!
//! let app = proxy.wrap(axum::Router::new().fallback(|| async { "not a gRPC-Web call" }));
//! let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `habits_service`, `prost` and `tonic` so that consumers use
//! compatible versions of the generated messages and their runtime.
pub mod config;
pub mod executor;
pub mod frame;
pub mod proxy;
pub mod router;

pub use config::{ConfigError, ProxyConfig, UpstreamConfig};
pub use executor::{CallError, CallExecutor, ClientConnectError};
pub use proxy::GrpcWebProxy;
pub use router::{HabitMethod, MethodRouter, RouteError};

// Re-exports
pub use habits_service;
pub use prost;
pub use tonic;
