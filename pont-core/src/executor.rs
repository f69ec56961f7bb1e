//! # Call Executor
//!
//! Invokes a [`HabitMethod`] against the real backend over a shared HTTP/2 [`Channel`].
//!
//! ## How it works
//!
//! The executor wraps a single generated [`HabitServiceClient`]. Cloning a `tonic` client
//! only clones the underlying `Channel` handle, which multiplexes every call over the same
//! HTTP/2 connection, so each call works on its own clone and no call is ever serialized
//! behind another.
//!
//! The payload travels as raw Protobuf bytes: it is decoded into the method's request type,
//! sent upstream, and the response is encoded back to bytes. The executor never retries and
//! enforces no deadline of its own; both belong to the endpoint configuration.
use crate::{config::UpstreamConfig, router::HabitMethod};
use bytes::Bytes;
use habits_service::{
    HabitServiceClient,
    pb::{
        CreateHabitRequest, GetAllHabitsRequest, GetHabitHistoryRequest,
        LogHabitCompletionRequest,
    },
};
use prost::Message;
use std::future::Future;
use tonic::{
    Code, Status,
    transport::{Channel, Endpoint},
};

/// Status reported when a failure carries no code of its own.
pub const DEFAULT_FAILURE_CODE: Code = Code::Unknown;

/// Errors that can occur when setting up the upstream channel.
#[derive(Debug, thiserror::Error)]
pub enum ClientConnectError {
    #[error("Invalid upstream URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
}

/// Errors that can occur while executing a single call.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Failed to decode request message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Upstream call failed: {0}")]
    Upstream(#[from] Status),
}

impl CallError {
    /// Converts the failure into the status reported to the browser.
    ///
    /// Upstream statuses are forwarded verbatim. An empty upstream message is replaced by
    /// the code's description so the client always gets something readable.
    pub fn into_status(self) -> Status {
        match self {
            CallError::Decode(err) => {
                Status::internal(format!("Failed to decode request message: {err}"))
            }
            CallError::Upstream(status) if status.message().is_empty() => {
                let code = status.code();
                Status::new(code, code.description())
            }
            CallError::Upstream(status) => status,
        }
    }
}

/// Executes unary calls against the upstream `habits.HabitService`.
#[derive(Debug, Clone)]
pub struct CallExecutor {
    client: HabitServiceClient<Channel>,
}

impl CallExecutor {
    /// Creates an executor on top of an existing channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            client: HabitServiceClient::new(channel),
        }
    }

    /// Builds the upstream channel without connecting.
    ///
    /// The connection is established on the first call, and re-established by the channel
    /// after failures, so the proxy can start while the backend is still down.
    pub fn connect_lazy(config: &UpstreamConfig) -> Result<Self, ClientConnectError> {
        let mut endpoint = Endpoint::new(config.url.clone())
            .map_err(|e| ClientConnectError::InvalidUrl(config.url.clone(), e))?;

        if let Some(timeout) = config.connect_timeout() {
            endpoint = endpoint.connect_timeout(timeout);
        }

        if let Some(timeout) = config.request_timeout() {
            endpoint = endpoint.timeout(timeout);
        }

        Ok(Self::new(endpoint.connect_lazy()))
    }

    /// Decodes `payload` as the request message of `method`, calls the backend and returns
    /// the encoded response message.
    pub async fn execute(&self, method: HabitMethod, payload: Bytes) -> Result<Bytes, CallError> {
        let mut client = self.client.clone();

        match method {
            HabitMethod::CreateHabit => {
                unary(payload, |req: CreateHabitRequest| async move {
                    client.create_habit(req).await
                })
                .await
            }
            HabitMethod::GetAllHabits => {
                unary(payload, |req: GetAllHabitsRequest| async move {
                    client.get_all_habits(req).await
                })
                .await
            }
            HabitMethod::LogHabitCompletion => {
                unary(payload, |req: LogHabitCompletionRequest| async move {
                    client.log_habit_completion(req).await
                })
                .await
            }
            HabitMethod::GetHabitHistory => {
                unary(payload, |req: GetHabitHistoryRequest| async move {
                    client.get_habit_history(req).await
                })
                .await
            }
        }
    }
}

/// Decode -> call -> encode, shared by every method of the table.
async fn unary<Req, Res, F, Fut>(payload: Bytes, call: F) -> Result<Bytes, CallError>
where
    Req: Message + Default,
    Res: Message,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<tonic::Response<Res>, Status>>,
{
    let request = Req::decode(payload)?;
    let response = call(request).await?;
    Ok(Bytes::from(response.into_inner().encode_to_vec()))
}
