//! # Habits Service
//!
//! Generated `prost` messages and `tonic` bindings for the `habits.HabitService` schema.
//!
//! The proxy only needs the client side ([`HabitServiceClient`]); the server trait
//! ([`HabitService`]) exists so integration tests can stand up an in-process backend.

pub mod pb {
    tonic::include_proto!("habits");
}

pub use pb::habit_service_client::HabitServiceClient;
pub use pb::habit_service_server::{HabitService, HabitServiceServer};

/// Fully qualified name of the service, as it appears in gRPC request paths.
pub const SERVICE_NAME: &str = "habits.HabitService";
