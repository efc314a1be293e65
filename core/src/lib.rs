//! Client core for the HR administration console.
//!
//! # Overview
//! Talks to the HR REST backend on behalf of the console screens: public
//! holidays, leave types, leave policies and work shifts. Each collection is
//! mirrored into a `ResourceStore`, an observable cache with per-request
//! lifecycle lanes that only changes once the server confirms a write.
//!
//! # Design
//! - `ApiClient` builds `HttpRequest`s and parses `HttpResponse`s; the actual
//!   round-trip goes through a `Transport` (host-does-IO), so everything above
//!   it is testable without a network.
//! - The bearer token comes from an injected `CredentialProvider`, read on
//!   every request.
//! - One generic `Gateway<R>` / `ResourceStore<R>` pair serves every
//!   collection; a collection is just a `Resource` impl in `resources`.
//! - Every failure becomes an `ApiError`, viewable as a `NormalizedError`
//!   `{status, message}`. Stores are where propagation stops: a failed call
//!   leaves the cache as it was and marks its lane `Failed`.

pub mod account;
pub mod client;
pub mod config;
pub mod console;
pub mod credentials;
pub mod editor;
pub mod error;
pub mod http;
pub mod resource;
pub mod resources;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use account::AccountGateway;
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError, BASE_URL_VAR};
pub use console::HrConsole;
pub use credentials::{CredentialProvider, FileTokenStore, NoCredentials, SharedToken};
pub use editor::{Editor, EditorMode};
pub use error::{ApiError, NormalizedError, StoreError, TransportError};
#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use resource::{Gateway, Resource};
pub use resources::{Holidays, LeavePolicies, LeaveTypes, WorkShifts};
pub use store::{Lane, LaneState, Lanes, Lifecycle, ResourceStore, StoreSnapshot, SubscriptionId};
pub use types::{
    CarryForward, EntityId, Holiday, HolidayDraft, HolidayFilter, LeaveColor, LeavePolicy,
    LeavePolicyDraft, LeaveType, LeaveTypeDraft, PasswordReset, Status, WorkShift, WorkShiftDraft,
};
