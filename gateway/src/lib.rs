//! Persistence gateway for the floor-plan editor.
//!
//! Talks to the REST backend that stores floor plans: loading a plan,
//! saving the whole element list, per-element create/delete, and the
//! side-panel endpoints (safety info, machine info, documents). The editor
//! kernel itself lives in `planner`; this crate only moves its
//! [`planner::doc::PlanSnapshot`]s over HTTP.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`client`] | [`PlanClient`], the async HTTP client |
//! | [`config`] | [`GatewayConfig`] built from environment variables |
//! | [`sequence`] | Save ticketing so a slow save cannot report over a newer one |
//! | [`record`] | Flattened per-element records for `POST /element` |
//! | [`error`] | [`GatewayError`] |

pub mod client;
pub mod config;
pub mod error;
pub mod record;
pub mod sequence;

pub use client::PlanClient;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use record::ElementRecord;
pub use sequence::{SaveOutcome, SaveSequencer, SaveTicket};
