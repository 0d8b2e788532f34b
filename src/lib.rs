//! Enable and disable integration flows (syncs and actions).
//!
//! The [`controller::EnablementController`] owns the toggle state machine: it
//! decides whether a confirmation prompt is needed, picks between creating a
//! flow and re-enabling an existing one, classifies the backend outcome, and
//! reconciles the local toggle and modal with it.
pub mod client;
pub mod config;
pub mod connection;
pub mod controller;
pub mod flow;
pub mod modal;
pub mod notify;

pub use client::{EnablementClient, HttpEnablementClient, Outcome};
pub use controller::{EnablementController, EnablementState, Resolution, ToggleContext};
pub use flow::{FlowDescriptor, FlowId, FlowKind, FlowListing};
