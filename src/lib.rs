//! Medical-assistant chat client
//!
//! A client for a medical-assistant chat service: it renders a message
//! timeline, sends text and report uploads to the backend, tracks which
//! stored conversation is active, lists and deletes past conversations, and
//! localizes its interface.
//!
//! # Architecture
//!
//! - **Gateway**: `Backend` trait over the service's HTTP endpoints
//! - **Render**: command-based view sinks (in-memory and terminal)
//! - **I18n**: dictionaries, language switching, persisted preferences
//! - **Session**: the controller that owns conversation identity and
//!   serializes every operation against it
//!
//! # Modules
//!
//! - [`config`]: layered client configuration
//! - [`error`]: gateway and preference errors
//! - [`gateway`]: backend trait, HTTP implementation, wire types
//! - [`i18n`]: translation provider and preference store
//! - [`prompt`]: line editor for the terminal front end
//! - [`render`]: render commands and sinks
//! - [`session`]: session state, controller, and history index

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod i18n;
pub mod prompt;
pub mod render;
pub mod session;
