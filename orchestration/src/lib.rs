// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! This crate provides the [crate::Session] struct, which turns the byte
//! stream from a sync editor into track and clock updates, and keeps the
//! editor informed about local playback.

pub use messages::SessionEvent;
pub use session::{Phase, Session, SessionParams};

pub mod commands;
pub mod helpers;
pub mod messages;

mod session;
