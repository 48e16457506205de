//! # chordy-core
//!
//! Engine library for chordy, a pad-driven chord player. Turns an ordered
//! stream of transport and pad events into note-on/note-off messages,
//! independent of how the MIDI ports are opened.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chordy_core::config::Config;
//! use chordy_core::session::Session;
//! use chordy_types::InputEvent;
//!
//! let config = Config::load();
//! let mut session = Session::from_config(&config);
//!
//! let mut notes = Vec::new();
//! session.handle(InputEvent::Pad { code: 0x23, pressed: true }, &mut notes); // root C
//! session.handle(InputEvent::Pad { code: 0x00, pressed: true }, &mut notes); // maj
//! // notes now holds NoteOn 60, 64, 67 for the lead voice (plus the bass voice)
//!
//! session.shutdown(&mut notes); // note-offs for everything still sounding
//! ```
//!
//! ## Module Overview
//!
//! - [`clock`] — `ClockTracker`: MIDI clock pulses to bar/beat position, with
//!   save/restore for stop/continue
//! - [`chord`] — `ChordModel`, `ChordTable` and the 24-slot `ToneMask`
//! - [`voicing`] — `project()`: tone vector to ordered output pitches
//! - [`dispatch`] — `InputDispatcher`: pad transitions and replace semantics
//! - [`session`] — `Session`: owns clock, dispatcher and pad map
//! - [`surface`] — pad-code lookup and MIDI-to-input translation
//! - [`config`] — TOML configuration (embedded defaults + user override)
//! - [`midi`] — MIDI parsing/encoding and midir port managers

pub mod chord;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod midi;
pub mod session;
pub mod surface;
pub mod voicing;
