//! Core types and definitions for the FATHOM sonar simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! targets, contacts, commands, state snapshots, events, and constants.
//! It has no dependency on any host runtime, renderer, or audio backend.

pub mod commands;
pub mod contact;
pub mod constants;
pub mod enums;
pub mod events;
pub mod state;
pub mod target;
pub mod types;
