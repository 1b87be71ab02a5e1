//! Pure simulation logic for Holdout.
//!
//! A settlement lives one day at a time. Each day the community votes on a
//! single event, the winning option changes the world stats, the night
//! applies decay, cascades, disasters and population drift, and the next
//! day's event is chosen from whatever the new stats make available.
//!
//! Functions take plain data and return results. Randomness comes in as a
//! `&mut impl Rng` and the day number as a plain argument, so every rule can
//! be driven deterministically from tests or the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Event templates, availability gating, custom-template records |
//! | [`config`] | Selection weights, crisis/stability thresholds, genesis stats |
//! | [`error`] | Error types for loading and driving the simulation |
//! | [`mechanics`] | Overnight decay, cascade penalties, disasters, population drift |
//! | [`projects`] | Community projects, production and permanent buffs |
//! | [`resolution`] | Vote tallies, winner selection, stat deltas and endings |
//! | [`selector`] | Crisis-override and weighted event selection |
//! | [`simulation`] | Day driver with history, rewind and reset |
//! | [`stats`] | World stats snapshot, deltas and clamping |
//! | [`templates`] | Built-in event catalog |

pub mod catalog;
pub mod config;
pub mod error;
pub mod mechanics;
pub mod projects;
pub mod resolution;
pub mod selector;
pub mod simulation;
pub mod stats;
pub mod templates;
