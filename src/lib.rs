//! Facility reservation engine.
//!
//! A [`catalog::Catalog`] describes bookable facilities and how each one is
//! priced. The [`engine::Engine`] accepts booking requests for a facility,
//! date and `HH:MM` time range, rejects any that overlap an existing booking
//! for the same facility and date, prices the rest with [`pricing::price`],
//! and optionally records them in an append-only [`wal::Wal`].

pub mod catalog;
pub mod command;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod pricing;
pub mod wal;
pub mod wire;
