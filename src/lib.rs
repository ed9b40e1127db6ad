//! Rangemark
//!
//! Character-offset text highlights that re-render losslessly, including
//! when highlights overlap or touch.
//!
//! # Modules
//!
//! - `highlights`: selection offsets, per-document store, segment renderer
//!   and the document view that reconciles them
//! - `html`: nested `<mark>` markup and HTML flattening
//! - `db`: SQLite persistence for highlights and document text
//! - `routes`: HTTP API served by the `rangemark` binary

pub mod config;
pub mod db;
pub mod error;
pub mod highlights;
pub mod html;
pub mod routes;
pub mod state;
