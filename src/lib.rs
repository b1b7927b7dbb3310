//! Cache-first movie catalog.
//!
//! A [`catalog::CatalogRepository`] serves genre lists and title-ordered
//! movie pages from a local SQLite cache, falling back to the HTTP backend
//! and persisting whatever it fetches. A [`viewstate::CatalogViewState`]
//! drives refresh, genre switching and infinite-scroll pagination on top of
//! it and publishes one consistent [`viewstate::ViewState`] at a time.

pub mod catalog;
pub mod config;
pub mod model;
pub mod remote;
pub mod storage;
pub mod util;
pub mod viewstate;
