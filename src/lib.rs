//! `gachaview` - Searchable image gallery catalog with gacha rolls and a swipe viewer.

#![deny(
    warnings,
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod indexer;
pub mod modal;
pub mod navigation;
pub mod permalink;
pub mod rarity;
pub mod roll;
pub mod search;
pub mod text;
pub mod types;
