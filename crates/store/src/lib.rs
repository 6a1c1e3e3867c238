//! File-backed collaborators for the Swapdesk assistant.
//!
//! Two concerns live here, both behind narrow interfaces so the agent
//! runtime never touches a file format directly:
//!
//! - [`history`]: the rolling chat-history log (a capped JSON array with
//!   write serialization across concurrent turns).
//! - [`records`]: typed readers for the demo account data the built-in
//!   tools format (order tracking, profile, purchases, trending products,
//!   company info).

pub mod history;
pub mod records;

pub use history::{FileHistoryLog, HistoryError, HistoryLog};
pub use records::{DataError, GiftCard, OrderTracking, Profile, Purchases, TrendingProducts};
