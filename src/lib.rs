pub mod api;
pub mod client;
pub mod clock;
pub mod collector;
pub mod error;
pub mod output;
pub mod tweet;
