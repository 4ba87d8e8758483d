//! Game simulation modules

pub mod ball;
pub mod capture;
pub mod events;
pub mod physics;
pub mod popup;
pub mod runner;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod table;

pub use runner::SessionRunner;
