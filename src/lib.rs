/// Customer location capture and mapping.
///
/// Field staff record where a customer is, who they are and optionally a
/// photo; the whole customer set can then be viewed as a Leaflet map with
/// colored markers and a density overlay.

pub mod assets;
pub mod config;
pub mod error;
pub mod flow;
pub mod geo;
pub mod map;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
