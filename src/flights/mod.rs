//! Live flight lookup: geofence, external API, normalization.

mod fetcher;
mod geofence;
mod normalize;
mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{FlightFetcher, ViewerQuery};
pub use source::Fr24Client;

#[cfg(test)]
pub use geofence::DEMO_BOX;
