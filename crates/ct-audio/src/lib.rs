//! Audio output backends for chiptrack.
//!
//! The engine renders mono at its own fixed rate; backends adapt that to
//! whatever the device accepts.

mod cpal_backend;
mod rate;
mod traits;

pub use cpal_backend::CpalOutput;
pub use rate::RateAdapter;
pub use traits::{AudioError, AudioOutput};
