//! Signal processing stages applied to the buffered green-channel trace.
//!
//! Each stage is a pure function over a snapshot of the buffer:
//! - [`detrend`] removes the linear trend and standardises the trace
//! - [`bandpass`] applies a zero-phase Butterworth bandpass
//! - [`spectrum`] finds the dominant in-band frequency
//! - [`confidence`] scores how clearly that frequency stands out

pub mod bandpass;
pub mod confidence;
pub mod detrend;
pub mod spectrum;

pub use bandpass::{bandpass, BandpassFilter};
pub use confidence::{concentration, lobe_concentration, score};
pub use detrend::detrend;
pub use spectrum::{estimate, SpectralEstimate};
