pub mod cache;
pub mod decoder;
pub mod dsp;
pub mod error;
pub mod mixer;
pub mod normalizer;
pub mod pipeline;
pub mod profile;
pub mod session;
pub mod shaper;
pub mod synth;
pub mod types;
pub mod wav_writer;
pub mod worker;

pub use error::{RenderError, Result};
pub use pipeline::{render, render_buffer};
pub use profile::Profile;
pub use types::{DecodedAudio, PcmContainer, RenderParams, StereoBuffer, Task};
