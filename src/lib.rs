pub mod config;
pub mod error;
pub mod instance;
pub mod output;
pub mod pipeline;
pub mod random;
pub mod registry;
pub mod sampler;
pub mod scheduler;
pub mod source;

pub use config::{ChannelGroup, EffectConfig, GlitchGroup, Jitter};
pub use error::{GlitchError, GlitchResult};
pub use instance::Glitcher;
pub use output::{Collect, PngSequence, RawStdout, Renderer};
pub use random::RandomSource;
pub use registry::{Handle, Registry};
pub use sampler::{sample, GlitchParams, SampledParameters};
pub use scheduler::{Scheduler, StopHandle, TickStats};
pub use source::FrameSource;
