pub mod config;
pub mod durable_logger;
pub mod generator;
pub mod reading;
pub mod sample_buffer;
pub mod stats;
pub mod stop_signal;
pub mod trend;

pub use config::StationConfig;
pub use durable_logger::{DurableLogger, LoggerError};
pub use generator::{RandomWalk, SampleGenerator};
pub use reading::{Reading, RecordError};
pub use sample_buffer::SampleBuffer;
pub use stop_signal::StopSignal;
pub use trend::{Trend, TrendReport, describe_trend};
