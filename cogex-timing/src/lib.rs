pub mod delay;
pub mod queue;
pub mod timer;

pub use delay::{ms_to_ns, uniform_delay_ms, NANOS_PER_MS};
pub use queue::{TimerHandle, TimerQueue};
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};
