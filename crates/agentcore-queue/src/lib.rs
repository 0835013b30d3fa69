//! Priority event queue, signal bus, and Weber–Fechner change detector —
//! the raw-signal plumbing the autonomic and aggregation layers sit on.

pub mod change_detector;
pub mod priority_queue;
pub mod signal_bus;

pub use change_detector::{detect_change, ChangeDetectorConfig, ChangeResult};
pub use priority_queue::{PriorityEventQueue, PruneConfig};
pub use signal_bus::{HandlerFuture, SignalBus, SignalFilter, SignalHandler};
