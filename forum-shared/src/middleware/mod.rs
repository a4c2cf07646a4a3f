mod session_extractor;
mod tracing_layer;
mod metrics_layer;

pub use session_extractor::*;
pub use tracing_layer::*;
pub use metrics_layer::*;
