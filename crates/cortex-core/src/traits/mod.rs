mod embedder;
mod tracer;

pub use embedder::Embedder;
pub use tracer::{Tracer, TracingTracer};
