pub mod recorders;

pub use recorders::ProvenanceGraph;
