pub mod certificate;
pub mod footprint;

pub use certificate::{issue_and_persist_certificate, issue_certificate};
pub use footprint::{compute_influence_footprint, compute_user_footprint, UserFootprint};
