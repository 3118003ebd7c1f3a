pub mod diff_mask;
pub mod snapshot;
