mod errors;
mod gap_transparency;
mod order;
pub mod utils;
