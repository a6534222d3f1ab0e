pub mod learn;
pub mod plan;
pub mod search;
