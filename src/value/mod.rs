//! Value storage shared by the planners and critics.

pub mod table;

pub use table::{ConstantValue, ValueInitializer, ValueTable};
