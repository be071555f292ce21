// Settings engine: values, constraints, declarations, the registry

pub mod constraint;
pub mod error;
pub mod events;
pub mod parser;
pub mod registry;
pub mod setting;
pub mod value;
