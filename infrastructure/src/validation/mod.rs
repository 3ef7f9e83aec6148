//! Schema validation adapters.

mod required_fields;

pub use required_fields::RequiredFieldsValidator;
