pub mod get_message;
pub mod produce_message;
