pub mod messaging;
pub mod providers;
pub mod repositories;
