pub mod channels;
pub mod event_bus;
pub mod secure_config;
pub mod template_renderer;
