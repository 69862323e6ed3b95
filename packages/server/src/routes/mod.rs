pub mod analyze;
pub mod health;
pub mod image_proxy;
