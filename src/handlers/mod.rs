pub mod auth_handlers;
pub mod health_handlers;
pub mod page_handlers;
pub mod script_handlers;
pub mod upload_handlers;
