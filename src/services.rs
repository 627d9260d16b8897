pub mod billing_service;
pub mod contact_service;
pub mod inbox_service;
pub mod notifier;
pub mod webhook_service;
