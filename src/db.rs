pub mod billing_repo;
pub use billing_repo::{BillingRepository, BillingStore};
pub mod contact_repo;
pub use contact_repo::{ContactRepository, ContactStore};
pub mod whatsapp_repo;
pub use whatsapp_repo::{WhatsAppRepository, WhatsAppStore};

#[cfg(test)]
pub mod memory;
