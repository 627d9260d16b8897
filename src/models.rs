pub mod billing;
pub mod contact;
pub mod outbound;
pub mod webhook;
pub mod whatsapp;
