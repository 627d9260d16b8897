pub mod bills;
pub mod contact;
pub mod inbox;
pub mod whatsapp;
