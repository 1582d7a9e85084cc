pub mod cache;
pub mod db;
pub mod hash;
pub mod whatsapp;
pub mod zoho;
