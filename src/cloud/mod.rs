pub mod controller;
pub mod enrich;
pub mod filter;
pub mod layout;
