pub mod animation;
pub mod social_client;
pub mod wallets;
