//! Bindings for the contracts shipped with this crate. Each module embeds the
//! contract's schema and its known deployments.

pub mod dao;
pub mod profit_token;
