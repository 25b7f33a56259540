//! Client for managing DNS records through the DreamHost API, used to publish
//! and withdraw ACME DNS-01 challenge records.

pub mod dns;
