// handlers/public/mod.rs - Public handlers (no bearer token required)
//
// These endpoints still resolve and validate the tenant: a token can only be
// acquired from the tenant database the request was routed to.

pub mod auth;
