// handlers/mod.rs - Handler tiers
//
// Both tiers sit behind the tenant gate:
// Public (tenant only) → Protected (tenant + JWT)
pub mod public;    // /auth/* token acquisition and password reset
pub mod protected; // everything else, bearer token required
