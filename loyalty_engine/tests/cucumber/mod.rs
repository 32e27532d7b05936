pub mod loyalty_world;
pub mod setups;
pub mod steps;

pub use loyalty_world::LoyaltyWorld;
