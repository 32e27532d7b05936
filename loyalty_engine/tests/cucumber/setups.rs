use cucumber::given;

use crate::cucumber::{loyalty_world::LoyaltySystem, LoyaltyWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user '{word}'")]
async fn register_user(world: &mut LoyaltyWorld, login: String) {
    let account = world.system().accounts.fetch_or_create_account(&login).await.expect("Error creating account");
    world.users.insert(login, account.id);
}
