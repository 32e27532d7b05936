use std::time::Duration;

use cucumber::{then, when};
use loyalty_engine::{
    db_types::{Cents, OrderNumber, OrderStatusType},
    test_utils::accrual::{invalid, network_error, pending, processed},
    OrderManagement,
    WithdrawError,
};

use crate::cucumber::LoyaltyWorld;

fn amount(value: &str) -> Cents {
    value.parse::<Cents>().expect("Not a valid amount")
}

#[when(expr = "the accrual service reports order {word} as PROCESSED with an accrual of {word}")]
async fn script_processed(world: &mut LoyaltyWorld, number: String, accrual: String) {
    world.system().client.push(&number, processed(&number, amount(&accrual).value()));
}

#[when(expr = "the accrual service reports order {word} as INVALID")]
async fn script_invalid(world: &mut LoyaltyWorld, number: String) {
    world.system().client.push(&number, invalid(&number));
}

#[when(expr = "the accrual service reports order {word} as pending {int} times")]
async fn script_pending(world: &mut LoyaltyWorld, number: String, times: usize) {
    world.system().client.push_many(&number, (0..times).map(|_| pending(&number)));
}

#[when(expr = "the accrual service cannot be reached for order {word} {int} times")]
async fn script_network_errors(world: &mut LoyaltyWorld, number: String, times: usize) {
    world.system().client.push_many(&number, (0..times).map(|_| network_error()));
}

#[when(expr = "'{word}' uploads order {word}")]
async fn upload_order(world: &mut LoyaltyWorld, login: String, number: String) {
    let user = world.user(&login);
    let result = world.system().enrollment().require_order(&number, user).await;
    world.last_upload = Some(result);
}

#[when("reconciliation is complete")]
async fn finish_reconciliation(world: &mut LoyaltyWorld) {
    let system = world.system.as_mut().expect("LoyaltySystem not initialised");
    tokio::time::timeout(Duration::from_secs(10), system.finish_reconciliation())
        .await
        .expect("Reconciliation did not finish in time");
}

#[when(expr = "'{word}' withdraws {word} against order {word}")]
async fn withdraw(world: &mut LoyaltyWorld, login: String, sum: String, number: String) {
    let user = world.user(&login);
    let result = world.system().withdrawals.create_withdrawal(user, &number, amount(&sum)).await;
    world.last_withdrawal = Some(result);
}

#[then(expr = "the upload is accepted for '{word}'")]
async fn upload_accepted(world: &mut LoyaltyWorld, login: String) {
    let user = world.user(&login);
    let order = world.last_upload.as_ref().expect("Nothing was uploaded").as_ref().expect("Upload failed");
    assert!(order.is_owned_by(user), "Order belongs to user #{} instead of {login}", order.user_id);
}

#[then(expr = "the upload belongs to '{word}'")]
async fn upload_conflict(world: &mut LoyaltyWorld, login: String) {
    upload_accepted(world, login).await;
}

#[then("the upload is rejected as an invalid order number")]
async fn upload_rejected(world: &mut LoyaltyWorld) {
    let result = world.last_upload.as_ref().expect("Nothing was uploaded");
    assert!(matches!(result, Err(loyalty_engine::EnrollmentError::InvalidOrderNumber(_))), "{result:?}");
}

#[then(expr = "order {word} is {word}")]
async fn order_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let order = world
        .system()
        .db
        .fetch_order_by_number(&OrderNumber::new(number.as_str()))
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {number} does not exist"));
    let expected = status.parse::<OrderStatusType>().expect("Unknown status");
    assert_eq!(order.status, expected, "Status is incorrect");
}

#[then(expr = "order {word} has an accrual of {word}")]
async fn order_accrual(world: &mut LoyaltyWorld, number: String, accrual: String) {
    let order = world
        .system()
        .db
        .fetch_order_by_number(&OrderNumber::new(number.as_str()))
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {number} does not exist"));
    assert_eq!(order.accrual, amount(&accrual), "Accrual is incorrect");
}

#[then(expr = "'{word}' has a balance of {word} and has withdrawn {word}")]
async fn check_balance(world: &mut LoyaltyWorld, login: String, current: String, withdrawn: String) {
    let user = world.user(&login);
    let summary = world.system().accounts.balance_for_user(user).await.expect("Error fetching balance");
    assert_eq!(summary.current, amount(&current), "Current balance is incorrect");
    assert_eq!(summary.withdrawn, amount(&withdrawn), "Withdrawn total is incorrect");
}

#[then("the withdrawal succeeds")]
async fn withdrawal_succeeds(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.as_ref().expect("Nothing was withdrawn");
    assert!(result.is_ok(), "{result:?}");
}

#[then(expr = "the withdrawal fails with {word}")]
async fn withdrawal_fails(world: &mut LoyaltyWorld, reason: String) {
    let result = world.last_withdrawal.as_ref().expect("Nothing was withdrawn");
    let matched = match reason.as_str() {
        "NoMoney" => matches!(result, Err(WithdrawError::NoMoney { .. })),
        "EmptyBalance" => matches!(result, Err(WithdrawError::EmptyBalance)),
        "InvalidOrderNumber" => matches!(result, Err(WithdrawError::InvalidOrderNumber(_))),
        _ => panic!("Unknown failure {reason}"),
    };
    assert!(matched, "Expected {reason}, got {result:?}");
}
