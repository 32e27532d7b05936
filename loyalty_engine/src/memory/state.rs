use std::collections::HashMap;

use chrono::Utc;

use crate::{
    db_types::{Cents, NewOrder, NewWithdrawal, Order, OrderNumber, OrderStatusType, UserAccount, Withdrawal},
    traits::{AccountApiError, OrderManagementError},
};

/// The tables of the in-memory store. Every mutation mirrors the constraints of the SQL schema.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    last_order_id: i64,
    last_account_id: i64,
    last_withdrawal_id: i64,
    orders: HashMap<OrderNumber, Order>,
    accounts: HashMap<i64, UserAccount>,
    withdrawals: Vec<Withdrawal>,
}

impl MemoryState {
    pub fn order(&self, number: &OrderNumber) -> Option<Order> {
        self.orders.get(number).cloned()
    }

    pub fn insert_order(&mut self, order: NewOrder) -> Result<Order, OrderManagementError> {
        if self.orders.contains_key(&order.order_number) {
            return Err(OrderManagementError::OrderAlreadyExists(order.order_number));
        }
        if !self.accounts.contains_key(&order.user_id) {
            return Err(OrderManagementError::DatabaseError(format!(
                "Order {} refers to unknown account #{}",
                order.order_number, order.user_id
            )));
        }
        self.last_order_id += 1;
        let now = Utc::now();
        let record = Order {
            id: self.last_order_id,
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            status: OrderStatusType::New,
            accrual: Cents::default(),
            uploaded_at: now,
            updated_at: now,
        };
        self.orders.insert(order.order_number, record.clone());
        Ok(record)
    }

    pub fn update_order_status(
        &mut self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> Result<Order, OrderManagementError> {
        let order = self.orders.get_mut(number).ok_or_else(|| OrderManagementError::OrderNotFound(number.clone()))?;
        if !order.status.can_transition_to(status) {
            return Err(OrderManagementError::ForbiddenStatusChange {
                number: number.clone(),
                from: order.status,
                to: status,
            });
        }
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    pub fn update_order_accrual(&mut self, number: &OrderNumber, accrual: Cents) -> Result<Order, OrderManagementError> {
        let order = self.orders.get_mut(number).ok_or_else(|| OrderManagementError::OrderNotFound(number.clone()))?;
        if order.status.is_terminal() {
            return Err(OrderManagementError::ForbiddenStatusChange {
                number: number.clone(),
                from: order.status,
                to: order.status,
            });
        }
        if accrual.is_negative() {
            return Err(OrderManagementError::DatabaseError(format!("Negative accrual {accrual} for order {number}")));
        }
        order.accrual = accrual;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    pub fn orders_where<P: Fn(&Order) -> bool>(&self, predicate: P) -> Vec<Order> {
        let mut orders = self.orders.values().filter(|o| predicate(o)).cloned().collect::<Vec<Order>>();
        orders.sort_by_key(|o| (o.uploaded_at, o.id));
        orders
    }

    pub fn account(&self, id: i64) -> Option<UserAccount> {
        self.accounts.get(&id).cloned()
    }

    pub fn account_by_login(&self, login: &str) -> Option<UserAccount> {
        self.accounts.values().find(|a| a.login == login).cloned()
    }

    pub fn fetch_or_create_account(&mut self, login: &str) -> UserAccount {
        if let Some(account) = self.account_by_login(login) {
            return account;
        }
        self.last_account_id += 1;
        let now = Utc::now();
        let account = UserAccount {
            id: self.last_account_id,
            login: login.to_string(),
            balance: Cents::default(),
            credential_hash: None,
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(account.id, account.clone());
        account
    }

    pub fn update_balance(&mut self, id: i64, balance: Cents) -> Result<UserAccount, AccountApiError> {
        if balance.is_negative() {
            return Err(AccountApiError::DatabaseError(format!("Account #{id} cannot have a negative balance")));
        }
        let account = self.accounts.get_mut(&id).ok_or(AccountApiError::AccountNotFound(id))?;
        account.balance = balance;
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    pub fn insert_withdrawal(&mut self, withdrawal: NewWithdrawal) -> Result<Withdrawal, AccountApiError> {
        if !self.accounts.contains_key(&withdrawal.user_id) {
            return Err(AccountApiError::AccountNotFound(withdrawal.user_id));
        }
        if withdrawal.sum.value() <= 0 {
            return Err(AccountApiError::DatabaseError(format!("Withdrawal sum must be positive, got {}", withdrawal.sum)));
        }
        self.last_withdrawal_id += 1;
        let record = Withdrawal {
            id: self.last_withdrawal_id,
            order_number: withdrawal.order_number,
            user_id: withdrawal.user_id,
            sum: withdrawal.sum,
            processed_at: Utc::now(),
        };
        self.withdrawals.push(record.clone());
        Ok(record)
    }

    pub fn withdrawals_for_user(&self, user_id: i64) -> Vec<Withdrawal> {
        self.withdrawals.iter().filter(|w| w.user_id == user_id).cloned().collect()
    }
}
