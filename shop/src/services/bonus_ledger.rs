// zahroshop/src/services/bonus_ledger.rs

//! Per-user bonus balances. Balances never go negative: a debit larger than
//! the balance is refused and leaves the balance untouched.

use crate::errors::{AppError, Result as AppResult};
use crate::repo::BonusRepository;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[instrument(name = "bonus_ledger::balance", skip(bonuses))]
pub async fn balance(bonuses: &dyn BonusRepository, user_id: Uuid) -> AppResult<i64> {
  bonuses.balance(user_id).await
}

#[instrument(name = "bonus_ledger::accrue", skip(bonuses), err(Display))]
pub async fn accrue(bonuses: &dyn BonusRepository, user_id: Uuid, amount: i64) -> AppResult<i64> {
  if amount < 0 {
    return Err(AppError::Validation("Bonus amount must not be negative.".to_string()));
  }
  let new_balance = bonuses.accrue(user_id, amount).await?;
  info!(new_balance, "Bonus accrued.");
  Ok(new_balance)
}

#[instrument(name = "bonus_ledger::debit", skip(bonuses), err(Display))]
pub async fn debit(bonuses: &dyn BonusRepository, user_id: Uuid, amount: i64) -> AppResult<i64> {
  if amount <= 0 {
    return Err(AppError::Validation("Bonus amount must be positive.".to_string()));
  }
  match bonuses.debit(user_id, amount).await? {
    Some(new_balance) => {
      info!(new_balance, "Bonus debited.");
      Ok(new_balance)
    }
    None => {
      let available = bonuses.balance(user_id).await?;
      warn!(available, "Bonus debit refused: insufficient balance.");
      Err(AppError::InsufficientBonus {
        requested: amount,
        available,
      })
    }
  }
}
