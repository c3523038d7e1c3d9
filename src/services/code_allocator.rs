//! Pickup code allocation
//!
//! Draws random four-digit codes and checks the store for a live order
//! already holding the code on the same day. The check is advisory: the
//! insert transaction re-checks, and the partial unique index has the
//! final word.

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tracing::{debug, warn};

use crate::error::{OrderError, OrderResult};
use crate::services::order_repository;

/// Draws before giving up
pub const MAX_ATTEMPTS: usize = 10;

pub const CODE_MIN: u16 = 1000;
pub const CODE_MAX: u16 = 9999;

/// Where order creation takes pickup codes from
#[async_trait]
pub trait CodeSource: Send {
    async fn next_code(&mut self, db: &DatabaseConnection, day: NaiveDate) -> OrderResult<String>;
}

/// Random draws checked against the store
pub struct RandomCodes {
    rng: StdRng,
}

impl RandomCodes {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for RandomCodes {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeSource for RandomCodes {
    async fn next_code(&mut self, db: &DatabaseConnection, day: NaiveDate) -> OrderResult<String> {
        let rng = &mut self.rng;
        allocate_with(db, day, || rng.gen_range(CODE_MIN..=CODE_MAX)).await
    }
}

/// Allocate a code for `day`, taking candidates from `draw`
pub async fn allocate_with<C, F>(db: &C, day: NaiveDate, mut draw: F) -> OrderResult<String>
where
    C: ConnectionTrait,
    F: FnMut() -> u16 + Send,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let code = format!("{:04}", draw());

        let taken = order_repository::find_order_by_code_on(db, day, &code, true)
            .await?
            .is_some();

        if !taken {
            debug!(code = %code, attempt, %day, "Pickup code allocated");
            return Ok(code);
        }

        debug!(code = %code, attempt, "Pickup code already taken, redrawing");
    }

    warn!(%day, attempts = MAX_ATTEMPTS, "Pickup code allocation exhausted");
    Err(OrderError::CodeAllocationExhausted)
}
