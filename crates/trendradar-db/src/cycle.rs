//! Cross-table write for one refresh cycle.
//!
//! Signals and products belong to the same cycle; replacing them in separate
//! transactions would let a reader pair a fresh signal set with stale
//! products. This module keeps both replacements behind one commit.

use sqlx::PgPool;

use crate::products::NewTrendProduct;
use crate::signals::NewTrendSignal;
use crate::{products, signals, DbError};

/// Row counts from one full-replace refresh cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleCounts {
    pub deleted_signals: u64,
    pub saved_signals: u64,
    pub deleted_products: u64,
    pub saved_products: u64,
}

/// Replace a family's signals and products in a single transaction.
///
/// Readers see either the previous cycle in both tables or the new cycle in
/// both tables, never a mix.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction rolls
/// back both tables.
pub async fn replace_family_cycle(
    pool: &PgPool,
    family: &str,
    new_signals: &[NewTrendSignal],
    new_products: &[NewTrendProduct],
) -> Result<CycleCounts, DbError> {
    let mut tx = pool.begin().await?;

    let (deleted_signals, saved_signals) =
        signals::replace_signals_in(&mut *tx, family, new_signals).await?;
    let (deleted_products, saved_products) =
        products::replace_products_in(&mut *tx, family, new_products).await?;

    tx.commit().await?;

    Ok(CycleCounts {
        deleted_signals,
        saved_signals,
        deleted_products,
        saved_products,
    })
}
