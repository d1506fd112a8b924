//! Data models representing database entities.
//!
//! This module contains the structures that map to database tables plus
//! the request/response types exchanged with API clients.

/// Admin API keys and activity log entries
pub mod admin;
/// PPOB purchases and product catalog
pub mod ppob;
/// Savings goals (tabungan)
pub mod tabungan;
/// Ledger movement records (transaksi)
pub mod transaksi;
/// Wallet owner accounts
pub mod user;

use serde::Serialize;

/// Pagination metadata attached to every list response.
#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// A page of results.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Normalize raw page/limit query values into (page, limit, offset).
pub fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    (page, limit, (page - 1) * limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_defaults_and_clamps() {
        assert_eq!(page_window(None, None), (1, 10, 0));
        assert_eq!(page_window(Some(3), Some(20)), (3, 20, 40));
        assert_eq!(page_window(Some(0), Some(1000)), (1, 100, 0));
    }

    #[test]
    fn page_meta_rounds_total_pages_up() {
        assert_eq!(PageMeta::new(21, 1, 10).total_pages, 3);
        assert_eq!(PageMeta::new(20, 1, 10).total_pages, 2);
        assert_eq!(PageMeta::new(0, 1, 10).total_pages, 0);
    }
}
