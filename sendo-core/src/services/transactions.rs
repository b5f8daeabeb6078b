//! Transaction board - the merchant's paginated transaction list
//!
//! Status and date filters are applied by the server; the text search only
//! narrows the page already loaded.

use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{MerchantTransaction, TransactionFilter};
use crate::services::api::SendoApi;

#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub items: Vec<MerchantTransaction>,
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub total_commission: Decimal,
    /// Completed loads since creation
    pub loads: u64,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct BoardState {
    items: Vec<MerchantTransaction>,
    page: u32,
    limit: u32,
    total_items: u64,
    total_pages: u32,
    total_commission: Decimal,
    filter: TransactionFilter,
    loads: u64,
    last_error: Option<String>,
}

pub struct TransactionBoard {
    api: Arc<SendoApi>,
    state: Mutex<BoardState>,
}

impl TransactionBoard {
    pub fn new(api: Arc<SendoApi>, page_size: u32) -> Self {
        Self {
            api,
            state: Mutex::new(BoardState {
                items: Vec::new(),
                page: 1,
                limit: page_size.max(1),
                total_items: 0,
                total_pages: 0,
                total_commission: Decimal::ZERO,
                filter: TransactionFilter::default(),
                loads: 0,
                last_error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch the current page with the current filters
    pub async fn load(&self) -> Result<BoardSnapshot> {
        let (page, limit, filter) = {
            let state = self.lock();
            (state.page, state.limit, state.filter.clone())
        };
        filter.validate().map_err(Error::Validation)?;

        let fetched = async {
            let merchant_id = self.api.merchant_id().await?;
            self.api
                .merchant_transactions(merchant_id, page, limit, &filter)
                .await
        }
        .await;

        let mut state = self.lock();
        match fetched {
            Ok(result) => {
                state.items = result.page.items;
                state.page = result.page.page.max(1);
                state.total_items = result.page.total_items;
                state.total_pages = result.page.total_pages;
                state.total_commission = result.total_commission;
                state.loads += 1;
                state.last_error = None;
                tracing::debug!(page = state.page, items = state.items.len(), "transactions loaded");
            }
            Err(e) => {
                state.last_error = Some(e.user_message());
                drop(state);
                return Err(e);
            }
        }
        Ok(snapshot_of(&state))
    }

    /// Same page, same filters
    pub async fn reload(&self) -> Result<BoardSnapshot> {
        self.load().await
    }

    pub async fn set_page(&self, page: u32) -> Result<BoardSnapshot> {
        self.lock().page = page.max(1);
        self.load().await
    }

    /// Replace the filters and go back to the first page
    pub async fn apply_filter(&self, filter: TransactionFilter) -> Result<BoardSnapshot> {
        filter.validate().map_err(Error::Validation)?;
        {
            let mut state = self.lock();
            state.filter = filter;
            state.page = 1;
        }
        self.load().await
    }

    /// Filters and page in one go, with a single request
    pub async fn load_page(&self, filter: TransactionFilter, page: u32) -> Result<BoardSnapshot> {
        filter.validate().map_err(Error::Validation)?;
        {
            let mut state = self.lock();
            state.filter = filter;
            state.page = page.max(1);
        }
        self.load().await
    }

    pub async fn clear_filters(&self) -> Result<BoardSnapshot> {
        self.apply_filter(TransactionFilter::default()).await
    }

    pub fn filter(&self) -> TransactionFilter {
        self.lock().filter.clone()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        snapshot_of(&self.lock())
    }

    /// Loaded items narrowed by the search text
    pub fn visible(&self) -> Vec<MerchantTransaction> {
        let state = self.lock();
        match state.filter.search.as_deref() {
            Some(needle) => state
                .items
                .iter()
                .filter(|tx| tx.matches_search(needle))
                .cloned()
                .collect(),
            None => state.items.clone(),
        }
    }

    /// A loaded item by id
    pub fn get(&self, id: i64) -> Option<MerchantTransaction> {
        self.lock().items.iter().find(|tx| tx.id == id).cloned()
    }
}

fn snapshot_of(state: &BoardState) -> BoardSnapshot {
    BoardSnapshot {
        items: state.items.clone(),
        page: state.page,
        limit: state.limit,
        total_items: state.total_items,
        total_pages: state.total_pages,
        total_commission: state.total_commission,
        loads: state.loads,
        last_error: state.last_error.clone(),
    }
}
