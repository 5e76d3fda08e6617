use super::{DetailResponse, PageResponse, PageSource};
use crate::error::SourceError;
use crate::models::{InvoiceRecord, LineItem};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 内存数据源: 用于回放固定数据, 并记录调用次数
#[derive(Debug)]
pub struct MemorySource {
    host: String,
    pages: Vec<Vec<InvoiceRecord>>,
    current_page: u32,
    details: HashMap<String, Vec<LineItem>>,
    failing_pages: HashSet<u32>,
    failing_details: HashSet<String>,
    page_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(host: impl Into<String>, pages: Vec<Vec<InvoiceRecord>>) -> Self {
        Self {
            host: host.into(),
            pages,
            current_page: 1,
            details: HashMap::new(),
            failing_pages: HashSet::new(),
            failing_details: HashSet::new(),
            page_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_current_page(mut self, page: u32) -> Self {
        self.current_page = page;
        self
    }

    pub fn with_details(mut self, uuid: impl Into<String>, items: Vec<LineItem>) -> Self {
        self.details.insert(uuid.into(), items);
        self
    }

    /// 该页返回 `success: false`
    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    /// 该发票的明细请求直接报错
    pub fn failing_details(mut self, uuid: impl Into<String>) -> Self {
        self.failing_details.insert(uuid.into());
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    /// 对数据源的全部调用次数
    pub fn calls(&self) -> usize {
        self.page_calls() + self.detail_calls()
    }

    fn page_response(&self, page: u32) -> Result<PageResponse, SourceError> {
        if self.failing_pages.contains(&page) {
            return Ok(PageResponse {
                success: false,
                error: Some(format!("page {} failed to load", page)),
                ..Default::default()
            });
        }

        let index = page.checked_sub(1).map(|i| i as usize);
        let rows = index
            .and_then(|i| self.pages.get(i))
            .ok_or_else(|| SourceError::NotFound(format!("page {}", page)))?;

        let mut response = PageResponse::ok(rows.clone(), page, self.pages.len() as u32);
        response.total_count = Some(self.pages.iter().map(|p| p.len() as u64).sum());
        Ok(response)
    }
}

#[async_trait]
impl PageSource for MemorySource {
    fn host(&self) -> &str {
        &self.host
    }

    async fn fetch_current_page(&self) -> Result<PageResponse, SourceError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.page_response(self.current_page)
    }

    async fn fetch_page(&self, page: u32) -> Result<PageResponse, SourceError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.page_response(page)
    }

    async fn fetch_details(&self, uuid: &str) -> Result<DetailResponse, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_details.contains(uuid) {
            return Err(SourceError::Unsuccessful(format!("details for {} failed", uuid)));
        }

        Ok(match self.details.get(uuid) {
            Some(items) => DetailResponse::ok(items.clone()),
            None => DetailResponse {
                success: false,
                line_items: Vec::new(),
                error: Some(format!("no details for {}", uuid)),
            },
        })
    }
}
