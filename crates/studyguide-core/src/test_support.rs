//! Record builders and fakes shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiError, CatalogSource};
use crate::models::{Exam, ExamLevel, Guide, GuideAudience, Scholarship};
use crate::storage::{MemoryBackend, StorageBackend, StorageError};

pub fn exam(id: &str, start: &str, end: &str) -> Exam {
    Exam {
        id: id.to_string(),
        name: format!("Exam {}", id),
        full_name: String::new(),
        description: String::new(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        registration_start_date: None,
        registration_end_date: None,
        fees: String::new(),
        eligibility: vec![],
        subjects: vec![],
        venues: vec![],
        document_url: None,
        result_date: None,
        organizing_body: String::new(),
        image_url: None,
        level: ExamLevel::Secondary,
        created_at: None,
        updated_at: None,
    }
}

pub fn scholarship(id: &str, kind: &str, deadline: &str) -> Scholarship {
    Scholarship {
        id: id.to_string(),
        title: format!("Scholarship {}", id),
        description: String::new(),
        provider: String::new(),
        amount: String::new(),
        deadline: deadline.to_string(),
        eligibility: vec![],
        requirements: vec![],
        application_url: String::new(),
        scholarship_type: kind.to_string(),
        country: String::new(),
        image_url: None,
        last_updated: String::new(),
        created_at: None,
        updated_at: None,
    }
}

pub fn guide(id: &str, category: &str, tags: &[&str]) -> Guide {
    Guide {
        id: id.to_string(),
        title: format!("Guide {}", id),
        description: String::new(),
        category: category.to_string(),
        audience: GuideAudience::All,
        steps: vec![],
        tags: tags.iter().map(|t| t.to_string()).collect(),
        last_updated: String::new(),
        image_url: None,
        created_at: None,
        updated_at: None,
    }
}

/// Catalog source serving fixed collections, optionally failing.
#[derive(Default)]
pub struct FakeSource {
    pub exams: Vec<Exam>,
    pub scholarships: Vec<Scholarship>,
    pub guides: Vec<Guide>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(exams: Vec<Exam>, scholarships: Vec<Scholarship>, guides: Vec<Guide>) -> Self {
        Self {
            exams,
            scholarships,
            guides,
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Total fetches across all collections
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn serve<T: Clone>(&self, items: &[T]) -> Result<Vec<T>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::ServerError("unavailable".to_string()));
        }
        Ok(items.to_vec())
    }
}

#[async_trait]
impl CatalogSource for FakeSource {
    async fn fetch_exams(&self) -> Result<Vec<Exam>, ApiError> {
        self.serve(&self.exams)
    }

    async fn fetch_scholarships(&self) -> Result<Vec<Scholarship>, ApiError> {
        self.serve(&self.scholarships)
    }

    async fn fetch_guides(&self) -> Result<Vec<Guide>, ApiError> {
        self.serve(&self.guides)
    }
}

/// In-memory backend whose writes can be made to fail or to stall.
#[derive(Default)]
pub struct ControlledBackend {
    inner: MemoryBackend,
    fail_writes: AtomicBool,
    write_delay_ms: AtomicU64,
}

impl ControlledBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn delay_writes(&self, delay: Duration) {
        self.write_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageBackend for ControlledBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("write rejected".to_string()));
        }
        self.inner.write(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear().await
    }
}
