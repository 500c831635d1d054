//! In-memory collaborators for engine tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pos_client::{AppError, ClientError, ClientResult, EngineCommand, ErrorCode, PosSession};
use rust_decimal::Decimal;
use shared::models::{Branch, Product, ProductKind, ProductVariant, StockRecord};
use shared::sale::{CheckoutRequest, TransactionRecord};
use tokio::sync::{mpsc, oneshot};

/// One product ("Kaos <branch>") with variant `v-1` stocked at `branch_id`
pub fn catalog_for(branch_id: &str, quantity: i32) -> Vec<Product> {
    vec![Product {
        id: "p-1".to_string(),
        name: format!("Kaos {branch_id}"),
        product_kind: ProductKind::Variant,
        category_id: Some("c-1".to_string()),
        variants: vec![ProductVariant {
            id: "v-1".to_string(),
            sku: "KP-M".to_string(),
            variant_name: "Ukuran".to_string(),
            variant_value: "M".to_string(),
            stocks: vec![StockRecord::new(branch_id, quantity, Decimal::from(50000))],
        }],
    }]
}

pub fn branches() -> Vec<Branch> {
    let mut closed = Branch::new("b-9", "Tutup");
    closed.is_active = false;
    vec![Branch::new("b-1", "Pusat"), Branch::new("b-2", "Timur"), closed]
}

#[derive(Default)]
pub struct FakeCatalog {
    products: Mutex<HashMap<String, Vec<Product>>>,
    branches: Mutex<Vec<Branch>>,
    delays: Mutex<HashMap<String, Duration>>,
    fail: AtomicBool,
    pub product_fetches: AtomicUsize,
    pub branch_fetches: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.set_branches(branches());
        fake.set_products("b-1", catalog_for("b-1", 5));
        fake.set_products("b-2", catalog_for("b-2", 2));
        fake
    }

    pub fn set_products(&self, branch_id: &str, products: Vec<Product>) {
        self.products.lock().unwrap().insert(branch_id.to_string(), products);
    }

    pub fn set_branches(&self, branches: Vec<Branch>) {
        *self.branches.lock().unwrap() = branches;
    }

    pub fn set_delay(&self, branch_id: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(branch_id.to_string(), delay);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.product_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl pos_client::CatalogSource for FakeCatalog {
    async fn fetch_products(&self, branch_id: &str) -> ClientResult<Vec<Product>> {
        self.product_fetches.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().unwrap().get(branch_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("catalog unavailable".to_string()));
        }
        Ok(self.products.lock().unwrap().get(branch_id).cloned().unwrap_or_default())
    }

    async fn fetch_branches(&self) -> ClientResult<Vec<Branch>> {
        self.branch_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.branches.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<CheckoutRequest>>,
    reject: Mutex<Option<String>>,
}

impl FakeGateway {
    pub fn reject_with(&self, message: &str) {
        *self.reject.lock().unwrap() = Some(message.to_string());
    }

    pub fn submitted(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl pos_client::CheckoutGateway for FakeGateway {
    async fn submit(&self, request: &CheckoutRequest) -> ClientResult<TransactionRecord> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());

        if let Some(message) = self.reject.lock().unwrap().clone() {
            return Err(ClientError::Api(AppError::with_message(ErrorCode::CheckoutRejected, message)));
        }

        Ok(TransactionRecord {
            id: format!("t-{}", requests.len()),
            transaction_no: format!("TRX-{:04}", requests.len()),
            total: request.total,
            payment_method: request.payment_method,
            created_at: shared::util::now_millis(),
        })
    }
}

/// Run a closure on the session inside a running engine and return its result
pub async fn query<T: Send + 'static>(
    commands: &mpsc::Sender<EngineCommand>,
    f: impl FnOnce(&mut PosSession) -> T + Send + 'static,
) -> T {
    let (reply, rx) = oneshot::channel();
    commands
        .send(EngineCommand::apply(move |session| {
            let _ = reply.send(f(session));
        }))
        .await
        .unwrap();
    rx.await.unwrap()
}

/// Poll the running engine until `check` holds (or give up after ~2s)
pub async fn eventually(
    commands: &mpsc::Sender<EngineCommand>,
    check: impl Fn(&mut PosSession) -> bool + Send + Sync + Clone + 'static,
) -> bool {
    for _ in 0..100 {
        let check = check.clone();
        if query(commands, move |s| check(s)).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
