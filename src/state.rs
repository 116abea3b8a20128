use crate::controller::DateRangeController;
use crate::models::Region;
use crate::source::{CachedSource, SourceKind};
use crate::storage::HitStore;
use std::sync::Arc;

pub type DashboardController = DateRangeController<CachedSource<SourceKind>>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<HitStore>,
    pub controller: Arc<DashboardController>,
    pub regions: Arc<Vec<Region>>,
}

impl AppState {
    pub fn new(store: Arc<HitStore>, controller: DashboardController, regions: Vec<Region>) -> Self {
        Self {
            store,
            controller: Arc::new(controller),
            regions: Arc::new(regions),
        }
    }
}
