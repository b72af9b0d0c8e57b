// Application state for HTTP handlers
use crate::application::dashboard_store::DashboardStore;
use crate::application::data_entry::DataEntryService;
use crate::application::data_gateway::DataGateway;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DashboardStore>,
    pub data_entry: DataEntryService,
    pub gateway: Arc<dyn DataGateway>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn DataGateway>, store: Arc<DashboardStore>) -> Self {
        Self {
            data_entry: DataEntryService::new(gateway.clone()),
            store,
            gateway,
        }
    }
}
