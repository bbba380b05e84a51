use std::sync::Arc;

use rackview_state::InfrastructureController;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<InfrastructureController>,
}
