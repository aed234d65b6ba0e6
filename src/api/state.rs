use std::sync::Arc;

use crate::config::Config;
use crate::infrastructure::SessionManager;
use crate::orchestrator::Automation;

/// 共享的应用状态
pub struct AppState {
    pub config: Config,
    pub automation: Automation,
}

impl AppState {
    pub fn new(config: Config, sessions: Arc<SessionManager>) -> Self {
        Self {
            automation: Automation::new(config.clone(), sessions),
            config,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        self.automation.sessions()
    }
}
