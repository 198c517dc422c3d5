use std::sync::Arc;
use crate::config::Config;
use crate::social::SocialService;

#[derive(Clone)]
pub struct AppState {
    pub social: SocialService,
    pub config: Arc<Config>,
}
