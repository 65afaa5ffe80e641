use crate::config::Config;

#[derive(Debug, Clone)]
pub struct SyncParams {
    pub app_config: Config,
}
