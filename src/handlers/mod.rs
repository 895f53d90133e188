use std::sync::Arc;

use crate::{
    config::Config,
    database::Database,
    services::{gallery::Gallery, upload::UploadPipeline},
};

pub mod auth;
pub mod health;
pub mod images;
pub mod upload;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub pipeline: Arc<UploadPipeline>,
    pub gallery: Arc<Gallery>,
}
