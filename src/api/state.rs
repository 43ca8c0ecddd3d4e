//! Application state for the Facility Wage Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::service::WageService;

/// Shared application state.
///
/// Wraps the wage service, which owns the configuration, the session source
/// and the carryover store.
#[derive(Clone)]
pub struct AppState {
    service: Arc<WageService>,
}

impl AppState {
    /// Creates a new application state around a wage service.
    pub fn new(service: WageService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Returns the wage service.
    pub fn service(&self) -> &WageService {
        &self.service
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &ConfigLoader {
        self.service.config()
    }
}
