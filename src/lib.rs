//! Sarpras API Library
//!
//! Service core for school facilities management: asset registration with
//! structured code allocation, a consumable stock ledger, and a two-tier
//! procurement approval workflow. The web layer, authentication, and
//! report rendering live in separate components that consume this crate.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod notifications;
pub mod services;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::notifications::NotificationSender;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub asset_codes: services::AssetCodeService,
    pub stock_ledger: services::StockLedgerService,
    pub procurement: services::ProcurementService,
}

impl AppState {
    /// Wires the full service set over one shared connection pool.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        let asset_codes = services::AssetCodeService::new(db.clone(), event_sender.clone());
        let stock_ledger = services::StockLedgerService::new(db.clone(), event_sender.clone());
        let procurement =
            services::ProcurementService::new(db.clone(), event_sender.clone(), notifier);

        Self {
            db,
            config,
            event_sender,
            asset_codes,
            stock_ledger,
            procurement,
        }
    }
}
