pub mod asset_codes;
pub mod procurement;
pub mod procurement_flow;
pub mod stock_ledger;

pub use asset_codes::AssetCodeService;
pub use procurement::ProcurementService;
pub use procurement_flow::{ApprovalAction, ProcurementStatus, Role};
pub use stock_ledger::StockLedgerService;
