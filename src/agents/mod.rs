pub mod change_publisher;
pub mod commit_message;
pub mod project_scanner;
pub mod report;
pub mod update_applier;
pub mod version_control;
pub mod version_reconciler;

pub use change_publisher::ChangePublisher;
pub use project_scanner::ProjectScannerAgent;
pub use report::{AssetUpdate, UpdateResult};
pub use update_applier::{AppliedUpdate, UpdateApplier};
pub use version_control::VersionControlAgent;
pub use version_reconciler::{Reconciliation, VersionReconciler};
