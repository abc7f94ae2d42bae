//! Client-side controllers that drive the planner API.

pub mod api;
pub mod cache;
pub mod dialog;
pub mod forms;
pub mod selector;
pub mod submit;
pub mod views;

pub use api::{ApiClient, ClientError, ClientResult, ImageAttachment, ResourceClient};
pub use cache::QueryCache;
pub use dialog::{DialogMode, DialogState, ResourceDialog, ResourceForm, SubmitOutcome};
pub use selector::{ResourceSelector, RowRenderers, RowView};
pub use submit::{on_save, DialogSubmitController, OnSave};
