pub mod document;
pub mod invoice;
pub mod options;
pub mod progress;
pub mod session;
pub mod stats;

pub use document::{Cell, Document, HeaderStyle, Sheet, StructuredDocument, TabularDocument};
pub use invoice::{InvoiceRecord, LineItem};
pub use options::{ExportFormat, ExportOptions, ExportScope};
pub use progress::{ExportEvent, HarvestProgress, StatusKind, StatusMessage};
pub use session::{ExportContext, ExportSession, PageSnapshot};
pub use stats::{Statistics, UNSPECIFIED_LABEL};
