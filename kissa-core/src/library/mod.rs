mod store;

pub use store::{LibraryEvent, LibraryListener, LibraryStore, RefreshOutcome};
