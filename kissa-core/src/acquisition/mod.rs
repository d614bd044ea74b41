mod panel;
mod scan;
mod workflow;

pub use panel::{
    AcquisitionPanel, PanelCommand, PanelEvent, PanelMessage, PanelState, PanelView,
    RequestTicket, SearchPhase, SearchSession,
};
pub use scan::{ScanGate, ScanPermit, ScanState};
pub use workflow::AcquisitionWorkflow;
