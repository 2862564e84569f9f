pub mod bypass;
pub mod machine;
pub mod stations;
pub mod transitions;

pub use bypass::{BypassError, BypassFlowState, BypassWorkflow};
pub use machine::{CreatePickupOrder, OrderStateMachine, WorkflowError, WorkflowRules};
pub use stations::{
    compare_items, ItemDiscrepancy, StationError, StationReceipt, VerificationOutcome,
    WorkerStationProcessor,
};
pub use transitions::{apply, BypassOutcome, OrderEvent, TransitionError};
