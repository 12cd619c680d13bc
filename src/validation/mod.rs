// Validation gate engine
//
// documents -> legal compliance -> technical validation -> decision

pub mod checklist;
pub mod forms;
pub mod gate;
pub mod laws;
pub mod review;

pub use checklist::{ChecklistError, StepUpdate, ValidationChecklist, ValidationStep};
pub use forms::{DynamicForm, FieldKind, FormField};
pub use gate::{GateNotSatisfied, GateReport, StepStatus, ValidationGate};
pub use laws::{Law, LawId};
pub use review::ReviewRecord;
