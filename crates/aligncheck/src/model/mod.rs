pub mod golden;
pub mod ids;
pub mod invocation;
pub mod run;
pub mod scenario;
pub mod suite;

pub use golden::*;
pub use ids::RunId;
pub use invocation::*;
pub use run::*;
pub use scenario::*;
pub use suite::*;
