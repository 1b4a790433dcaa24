// logmask-core - Resource graph for the masked-log demo stack
//
// Pure construction logic: configuration in, typed resource graph out.
// No I/O, no async, no provisioning-engine types in the graph itself.
// The CloudFormation renderer lives in `template` and only reads the graph.

pub mod builder;
pub mod error;
pub mod graph;
pub mod masking;
pub mod resources;
pub mod template;

// Re-export commonly used types
pub use builder::{
    build, data_protection_policy, exports, StackConfig, PRIVILEGED_USER_NAME, STANDARD_USER_NAME,
};
pub use error::{BuildError, ErrorCode, Result};
pub use graph::{Graph, ResourceCounts};
pub use masking::{Finding, MaskingMatcher};
pub use resources::{CodeLocation, Credential, Effect};
pub use template::{render, Template};
