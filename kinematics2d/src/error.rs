use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown joint: {name}")]
    UnknownJoint { name: String },

    #[error("invalid joint index: {index}")]
    InvalidJointIndex { index: usize },

    #[error("unknown chain: {name}")]
    UnknownChain { name: String },

    #[error("invalid chain index: {index}")]
    InvalidChainIndex { index: usize },

    #[error("invalid chain '{chain}': {message}")]
    InvalidChain { chain: String, message: String },

    #[error("joint hierarchy contains a cycle through '{joint}'")]
    CyclicHierarchy { joint: String },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("cannot remove root joint {index}")]
    RootRemoval { index: usize },

    #[error("transform is not invertible (determinant {determinant})")]
    SingularTransform { determinant: f32 },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[cfg(feature = "json")]
    #[error("failed to parse skeleton JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("unknown parent joint '{parent}' for joint '{joint}'")]
    JsonUnknownJointParent { joint: String, parent: String },

    #[cfg(feature = "json")]
    #[error("unknown joint '{joint}' referenced by chain '{chain}'")]
    JsonUnknownChainJoint { chain: String, joint: String },

    #[cfg(feature = "json")]
    #[error("unknown solver '{value}' for chain '{chain}'")]
    JsonUnknownSolver { chain: String, value: String },
}
