use thiserror::Error;

/// Errors reported by `ContainerRegistry`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum RegistryError {
    /// The handle was minted by a different registry. Its slot lives in
    /// that registry's arena and cannot be resolved here.
    #[error("container handle belongs to a different registry")]
    ForeignHandle,
}
