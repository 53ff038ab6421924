//! The module-loader seam for the in-process Load path.
//!
//! Loaders are external collaborators: the pipeline hands them the
//! finished binary (and the symbol stream, when one exists) only after
//! the success gate has passed. A loader fault propagates as the
//! invocation's failure.

/// Loads a finished binary into the running process.
pub trait ModuleLoader {
    /// Handle to the loaded, runnable module.
    type Module;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load from in-memory streams.
    ///
    /// `symbols` is `None` when symbol generation was unsupported or
    /// produced no bytes; loaders must not receive an empty stream.
    fn load_module(&self, binary: &[u8], symbols: Option<&[u8]>)
    -> Result<Self::Module, Self::Error>;
}
