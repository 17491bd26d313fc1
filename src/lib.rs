pub mod ask;
pub(crate) mod cli;
pub mod comment;
pub mod completion;
pub mod config;
pub mod credentials;
pub(crate) mod error_classification;
pub mod extensions;
pub mod resolver;

pub use ask::{ask, AskError, AskRequest, Insertion};
pub use comment::{wrap_in_comment, CommentDescriptor};
pub use completion::{CompletionClient, CompletionError};
pub use config::Settings;
pub use extensions::{DirectoryExtensionHost, ExtensionHost, InstalledExtension};
pub use resolver::{resolve_comment_syntax, ResolveError};

/// Entry point for the `dilly` binary.
pub fn run() -> std::process::ExitCode {
    cli::run()
}
