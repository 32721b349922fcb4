#![deny(missing_docs)]
//! # chorus: umbrella crate
//!
//! Single import surface for chorus: the shared types plus the Ollama
//! backend, orchestration and filesystem store behind feature flags, and a
//! `prelude` for the common path.

pub use chorus_types;
#[cfg(feature = "orch")]
pub use chorus_orch;
#[cfg(feature = "ollama")]
pub use chorus_provider_ollama;
#[cfg(feature = "state-fs")]
pub use chorus_state_fs;

/// Happy-path imports for running a multi-model chat.
pub mod prelude {
    pub use chorus_types::{
        ChatBackend, ChatError, ChatEvent, ChatExport, ChatMessage, ChatObserver, InstallProgress,
        InstallStatus, ModelStatus, Profile, RecordStore, Role, Status, Template,
    };

    #[cfg(feature = "ollama")]
    pub use chorus_provider_ollama::Ollama;

    #[cfg(feature = "orch")]
    pub use chorus_orch::{ChannelObserver, Installer, Session, TracingObserver, TurnOutcome};

    #[cfg(feature = "state-fs")]
    pub use chorus_state_fs::FsStore;
}
