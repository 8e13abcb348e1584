//! Generation collaborator
//!
//! Thin wrapper over a chat-completion API that turns a prompt into a
//! single self-contained HTML document. Supports Anthropic- and
//! OpenAI-format endpoints; any provider failure degrades to the bundled
//! demo template rather than surfacing to the UI.

pub mod client;
pub mod credentials;
pub mod error;
pub mod generator;
pub mod providers;
pub mod templates;

pub use client::{GenClient, GenClientConfig};
pub use credentials::CredentialStore;
pub use error::ProviderError;
pub use generator::{AppGenerator, GeneratedApp, GenerationSource};
pub use providers::{ApiFormat, AuthHeader, ProviderId};
pub use templates::{demo_template, template_by_id, TemplateDef, TEMPLATES};
