//! Mermaid call flow diagram generator for hosted telephony routing
//!
//! This crate turns an auto attendant or call queue configuration into a
//! `flowchart TB` diagram describing every path an inbound call can take:
//! greetings, holiday and business-hours branching, queue distribution,
//! overflow, timeout, and transfers to users, external numbers, voicemail,
//! or other nested voice apps.
//!
//! Directory data is consumed through the [`DirectoryProvider`] trait; the
//! bundled [`SnapshotProvider`] serves a JSON tenant snapshot offline. A
//! render is single-threaded, keeps all counter state in a render-scoped
//! context, and produces byte-identical output for identical input.

mod diagram;
mod error;
mod flow;
mod ids;
pub mod model;
pub mod provider;
mod render;

pub use diagram::{DiagramEdge, DiagramNode, EdgeStyle, Fragment, NodeShape, Subgraph};
pub use error::GeneratorError;
pub use ids::RenderContext;
pub use provider::{DirectoryProvider, SnapshotProvider, TenantSnapshot};
pub use render::RenderedDocument;

use flow::FlowBuilder;

/// Output document wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocType {
    /// Fenced ```` ```mermaid ```` code block inside a Markdown document
    #[default]
    Markdown,
    /// Raw flowchart body only
    Mermaid,
}

/// Options controlling one render
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Document wrapper and file extension
    pub doc_type: DocType,
    /// Expand call queues reached through overflow/timeout/transfer targets
    pub show_nested_queues: bool,
    /// Annotate nested targets with the additional top-level phone numbers
    /// that also reach them
    pub show_nested_phone_numbers: bool,
    /// How many levels of nested voice apps to expand
    pub nested_depth: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            doc_type: DocType::Markdown,
            show_nested_queues: false,
            show_nested_phone_numbers: false,
            nested_depth: 1,
        }
    }
}

/// How the voice app to render is selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceAppSelector {
    /// By a phone number assigned to one of its resource accounts
    PhoneNumber(String),
    /// By directory id
    Id(String),
}

/// Main entry point for diagram generation
pub struct CallFlowGenerator {
    options: RenderOptions,
}

impl CallFlowGenerator {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render the call flow diagram for the selected voice app
    ///
    /// Fails with [`GeneratorError::NotFound`] when the selector matches
    /// nothing; unresolved references inside the configuration degrade to
    /// labeled placeholder nodes instead of aborting.
    pub fn generate(
        &self,
        provider: &dyn DirectoryProvider,
        selector: &VoiceAppSelector,
    ) -> Result<RenderedDocument, GeneratorError> {
        let config = match selector {
            VoiceAppSelector::PhoneNumber(number) => provider
                .find_voice_app_by_phone_number(number)
                .ok_or_else(|| GeneratorError::NotFound(number.clone()))?,
            VoiceAppSelector::Id(id) => provider
                .resolve_application_endpoint(id)
                .ok_or_else(|| GeneratorError::NotFound(id.clone()))?,
        };

        let mut builder = FlowBuilder::new(provider, &self.options);
        let fragment = builder.build(&config)?;
        render::render(&fragment, self.options.doc_type, &config.app().name)
    }
}
