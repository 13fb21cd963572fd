//! Diagram builders
//!
//! [`FlowBuilder`] walks a normalized voice app configuration and produces
//! [`Fragment`]s in traversal order: start nodes, the voice-app identity
//! node, the holiday/after-hours gate, call flow chains, queue sub-graphs,
//! nested expansions, and finally the trailing top-level-number annotations.
//!
//! All node identifiers come from the render-scoped [`RenderContext`]; the
//! builder owns one per render and threads it through every producer.

mod attendant;
mod queue;

pub(crate) use queue::QueueEntry;

use log::{debug, warn};

use crate::diagram::{DiagramEdge, DiagramNode, EdgeStyle, Fragment, NodeShape};
use crate::error::GeneratorError;
use crate::ids::{scope, RenderContext};
use crate::model::{CallTarget, Greeting, VoiceApp, VoiceAppConfig, VoiceAppKind};
use crate::provider::DirectoryProvider;
use crate::RenderOptions;

/// Why a nested queue expansion was entered
///
/// Carried through recursion so expansion logs and entry wiring stay
/// attributable to the branch that triggered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExpansionOrigin {
    /// The queue is the selected voice app itself
    Direct,
    /// Reached through a queue overflow outcome
    Overflow,
    /// Reached through a queue timeout outcome
    Timeout,
    /// Reached through an auto attendant default call flow
    AttendantDefault,
    /// Reached through an auto attendant after-hours call flow
    AttendantAfterHours,
    /// Reached through a holiday call flow
    Holiday,
}

/// Builds the diagram graph for one render
pub(crate) struct FlowBuilder<'a> {
    provider: &'a dyn DirectoryProvider,
    options: &'a RenderOptions,
    ctx: RenderContext,
    /// Target node ids awaiting trailing top-level-number annotations
    pending_numbers: Vec<(String, VoiceApp)>,
}

impl<'a> FlowBuilder<'a> {
    pub fn new(provider: &'a dyn DirectoryProvider, options: &'a RenderOptions) -> Self {
        Self {
            provider,
            options,
            ctx: RenderContext::new(),
            pending_numbers: Vec::new(),
        }
    }

    /// Build the complete fragment for the selected voice app
    pub fn build(&mut self, config: &VoiceAppConfig) -> Result<Fragment, GeneratorError> {
        let mut fragment = Fragment::new();
        let app_node = self.emit_start_nodes(&mut fragment, config.app());

        let mut visited = vec![config.app().id.clone()];
        match config {
            VoiceAppConfig::AutoAttendant(attendant) => {
                self.build_auto_attendant(&mut fragment, attendant, &app_node, &mut visited)?;
            }
            VoiceAppConfig::CallQueue(queue) => {
                let entry = QueueEntry::solid(app_node);
                let sub = self.build_call_queue(
                    queue,
                    entry,
                    &mut visited,
                    self.options.nested_depth,
                    ExpansionOrigin::Direct,
                )?;
                fragment.merge(sub);
            }
        }

        self.flush_pending_numbers(&mut fragment);
        Ok(fragment)
    }

    /// Emit one start node per numbered resource account plus the voice-app
    /// identity node; returns the identity node id
    ///
    /// The first entry point uses a solid arrow, additional numbers reaching
    /// the same app use dotted arrows.
    fn emit_start_nodes(&mut self, fragment: &mut Fragment, app: &VoiceApp) -> String {
        let app_node = self.ctx.node_id(scope::VOICE_APP);
        fragment.push_node(DiagramNode::new(
            &app_node,
            format!("{}<br>{}", app.kind, app.name),
            NodeShape::Stadium,
        ));

        for (index, number) in app.phone_numbers().enumerate() {
            let start = self.ctx.node_id(scope::RESOURCE_ACCOUNT);
            fragment.push_node(DiagramNode::new(
                &start,
                format!("Incoming Call<br>{number}"),
                NodeShape::Rounded,
            ));
            let style = if index == 0 {
                EdgeStyle::Solid
            } else {
                EdgeStyle::Dotted
            };
            fragment.push_edge(DiagramEdge::solid(&start, &app_node).with_style(style));
        }

        app_node
    }

    /// Greeting node of a call flow chain
    fn greeting_node(&mut self, fragment: &mut Fragment, id_prefix: &str, greeting: Greeting) -> String {
        let id = format!("{id_prefix}Greeting");
        fragment.push_node(DiagramNode::new(
            &id,
            format!("Greeting<br>{greeting}"),
            NodeShape::Subroutine,
        ));
        id
    }

    /// Emit a transfer target node, wire it from `from`, and expand nested
    /// queues when the options allow it; returns the target node id
    ///
    /// Shared-target deduplication is the caller's concern: it must compare
    /// targets with [`CallTarget::same_entity`] *before* asking for a node
    /// here, and reuse the returned id for the second edge.
    #[allow(clippy::too_many_arguments)]
    fn connect_target(
        &mut self,
        fragment: &mut Fragment,
        from: &str,
        edge_label: Option<&str>,
        target: &CallTarget,
        id_scope: &str,
        origin: ExpansionOrigin,
        visited: &mut Vec<String>,
        depth: u32,
    ) -> Result<String, GeneratorError> {
        let id = self.ctx.node_id(id_scope);

        let (label, shape) = match target {
            CallTarget::User { display_name, .. } => {
                (format!("User<br>{display_name}"), NodeShape::Rounded)
            }
            CallTarget::ExternalPstn { number } => {
                (format!("External Number<br>{number}"), NodeShape::Rounded)
            }
            CallTarget::SharedVoicemail {
                group_name,
                greeting,
                ..
            } => (
                format!("Shared Voicemail<br>{group_name}<br>Greeting: {greeting}"),
                NodeShape::Rounded,
            ),
            CallTarget::ApplicationEndpoint { app } => {
                return self.connect_application_endpoint(
                    fragment, from, edge_label, &id, app, origin, visited, depth,
                );
            }
            CallTarget::Unknown { reference } => {
                warn!("rendering unknown target for stale reference {reference}");
                (format!("Unknown Target<br>{reference}"), NodeShape::Rounded)
            }
        };

        fragment.push_node(DiagramNode::new(&id, label, shape));
        fragment.push_edge(match edge_label {
            Some(text) => DiagramEdge::labeled(from, &id, text),
            None => DiagramEdge::solid(from, &id),
        });
        Ok(id)
    }

    /// Target resolution for targets that are themselves voice apps
    #[allow(clippy::too_many_arguments)]
    fn connect_application_endpoint(
        &mut self,
        fragment: &mut Fragment,
        from: &str,
        edge_label: Option<&str>,
        id: &str,
        app: &VoiceApp,
        origin: ExpansionOrigin,
        visited: &mut Vec<String>,
        depth: u32,
    ) -> Result<String, GeneratorError> {
        let expandable = app.kind == VoiceAppKind::CallQueue && self.options.show_nested_queues;

        if expandable && visited.iter().any(|seen| seen == &app.id) {
            let err = GeneratorError::CycleDetected(app.id.clone());
            debug!("{err}; rendering a reference marker instead");
            fragment.push_node(DiagramNode::new(
                id,
                format!("{}<br>{}<br>(already shown)", app.kind, app.name),
                NodeShape::Rounded,
            ));
            fragment.push_edge(match edge_label {
                Some(text) => DiagramEdge::labeled(from, id, text),
                None => DiagramEdge::solid(from, id),
            });
            return Ok(id.to_string());
        }

        fragment.push_node(DiagramNode::new(
            id,
            format!("{}<br>{}", app.kind, app.name),
            NodeShape::Rectangle,
        ));
        fragment.push_edge(match edge_label {
            Some(text) => DiagramEdge::labeled(from, id, text),
            None => DiagramEdge::solid(from, id),
        });

        if expandable && depth > 0 {
            match self.provider.resolve_application_endpoint(&app.id) {
                Some(VoiceAppConfig::CallQueue(queue)) => {
                    debug!("expanding nested queue {} via {origin:?}", app.name);
                    visited.push(app.id.clone());
                    let sub = self.build_call_queue(
                        &queue,
                        QueueEntry::solid(id.to_string()),
                        visited,
                        depth - 1,
                        origin,
                    )?;
                    visited.pop();
                    fragment.merge(sub);
                }
                // Attendants referenced from a queue stay leaves.
                Some(VoiceAppConfig::AutoAttendant(_)) => {}
                None => {
                    warn!(
                        "nested queue {} vanished between identity and configuration lookup",
                        app.id
                    );
                }
            }
        }

        if self.options.show_nested_phone_numbers {
            self.pending_numbers.push((id.to_string(), app.clone()));
        }

        Ok(id.to_string())
    }

    /// Render the collected top-level-number annotations: one dotted start
    /// node per additional phone number reaching an already-placed target
    fn flush_pending_numbers(&mut self, fragment: &mut Fragment) {
        let pending = std::mem::take(&mut self.pending_numbers);
        for (target_id, app) in pending {
            for number in app.phone_numbers() {
                let start = self.ctx.node_id(scope::TOP_LEVEL_NUMBER);
                fragment.push_node(DiagramNode::new(
                    &start,
                    format!("Incoming Call<br>{number}"),
                    NodeShape::Rounded,
                ));
                fragment.push_edge(
                    DiagramEdge::solid(&start, &target_id).with_style(EdgeStyle::LongDotted),
                );
            }
        }
    }
}
