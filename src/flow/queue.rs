//! Call queue sub-graph construction
//!
//! One invocation builds the full queue shape: overflow decision, call
//! distribution subgraph (settings rows and agent roster), timeout node,
//! connected-outcome decision, and the overflow/timeout outcomes. Nested
//! queue targets re-enter this builder through target resolution in
//! [`super::FlowBuilder::connect_target`].

use log::{debug, warn};

use crate::diagram::{DiagramEdge, DiagramNode, EdgeStyle, Fragment, NodeShape, Subgraph};
use crate::error::GeneratorError;
use crate::ids::scope;
use crate::model::{CallQueue, CallQueueSettings, CallTarget, QueueAction};

use super::{ExpansionOrigin, FlowBuilder};

/// How a queue sub-graph hangs off its predecessor
#[derive(Debug, Clone)]
pub(crate) struct QueueEntry {
    pub from: String,
    pub label: Option<String>,
    pub style: EdgeStyle,
}

impl QueueEntry {
    pub fn solid(from: String) -> Self {
        Self {
            from,
            label: None,
            style: EdgeStyle::Solid,
        }
    }
}

/// Whether the overflow and timeout outcomes resolve to the same underlying
/// entity
///
/// Any pair of target-carrying actions (forward or voicemail, in any mix)
/// qualifies; disconnect and unrecognized actions never share. Computed
/// before any outcome node is allocated so both edges can share one target
/// node.
fn has_shared_outcome(settings: &CallQueueSettings) -> bool {
    let carries_target = |action: QueueAction| {
        matches!(action, QueueAction::Forward | QueueAction::SharedVoicemail)
    };
    if !carries_target(settings.overflow_action) || !carries_target(settings.timeout_action) {
        return false;
    }
    match (&settings.overflow_target, &settings.timeout_target) {
        (Some(overflow), Some(timeout)) => overflow.same_entity(timeout),
        _ => false,
    }
}

impl FlowBuilder<'_> {
    /// Build the sub-graph for one call queue, entered through `entry`
    pub(super) fn build_call_queue(
        &mut self,
        queue: &CallQueue,
        entry: QueueEntry,
        visited: &mut Vec<String>,
        depth: u32,
        origin: ExpansionOrigin,
    ) -> Result<Fragment, GeneratorError> {
        let n = self.ctx.next(scope::CALL_QUEUE);
        let settings = &queue.settings;
        debug!("building queue {} (origin {origin:?})", queue.app.name);

        let mut fragment = Fragment::new();

        // Overflow decision.
        let overflow = format!("cqOverflow{n}");
        fragment.push_node(DiagramNode::new(
            &overflow,
            format!("More than {} Active Calls?", settings.overflow_threshold),
            NodeShape::Rhombus,
        ));
        let mut entry_edge = match entry.label {
            Some(text) => DiagramEdge::labeled(&entry.from, &overflow, text),
            None => DiagramEdge::solid(&entry.from, &overflow),
        };
        entry_edge = entry_edge.with_style(entry.style);
        fragment.push_edge(entry_edge);

        let shared = has_shared_outcome(settings);
        if !shared {
            self.queue_outcome(
                &mut fragment,
                &overflow,
                "Yes",
                settings.overflow_action,
                settings.overflow_target.as_ref(),
                "cqOverflowTarget",
                ExpansionOrigin::Overflow,
                visited,
                depth,
            )?;
        }

        // Call distribution: settings rows plus agent roster.
        let distribution_id = format!("cqDistribution{n}");
        let timeout_node = format!("cqTimeout{n}");
        fragment.push_edge(DiagramEdge::labeled(&overflow, &distribution_id, "No"));

        let mut distribution = Subgraph::new(&distribution_id, "Call Distribution");
        distribution.children.push(self.settings_subgraph(n, settings));
        distribution
            .children
            .push(self.agents_subgraph(n, settings, &timeout_node));
        fragment.push_subgraph(distribution);

        fragment.push_node(DiagramNode::new(&timeout_node, "Timeout", NodeShape::Rounded));

        // Connected-outcome decision.
        let connected_check = format!("cqConnectedCheck{n}");
        fragment.push_node(DiagramNode::new(
            &connected_check,
            "Call Connected?",
            NodeShape::Rhombus,
        ));
        fragment.push_edge(DiagramEdge::solid(&timeout_node, &connected_check));

        let connected = format!("cqConnected{n}");
        fragment.push_node(DiagramNode::new(
            &connected,
            "Call Connected",
            NodeShape::DoubleCircle,
        ));
        fragment.push_edge(DiagramEdge::labeled(&connected_check, &connected, "Yes"));

        let timeout_target = self.queue_outcome(
            &mut fragment,
            &connected_check,
            "No",
            settings.timeout_action,
            settings.timeout_target.as_ref(),
            "cqTimeoutTarget",
            ExpansionOrigin::Timeout,
            visited,
            depth,
        )?;

        // Shared outcome: the overflow "Yes" edge joins the timeout target
        // node instead of a node of its own.
        if shared {
            fragment.push_edge(DiagramEdge::labeled(&overflow, &timeout_target, "Yes"));
        }

        Ok(fragment)
    }

    /// Cylinder rows for the queue settings, chained in fixed display order
    fn settings_subgraph(&self, n: u64, settings: &CallQueueSettings) -> Subgraph {
        let rows = [
            ("Routing", format!("Routing Method: {}", settings.routing_method)),
            (
                "Alert",
                format!("Agent Alert Time: {} Seconds", settings.agent_alert_time),
            ),
            ("Music", format!("Music on Hold: {}", settings.music_on_hold)),
            (
                "Conference",
                format!(
                    "Conference Mode: {}",
                    on_off(settings.conference_mode_enabled)
                ),
            ),
            (
                "OptOut",
                format!(
                    "Agent Opt Out: {}",
                    if settings.agent_opt_out_allowed {
                        "Allowed"
                    } else {
                        "Not Allowed"
                    }
                ),
            ),
            (
                "Presence",
                format!(
                    "Presence Based Routing: {}",
                    on_off(settings.presence_based_routing)
                ),
            ),
            (
                "Timeout",
                format!("Timeout: {} Seconds", settings.timeout_threshold),
            ),
        ];

        let mut subgraph = Subgraph::new(format!("subgraphSettings{n}"), "Settings");
        let mut previous: Option<String> = None;
        for (suffix, label) in rows {
            let id = format!("cqSettings{suffix}{n}");
            subgraph
                .nodes
                .push(DiagramNode::new(&id, label, NodeShape::Cylinder));
            if let Some(prev) = previous {
                subgraph.edges.push(DiagramEdge::solid(prev, &id));
            }
            previous = Some(id);
        }
        subgraph
    }

    /// Agent roster: the list-type node fans out to one node per agent, all
    /// converging into the timeout node
    fn agents_subgraph(
        &self,
        n: u64,
        settings: &CallQueueSettings,
        timeout_node: &str,
    ) -> Subgraph {
        let mut subgraph = Subgraph::new(format!("subgraphAgents{n}"), "Agents");

        let list_node = format!("cqAgentList{n}");
        subgraph.nodes.push(DiagramNode::new(
            &list_node,
            format!("Agent List Type: {}", settings.agent_list_kind),
            NodeShape::Rounded,
        ));

        for (index, agent) in settings.agents.iter().enumerate() {
            let id = format!("cqAgent{n}_{}", index + 1);
            subgraph.nodes.push(DiagramNode::new(
                &id,
                format!("Agent<br>{}", agent.display_name),
                NodeShape::Rounded,
            ));
            subgraph.edges.push(DiagramEdge::solid(&list_node, &id));
            subgraph.edges.push(DiagramEdge::solid(&id, timeout_node));
        }

        if settings.agents.is_empty() {
            subgraph
                .edges
                .push(DiagramEdge::solid(&list_node, timeout_node));
        }

        subgraph
    }

    /// Resolve one overflow or timeout outcome; returns the outcome node id
    #[allow(clippy::too_many_arguments)]
    fn queue_outcome(
        &mut self,
        fragment: &mut Fragment,
        from: &str,
        edge_label: &str,
        action: QueueAction,
        target: Option<&CallTarget>,
        id_scope: &str,
        origin: ExpansionOrigin,
        visited: &mut Vec<String>,
        depth: u32,
    ) -> Result<String, GeneratorError> {
        match action {
            QueueAction::Disconnect => {
                let id = self.ctx.node_id(id_scope);
                fragment.push_node(DiagramNode::new(
                    &id,
                    "Disconnect Call",
                    NodeShape::DoubleCircle,
                ));
                fragment.push_edge(DiagramEdge::labeled(from, &id, edge_label));
                Ok(id)
            }
            QueueAction::Forward | QueueAction::SharedVoicemail => match target {
                Some(target) => self.connect_target(
                    fragment,
                    from,
                    Some(edge_label),
                    target,
                    id_scope,
                    origin,
                    visited,
                    depth,
                ),
                None => {
                    warn!("queue {action:?} outcome has no target configured");
                    let id = self.ctx.node_id(id_scope);
                    fragment.push_node(DiagramNode::new(
                        &id,
                        "Unknown Target<br>(not configured)",
                        NodeShape::Rounded,
                    ));
                    fragment.push_edge(DiagramEdge::labeled(from, &id, edge_label));
                    Ok(id)
                }
            },
            QueueAction::Unknown => {
                let id = self.ctx.node_id(id_scope);
                fragment.push_node(DiagramNode::new(&id, "Unknown Action", NodeShape::Rounded));
                fragment.push_edge(DiagramEdge::labeled(from, &id, edge_label));
                Ok(id)
            }
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "On"
    } else {
        "Off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Agent, AgentListKind, Greeting, MusicOnHold, RoutingMethod};

    fn sample_settings() -> CallQueueSettings {
        CallQueueSettings {
            overflow_threshold: 10,
            overflow_action: QueueAction::Forward,
            overflow_target: Some(CallTarget::User {
                id: "u-1".to_string(),
                display_name: "Ada".to_string(),
            }),
            timeout_threshold: 45,
            timeout_action: QueueAction::Forward,
            timeout_target: Some(CallTarget::User {
                id: "u-1".to_string(),
                display_name: "Ada".to_string(),
            }),
            routing_method: RoutingMethod::RoundRobin,
            agent_alert_time: 30,
            music_on_hold: MusicOnHold::Default,
            conference_mode_enabled: true,
            agent_opt_out_allowed: false,
            presence_based_routing: false,
            agent_list_kind: AgentListKind::Users,
            agents: vec![Agent {
                id: "u-1".to_string(),
                display_name: "Ada".to_string(),
            }],
        }
    }

    #[test]
    fn test_shared_outcome_detection() {
        let settings = sample_settings();
        assert!(has_shared_outcome(&settings));
    }

    #[test]
    fn test_distinct_targets_are_not_shared() {
        let mut settings = sample_settings();
        settings.timeout_target = Some(CallTarget::User {
            id: "u-2".to_string(),
            display_name: "Grace".to_string(),
        });
        assert!(!has_shared_outcome(&settings));
    }

    #[test]
    fn test_voicemail_outcomes_share_their_group() {
        let voicemail = CallTarget::SharedVoicemail {
            group_id: "g-1".to_string(),
            group_name: "Helpdesk".to_string(),
            greeting: Greeting::None,
        };
        let mut settings = sample_settings();
        settings.overflow_action = QueueAction::SharedVoicemail;
        settings.overflow_target = Some(voicemail.clone());
        settings.timeout_action = QueueAction::SharedVoicemail;
        settings.timeout_target = Some(voicemail);
        assert!(has_shared_outcome(&settings));
    }

    #[test]
    fn test_mixed_forward_and_voicemail_share_their_entity() {
        let voicemail = CallTarget::SharedVoicemail {
            group_id: "g-1".to_string(),
            group_name: "Helpdesk".to_string(),
            greeting: Greeting::None,
        };
        let mut settings = sample_settings();
        settings.overflow_action = QueueAction::Forward;
        settings.overflow_target = Some(voicemail.clone());
        settings.timeout_action = QueueAction::SharedVoicemail;
        settings.timeout_target = Some(voicemail);
        assert!(has_shared_outcome(&settings));
    }

    #[test]
    fn test_disconnect_outcomes_never_share() {
        let mut settings = sample_settings();
        settings.overflow_action = QueueAction::Disconnect;
        assert!(!has_shared_outcome(&settings));
    }
}
