//! Auto attendant branch resolution
//!
//! Resolves an attendant into its holiday/after-hours gate and the linear
//! greeting/action/target chains behind each branch. Emission order is
//! deterministic: gate decisions, default call flow, after-hours call flow,
//! then the holidays block.

use log::warn;

use crate::diagram::{DiagramEdge, DiagramNode, Fragment, NodeShape, Subgraph};
use crate::error::GeneratorError;
use crate::ids::scope;
use crate::model::{
    AutoAttendant, CallFlow, CallFlowAction, CallTarget, DateRange, NamedCallFlow, Schedule,
    ScheduleKind, WeeklySchedule,
};

use super::{ExpansionOrigin, FlowBuilder};

impl FlowBuilder<'_> {
    /// Build the attendant gate and call flow chains, entered from the
    /// voice-app identity node
    pub(super) fn build_auto_attendant(
        &mut self,
        fragment: &mut Fragment,
        attendant: &AutoAttendant,
        app_node: &str,
        visited: &mut Vec<String>,
    ) -> Result<(), GeneratorError> {
        let n = self.ctx.next(scope::ATTENDANT_DEFAULT);
        let holidays = attendant.enabled_holidays();
        let after_hours = attendant.after_hours();

        let holiday_check = (!holidays.is_empty()).then(|| format!("aaHolidayCheck{n}"));
        let hours_check = after_hours
            .is_some()
            .then(|| format!("aaBusinessHoursCheck{n}"));
        let holidays_subgraph = format!("subgraphHolidays{n}");

        if let Some(check) = &holiday_check {
            fragment.push_node(DiagramNode::new(check, "During Holiday?", NodeShape::Rhombus));
            fragment.push_edge(DiagramEdge::solid(app_node, check));
            fragment.push_edge(DiagramEdge::labeled(check, &holidays_subgraph, "Yes"));
        }

        if let (Some(check), Some((weekly, _))) = (&hours_check, after_hours) {
            fragment.push_node(DiagramNode::new(
                check,
                business_hours_label(weekly, &attendant.time_zone),
                NodeShape::Rhombus,
            ));
            match &holiday_check {
                Some(holiday) => fragment.push_edge(DiagramEdge::labeled(holiday, check, "No")),
                None => fragment.push_edge(DiagramEdge::solid(app_node, check)),
            }
        }

        // Default call flow.
        let default_first = self.build_call_flow_chain(
            fragment,
            &attendant.default_call_flow,
            &format!("aaDefault{n}"),
            "aaDefaultTarget",
            ExpansionOrigin::AttendantDefault,
            visited,
        )?;
        match (&hours_check, &holiday_check) {
            (Some(hours), _) => {
                fragment.push_edge(DiagramEdge::labeled(hours, &default_first, "Yes"))
            }
            (None, Some(holiday)) => {
                fragment.push_edge(DiagramEdge::labeled(holiday, &default_first, "No"))
            }
            (None, None) => fragment.push_edge(DiagramEdge::solid(app_node, &default_first)),
        }

        // After-hours call flow.
        if let (Some(hours), Some((_, flow))) = (&hours_check, after_hours) {
            let m = self.ctx.next(scope::ATTENDANT_AFTER_HOURS);
            let first = self.build_call_flow_chain(
                fragment,
                &flow.flow,
                &format!("aaAfterHours{m}"),
                "aaAfterHoursTarget",
                ExpansionOrigin::AttendantAfterHours,
                visited,
            )?;
            fragment.push_edge(DiagramEdge::labeled(hours, &first, "No"));
        }

        // Holidays block, one nested subgraph per enabled holiday.
        if !holidays.is_empty() {
            let mut block = Subgraph::new(&holidays_subgraph, "Holidays");
            for (schedule, flow) in holidays {
                let child = self.build_holiday(schedule, flow, visited)?;
                block.children.push(child);
            }
            fragment.push_subgraph(block);
        }

        Ok(())
    }

    /// One holiday subgraph: schedule node followed by its call flow chain
    fn build_holiday(
        &mut self,
        schedule: &Schedule,
        flow: &NamedCallFlow,
        visited: &mut Vec<String>,
    ) -> Result<Subgraph, GeneratorError> {
        let h = self.ctx.next(scope::HOLIDAY);
        let mut contents = Fragment::new();

        let schedule_id = format!("holidaySchedule{h}");
        let date_ranges = match &schedule.kind {
            ScheduleKind::Holiday { date_ranges } => date_ranges.as_slice(),
            // enabled_holidays only yields holiday schedules
            ScheduleKind::BusinessHours { .. } => &[],
        };
        contents.push_node(DiagramNode::new(
            &schedule_id,
            holiday_label(&schedule.name, date_ranges),
            NodeShape::Rounded,
        ));

        let first = self.build_call_flow_chain(
            &mut contents,
            &flow.flow,
            &format!("holiday{h}"),
            "holidayTarget",
            ExpansionOrigin::Holiday,
            visited,
        )?;
        contents.push_edge(DiagramEdge::solid(&schedule_id, &first));

        let mut subgraph = Subgraph::new(format!("subgraphHoliday{h}"), &schedule.name);
        subgraph.nodes = contents.nodes;
        subgraph.edges = contents.edges;
        subgraph.children = contents.subgraphs;
        Ok(subgraph)
    }

    /// Linear chain for one call flow: greeting, action, then the target
    /// when the action transfers; returns the chain's first node id
    pub(super) fn build_call_flow_chain(
        &mut self,
        fragment: &mut Fragment,
        flow: &CallFlow,
        id_prefix: &str,
        target_scope: &str,
        origin: ExpansionOrigin,
        visited: &mut Vec<String>,
    ) -> Result<String, GeneratorError> {
        let greeting = self.greeting_node(fragment, id_prefix, flow.greeting);
        let action = format!("{id_prefix}Action");

        match flow.action {
            CallFlowAction::Disconnect => {
                fragment.push_node(DiagramNode::new(
                    &action,
                    "Disconnect Call",
                    NodeShape::DoubleCircle,
                ));
                fragment.push_edge(DiagramEdge::solid(&greeting, &action));
            }
            CallFlowAction::TransferToTarget => {
                fragment.push_node(DiagramNode::new(
                    &action,
                    "Transfer Call",
                    NodeShape::Rounded,
                ));
                fragment.push_edge(DiagramEdge::solid(&greeting, &action));

                let missing = CallTarget::Unknown {
                    reference: "(not configured)".to_string(),
                };
                let target = flow.target.as_ref().unwrap_or_else(|| {
                    warn!("transfer action without a target in chain {id_prefix}");
                    &missing
                });
                let depth = self.options.nested_depth;
                self.connect_target(
                    fragment,
                    &action,
                    None,
                    target,
                    target_scope,
                    origin,
                    visited,
                    depth,
                )?;
            }
            CallFlowAction::Unknown => {
                fragment.push_node(DiagramNode::new(
                    &action,
                    "Unknown Action",
                    NodeShape::Rounded,
                ));
                fragment.push_edge(DiagramEdge::solid(&greeting, &action));
            }
        }

        Ok(greeting)
    }
}

/// Rhombus label: time zone plus all seven weekdays, Monday first
fn business_hours_label(weekly: &WeeklySchedule, time_zone: &str) -> String {
    let mut lines = vec![
        "During Business Hours?".to_string(),
        format!("Time Zone: {time_zone}"),
    ];
    for (day, ranges) in weekly.days() {
        lines.push(format!("{day}: {}", WeeklySchedule::day_label(ranges)));
    }
    lines.join("<br>")
}

/// Holiday schedule node label: name plus one line per date range
fn holiday_label(name: &str, date_ranges: &[DateRange]) -> String {
    let mut lines = vec![format!("Holiday<br>{name}")];
    for range in date_ranges {
        lines.push(format!("{} - {}", range.start, range.end));
    }
    lines.join("<br>")
}
