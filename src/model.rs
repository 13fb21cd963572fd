//! Normalized telephony routing model
//!
//! This module defines the uniform entity model the diagram builders consume.
//! Directory providers normalize their raw, loosely-typed representations
//! (string-valued actions, target type tags) into these closed variants before
//! any diagram logic runs; every enum that mirrors a raw string field carries
//! an explicit `Unknown` arm instead of relying on fallthrough.

use std::fmt;

/// The two kinds of routing entity a phone number can land on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceAppKind {
    AutoAttendant,
    CallQueue,
}

impl fmt::Display for VoiceAppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceAppKind::AutoAttendant => write!(f, "Auto Attendant"),
            VoiceAppKind::CallQueue => write!(f, "Call Queue"),
        }
    }
}

/// An object binding a phone number to a voice app
///
/// Accounts without an assigned number never produce a start node.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceAccount {
    pub id: String,
    pub phone_number: Option<String>,
}

/// Immutable identity snapshot of an auto attendant or call queue
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceApp {
    pub kind: VoiceAppKind,
    pub id: String,
    pub name: String,
    pub resource_accounts: Vec<ResourceAccount>,
}

impl VoiceApp {
    /// Phone numbers assigned to this app, in resource-account order
    pub fn phone_numbers(&self) -> impl Iterator<Item = &str> {
        self.resource_accounts
            .iter()
            .filter_map(|account| account.phone_number.as_deref())
    }
}

/// Greeting preceding a call flow action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    None,
    AudioFile,
    TextToSpeech,
}

impl fmt::Display for Greeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Greeting::None => write!(f, "None"),
            Greeting::AudioFile => write!(f, "Audio File"),
            Greeting::TextToSpeech => write!(f, "Text to Speech"),
        }
    }
}

/// What an auto attendant call flow does after the greeting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallFlowAction {
    Disconnect,
    TransferToTarget,
    Unknown,
}

/// A concrete transfer destination
///
/// Application endpoints are resolved one level deep by the normalizer; the
/// nested expansion engine fetches deeper configuration on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    User {
        id: String,
        display_name: String,
    },
    ExternalPstn {
        number: String,
    },
    SharedVoicemail {
        group_id: String,
        group_name: String,
        greeting: Greeting,
    },
    ApplicationEndpoint {
        app: VoiceApp,
    },
    /// Stale or deleted reference that resolved to nothing known
    Unknown {
        reference: String,
    },
}

impl CallTarget {
    /// Whether two targets point at the same underlying entity
    ///
    /// Display labels are ignored; identity is the directory id (or the
    /// literal number for external transfers). Two `Unknown` targets are
    /// never the same entity.
    pub fn same_entity(&self, other: &CallTarget) -> bool {
        match (self, other) {
            (CallTarget::User { id: a, .. }, CallTarget::User { id: b, .. }) => a == b,
            (CallTarget::ExternalPstn { number: a }, CallTarget::ExternalPstn { number: b }) => {
                a == b
            }
            (
                CallTarget::SharedVoicemail { group_id: a, .. },
                CallTarget::SharedVoicemail { group_id: b, .. },
            ) => a == b,
            (
                CallTarget::ApplicationEndpoint { app: a },
                CallTarget::ApplicationEndpoint { app: b },
            ) => a.id == b.id,
            _ => false,
        }
    }
}

/// One greeting/action pair of an auto attendant
#[derive(Debug, Clone, PartialEq)]
pub struct CallFlow {
    pub greeting: Greeting,
    pub action: CallFlowAction,
    pub target: Option<CallTarget>,
}

/// A named call flow referenced by call handling associations
#[derive(Debug, Clone, PartialEq)]
pub struct NamedCallFlow {
    pub id: String,
    pub name: String,
    pub flow: CallFlow,
}

/// Minutes from midnight; `1440` marks the end of the day
pub const END_OF_DAY_MINUTES: u16 = 1440;

/// A half-open interval within one day, in minutes from midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_minutes: u16,
    pub end_minutes: u16,
}

impl TimeRange {
    pub fn new(start_minutes: u16, end_minutes: u16) -> Self {
        Self {
            start_minutes,
            end_minutes,
        }
    }

    /// The full-day interval used by the "no after hours" sentinel
    pub fn full_day() -> Self {
        Self::new(0, END_OF_DAY_MINUTES)
    }

    pub fn is_full_day(&self) -> bool {
        self.start_minutes == 0 && self.end_minutes == END_OF_DAY_MINUTES
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02} - {:02}:{:02}",
            self.start_minutes / 60,
            self.start_minutes % 60,
            self.end_minutes / 60,
            self.end_minutes % 60
        )
    }
}

/// Weekday names in display order (Monday first)
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Per-weekday opening intervals of a business-hours schedule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklySchedule {
    /// Opening intervals per weekday, Monday first
    pub intervals: [Vec<TimeRange>; 7],
    /// Whether the schedule routes the *complement* of the listed hours to
    /// the associated call flow (the after-hours convention)
    pub complement_enabled: bool,
}

impl WeeklySchedule {
    /// Weekday name / intervals pairs in Monday-first order
    pub fn days(&self) -> impl Iterator<Item = (&'static str, &[TimeRange])> {
        WEEKDAYS
            .iter()
            .zip(self.intervals.iter())
            .map(|(name, ranges)| (*name, ranges.as_slice()))
    }

    /// Structural sentinel test for "no after hours configured"
    ///
    /// Matches iff every weekday carries exactly one interval covering the
    /// whole day and the complement flag is set. The comparison is over the
    /// interval data itself, never over formatted strings.
    pub fn is_always_open_sentinel(&self) -> bool {
        self.complement_enabled
            && self
                .intervals
                .iter()
                .all(|ranges| ranges.len() == 1 && ranges[0].is_full_day())
    }

    /// Display line for one weekday: "Open 24 hours", the literal intervals,
    /// or "Closed"
    pub fn day_label(ranges: &[TimeRange]) -> String {
        if ranges.len() == 1 && ranges[0].is_full_day() {
            "Open 24 hours".to_string()
        } else if ranges.is_empty() {
            "Closed".to_string()
        } else {
            ranges
                .iter()
                .map(|range| range.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// A calendar span of a holiday schedule, kept as display strings
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Schedule payload
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleKind {
    Holiday { date_ranges: Vec<DateRange> },
    BusinessHours { weekly: WeeklySchedule },
}

/// A holiday or business-hours schedule attached to an auto attendant
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub id: String,
    pub name: String,
    pub kind: ScheduleKind,
}

/// What a call handling association gates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    Holiday,
    AfterHours,
}

/// Links a schedule to a call flow
#[derive(Debug, Clone, PartialEq)]
pub struct CallHandling {
    pub kind: AssociationKind,
    pub schedule_id: String,
    pub call_flow_id: String,
    pub enabled: bool,
}

/// Fully normalized auto attendant configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AutoAttendant {
    pub app: VoiceApp,
    pub time_zone: String,
    pub default_call_flow: CallFlow,
    pub call_flows: Vec<NamedCallFlow>,
    pub schedules: Vec<Schedule>,
    pub call_handling: Vec<CallHandling>,
}

impl AutoAttendant {
    fn flow_by_id(&self, id: &str) -> Option<&NamedCallFlow> {
        self.call_flows.iter().find(|flow| flow.id == id)
    }

    fn schedule_by_id(&self, id: &str) -> Option<&Schedule> {
        self.schedules.iter().find(|schedule| schedule.id == id)
    }

    /// Enabled holiday associations with their schedule and call flow, in
    /// association order. Associations pointing at missing schedules or
    /// flows are skipped.
    pub fn enabled_holidays(&self) -> Vec<(&Schedule, &NamedCallFlow)> {
        self.call_handling
            .iter()
            .filter(|assoc| assoc.kind == AssociationKind::Holiday && assoc.enabled)
            .filter_map(|assoc| {
                let schedule = self.schedule_by_id(&assoc.schedule_id)?;
                let flow = self.flow_by_id(&assoc.call_flow_id)?;
                matches!(schedule.kind, ScheduleKind::Holiday { .. }).then_some((schedule, flow))
            })
            .collect()
    }

    /// The after-hours schedule and call flow, if the attendant has a real
    /// after-hours configuration
    ///
    /// The "open 24h every day, complement enabled" sentinel counts as *no*
    /// after hours regardless of any enabled flag on the association.
    pub fn after_hours(&self) -> Option<(&WeeklySchedule, &NamedCallFlow)> {
        self.call_handling
            .iter()
            .filter(|assoc| assoc.kind == AssociationKind::AfterHours && assoc.enabled)
            .find_map(|assoc| {
                let schedule = self.schedule_by_id(&assoc.schedule_id)?;
                let flow = self.flow_by_id(&assoc.call_flow_id)?;
                match &schedule.kind {
                    ScheduleKind::BusinessHours { weekly } if !weekly.is_always_open_sentinel() => {
                        Some((weekly, flow))
                    }
                    _ => None,
                }
            })
    }
}

/// Action taken on queue overflow or timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    Disconnect,
    Forward,
    SharedVoicemail,
    Unknown,
}

/// How the queue distributes calls to agents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMethod {
    Attendant,
    Serial,
    RoundRobin,
    LongestIdle,
    Unknown,
}

impl fmt::Display for RoutingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMethod::Attendant => write!(f, "Attendant"),
            RoutingMethod::Serial => write!(f, "Serial"),
            RoutingMethod::RoundRobin => write!(f, "Round Robin"),
            RoutingMethod::LongestIdle => write!(f, "Longest Idle"),
            RoutingMethod::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Hold music source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicOnHold {
    Default,
    Custom,
}

impl fmt::Display for MusicOnHold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MusicOnHold::Default => write!(f, "Default"),
            MusicOnHold::Custom => write!(f, "Custom"),
        }
    }
}

/// Where the agent roster comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentListKind {
    Users,
    Group,
    TeamsChannel,
}

impl fmt::Display for AgentListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentListKind::Users => write!(f, "Users"),
            AgentListKind::Group => write!(f, "Group"),
            AgentListKind::TeamsChannel => write!(f, "Teams Channel"),
        }
    }
}

/// One agent in a queue roster
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: String,
    pub display_name: String,
}

/// Distribution, overflow and timeout policy of a call queue
#[derive(Debug, Clone, PartialEq)]
pub struct CallQueueSettings {
    pub overflow_threshold: u32,
    pub overflow_action: QueueAction,
    pub overflow_target: Option<CallTarget>,
    pub timeout_threshold: u32,
    pub timeout_action: QueueAction,
    pub timeout_target: Option<CallTarget>,
    pub routing_method: RoutingMethod,
    pub agent_alert_time: u32,
    pub music_on_hold: MusicOnHold,
    pub conference_mode_enabled: bool,
    pub agent_opt_out_allowed: bool,
    pub presence_based_routing: bool,
    pub agent_list_kind: AgentListKind,
    pub agents: Vec<Agent>,
}

/// Fully normalized call queue configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CallQueue {
    pub app: VoiceApp,
    pub settings: CallQueueSettings,
}

/// A resolved voice app with its routing configuration
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceAppConfig {
    AutoAttendant(AutoAttendant),
    CallQueue(CallQueue),
}

impl VoiceAppConfig {
    /// The identity snapshot shared by both kinds
    pub fn app(&self) -> &VoiceApp {
        match self {
            VoiceAppConfig::AutoAttendant(attendant) => &attendant.app,
            VoiceAppConfig::CallQueue(queue) => &queue.app,
        }
    }
}
