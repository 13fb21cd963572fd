//! Directory provider and model normalizer
//!
//! The generator consumes directory data through the [`DirectoryProvider`]
//! trait: read-only, already-authenticated lookups. This module also ships
//! [`SnapshotProvider`], an offline implementation backed by a serde JSON
//! tenant snapshot, together with the normalizer that maps the snapshot's
//! loosely-typed raw records into the closed model of [`crate::model`].
//!
//! Unrecognized action strings, target type tags and stale references never
//! abort normalization; they map to the model's `Unknown` arms with a
//! warning, so a partial configuration still produces a best-effort diagram.

use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;

use crate::model::{
    Agent, AgentListKind, AssociationKind, AutoAttendant, CallFlow, CallFlowAction, CallHandling,
    CallQueue, CallQueueSettings, CallTarget, DateRange, Greeting, MusicOnHold, NamedCallFlow,
    QueueAction, ResourceAccount, RoutingMethod, Schedule, ScheduleKind, TimeRange, VoiceApp,
    VoiceAppConfig, VoiceAppKind, WeeklySchedule, END_OF_DAY_MINUTES,
};

/// Read-only directory lookups consumed by the generator
///
/// One level of application-endpoint resolution happens inside the provider's
/// normalization; deeper configuration is fetched on demand through
/// [`DirectoryProvider::resolve_application_endpoint`] during nested
/// expansion.
pub trait DirectoryProvider {
    /// Find the voice app owning a resource account with this number
    fn find_voice_app_by_phone_number(&self, number: &str) -> Option<VoiceAppConfig>;

    /// Identity snapshots of every known voice app, in snapshot order
    fn list_voice_apps(&self) -> Vec<VoiceApp>;

    /// Full configuration of a voice app by id
    fn resolve_application_endpoint(&self, app_id: &str) -> Option<VoiceAppConfig>;
}

/// Strip the URI scheme from a directory phone number ("tel:+1555..." form)
pub fn strip_phone_scheme(number: &str) -> &str {
    number.strip_prefix("tel:").unwrap_or(number)
}

/// Parse "HH:MM" into minutes from midnight
///
/// Accepts "24:00" and the directory's "+1 day" notation "1.00:00" as the
/// end-of-day marker.
pub fn parse_time(value: &str) -> Option<u16> {
    if value == "1.00:00" {
        return Some(END_OF_DAY_MINUTES);
    }
    let (hours, minutes) = value.split_once(':')?;
    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;
    if hours > 24 || minutes > 59 || (hours == 24 && minutes != 0) {
        return None;
    }
    Some(hours * 60 + minutes)
}

// Raw snapshot records, shaped like the directory API's JSON.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSnapshot {
    #[serde(default)]
    pub auto_attendants: Vec<RawAutoAttendant>,
    #[serde(default)]
    pub call_queues: Vec<RawCallQueue>,
    #[serde(default)]
    pub resource_accounts: Vec<RawResourceAccount>,
    /// User id to display name
    #[serde(default)]
    pub users: IndexMap<String, String>,
    /// Group id to display name
    #[serde(default)]
    pub groups: IndexMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResourceAccount {
    pub id: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub voice_app_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAutoAttendant {
    pub id: String,
    pub name: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    pub default_call_flow: RawCallFlow,
    #[serde(default)]
    pub call_flows: Vec<RawNamedCallFlow>,
    #[serde(default)]
    pub schedules: Vec<RawSchedule>,
    #[serde(default)]
    pub call_handling_associations: Vec<RawAssociation>,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCallFlow {
    #[serde(default)]
    pub greeting: Option<String>,
    pub action: String,
    #[serde(default)]
    pub target: Option<RawTarget>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNamedCallFlow {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub flow: RawCallFlow,
}

/// Loosely-typed transfer target as the directory reports it
///
/// `reference` is a user id, group id, resource account id, or literal phone
/// number depending on `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTarget {
    pub kind: String,
    pub reference: String,
    #[serde(default)]
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchedule {
    pub id: String,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub date_ranges: Vec<RawDateRange>,
    #[serde(default)]
    pub weekly: Option<RawWeekly>,
    #[serde(default)]
    pub complement_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWeekly {
    #[serde(default)]
    pub monday: Vec<RawTimeRange>,
    #[serde(default)]
    pub tuesday: Vec<RawTimeRange>,
    #[serde(default)]
    pub wednesday: Vec<RawTimeRange>,
    #[serde(default)]
    pub thursday: Vec<RawTimeRange>,
    #[serde(default)]
    pub friday: Vec<RawTimeRange>,
    #[serde(default)]
    pub saturday: Vec<RawTimeRange>,
    #[serde(default)]
    pub sunday: Vec<RawTimeRange>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssociation {
    pub kind: String,
    pub schedule_id: String,
    pub call_flow_id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCallQueue {
    pub id: String,
    pub name: String,
    pub routing_method: String,
    #[serde(default = "default_agent_alert_time")]
    pub agent_alert_time: u32,
    pub overflow_threshold: u32,
    pub overflow_action: String,
    #[serde(default)]
    pub overflow_target: Option<RawTarget>,
    pub timeout_threshold: u32,
    pub timeout_action: String,
    #[serde(default)]
    pub timeout_target: Option<RawTarget>,
    #[serde(default)]
    pub music_on_hold: Option<String>,
    #[serde(default)]
    pub conference_mode_enabled: bool,
    #[serde(default)]
    pub agent_opt_out_allowed: bool,
    #[serde(default)]
    pub presence_based_routing: bool,
    #[serde(default = "default_agent_list_kind")]
    pub agent_list_kind: String,
    #[serde(default)]
    pub agents: Vec<RawAgent>,
}

fn default_agent_alert_time() -> u32 {
    30
}

fn default_agent_list_kind() -> String {
    "users".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAgent {
    pub id: String,
}

/// Offline [`DirectoryProvider`] backed by a tenant snapshot
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    snapshot: TenantSnapshot,
}

impl SnapshotProvider {
    pub fn new(snapshot: TenantSnapshot) -> Self {
        Self { snapshot }
    }

    /// Parse a snapshot from its JSON form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    fn resource_accounts_of(&self, voice_app_id: &str) -> Vec<ResourceAccount> {
        self.snapshot
            .resource_accounts
            .iter()
            .filter(|account| account.voice_app_id == voice_app_id)
            .map(|account| ResourceAccount {
                id: account.id.clone(),
                phone_number: account
                    .phone_number
                    .as_deref()
                    .map(|number| strip_phone_scheme(number).to_string()),
            })
            .collect()
    }

    fn voice_app_identity(&self, id: &str) -> Option<VoiceApp> {
        let (kind, name) = if let Some(aa) = self.snapshot.auto_attendants.iter().find(|a| a.id == id)
        {
            (VoiceAppKind::AutoAttendant, aa.name.clone())
        } else if let Some(cq) = self.snapshot.call_queues.iter().find(|q| q.id == id) {
            (VoiceAppKind::CallQueue, cq.name.clone())
        } else {
            return None;
        };

        Some(VoiceApp {
            kind,
            id: id.to_string(),
            name,
            resource_accounts: self.resource_accounts_of(id),
        })
    }

    fn resolve_user(&self, id: &str) -> Option<String> {
        self.snapshot.users.get(id).cloned()
    }

    fn resolve_group(&self, id: &str) -> Option<String> {
        self.snapshot.groups.get(id).cloned()
    }

    fn normalize_greeting(&self, raw: Option<&str>) -> Greeting {
        match raw {
            None => Greeting::None,
            Some("audioFile") => Greeting::AudioFile,
            Some("textToSpeech") => Greeting::TextToSpeech,
            Some(other) => {
                warn!("unrecognized greeting kind {other:?}, treating as none");
                Greeting::None
            }
        }
    }

    /// Resolve a raw target to its concrete variant
    ///
    /// Application endpoints are resolved through the resource account they
    /// reference; a reference matching neither a known auto attendant nor a
    /// known call queue degrades to `CallTarget::Unknown`.
    fn normalize_target(&self, raw: &RawTarget) -> CallTarget {
        match raw.kind.as_str() {
            "user" => {
                let display_name = self.resolve_user(&raw.reference).unwrap_or_else(|| {
                    warn!("user {} not found in directory", raw.reference);
                    "Unknown User".to_string()
                });
                CallTarget::User {
                    id: raw.reference.clone(),
                    display_name,
                }
            }
            "externalPstn" | "phoneNumber" => CallTarget::ExternalPstn {
                number: strip_phone_scheme(&raw.reference).to_string(),
            },
            "sharedVoicemail" => {
                let group_name = self.resolve_group(&raw.reference).unwrap_or_else(|| {
                    warn!("group {} not found in directory", raw.reference);
                    "Unknown Group".to_string()
                });
                CallTarget::SharedVoicemail {
                    group_id: raw.reference.clone(),
                    group_name,
                    greeting: self.normalize_greeting(raw.greeting.as_deref()),
                }
            }
            "applicationEndpoint" => {
                let app = self
                    .snapshot
                    .resource_accounts
                    .iter()
                    .find(|account| account.id == raw.reference)
                    .and_then(|account| self.voice_app_identity(&account.voice_app_id));
                match app {
                    Some(app) => CallTarget::ApplicationEndpoint { app },
                    None => {
                        warn!(
                            "application endpoint {} resolves to no known voice app",
                            raw.reference
                        );
                        CallTarget::Unknown {
                            reference: raw.reference.clone(),
                        }
                    }
                }
            }
            other => {
                warn!("unrecognized target kind {other:?}");
                CallTarget::Unknown {
                    reference: raw.reference.clone(),
                }
            }
        }
    }

    fn normalize_call_flow(&self, raw: &RawCallFlow) -> CallFlow {
        let action = match raw.action.as_str() {
            "disconnect" => CallFlowAction::Disconnect,
            "transferCallToTarget" => CallFlowAction::TransferToTarget,
            other => {
                warn!("unrecognized call flow action {other:?}");
                CallFlowAction::Unknown
            }
        };

        CallFlow {
            greeting: self.normalize_greeting(raw.greeting.as_deref()),
            action,
            target: raw.target.as_ref().map(|target| self.normalize_target(target)),
        }
    }

    fn normalize_weekly(&self, raw: &RawWeekly) -> WeeklySchedule {
        let days = [
            &raw.monday,
            &raw.tuesday,
            &raw.wednesday,
            &raw.thursday,
            &raw.friday,
            &raw.saturday,
            &raw.sunday,
        ];

        let intervals = std::array::from_fn(|day| {
            days[day]
                .iter()
                .filter_map(|range| {
                    match (parse_time(&range.start), parse_time(&range.end)) {
                        (Some(start), Some(end)) => Some(TimeRange::new(start, end)),
                        _ => {
                            warn!(
                                "unparseable time range {} to {}, skipping",
                                range.start, range.end
                            );
                            None
                        }
                    }
                })
                .collect()
        });

        WeeklySchedule {
            intervals,
            // The complement flag travels with the schedule, not per day.
            complement_enabled: false,
        }
    }

    fn normalize_schedule(&self, raw: &RawSchedule) -> Option<Schedule> {
        let kind = match raw.kind.as_str() {
            "holiday" => ScheduleKind::Holiday {
                date_ranges: raw
                    .date_ranges
                    .iter()
                    .map(|range| DateRange {
                        start: range.start.clone(),
                        end: range.end.clone(),
                    })
                    .collect(),
            },
            "businessHours" => {
                let mut weekly = self.normalize_weekly(raw.weekly.as_ref()?);
                weekly.complement_enabled = raw.complement_enabled;
                ScheduleKind::BusinessHours { weekly }
            }
            other => {
                warn!("unrecognized schedule kind {other:?}, skipping");
                return None;
            }
        };

        Some(Schedule {
            id: raw.id.clone(),
            name: raw.name.clone(),
            kind,
        })
    }

    fn normalize_association(&self, raw: &RawAssociation) -> Option<CallHandling> {
        let kind = match raw.kind.as_str() {
            "holiday" => AssociationKind::Holiday,
            "afterHours" => AssociationKind::AfterHours,
            other => {
                warn!("unrecognized call handling association kind {other:?}");
                return None;
            }
        };

        Some(CallHandling {
            kind,
            schedule_id: raw.schedule_id.clone(),
            call_flow_id: raw.call_flow_id.clone(),
            enabled: raw.enabled,
        })
    }

    fn normalize_auto_attendant(&self, raw: &RawAutoAttendant) -> AutoAttendant {
        AutoAttendant {
            app: VoiceApp {
                kind: VoiceAppKind::AutoAttendant,
                id: raw.id.clone(),
                name: raw.name.clone(),
                resource_accounts: self.resource_accounts_of(&raw.id),
            },
            time_zone: raw.time_zone.clone(),
            default_call_flow: self.normalize_call_flow(&raw.default_call_flow),
            call_flows: raw
                .call_flows
                .iter()
                .map(|flow| NamedCallFlow {
                    id: flow.id.clone(),
                    name: flow.name.clone(),
                    flow: self.normalize_call_flow(&flow.flow),
                })
                .collect(),
            schedules: raw
                .schedules
                .iter()
                .filter_map(|schedule| self.normalize_schedule(schedule))
                .collect(),
            call_handling: raw
                .call_handling_associations
                .iter()
                .filter_map(|assoc| self.normalize_association(assoc))
                .collect(),
        }
    }

    fn normalize_queue_action(&self, raw: &str) -> QueueAction {
        match raw {
            "disconnect" | "disconnectWithBusy" => QueueAction::Disconnect,
            "forward" => QueueAction::Forward,
            "voicemail" | "sharedVoicemail" => QueueAction::SharedVoicemail,
            other => {
                warn!("unrecognized queue action {other:?}");
                QueueAction::Unknown
            }
        }
    }

    fn normalize_call_queue(&self, raw: &RawCallQueue) -> CallQueue {
        let routing_method = match raw.routing_method.as_str() {
            "attendant" => RoutingMethod::Attendant,
            "serial" => RoutingMethod::Serial,
            "roundRobin" => RoutingMethod::RoundRobin,
            "longestIdle" => RoutingMethod::LongestIdle,
            other => {
                warn!("unrecognized routing method {other:?}");
                RoutingMethod::Unknown
            }
        };

        let agent_list_kind = match raw.agent_list_kind.as_str() {
            "users" => AgentListKind::Users,
            "group" => AgentListKind::Group,
            "teamsChannel" => AgentListKind::TeamsChannel,
            other => {
                warn!("unrecognized agent list kind {other:?}, treating as users");
                AgentListKind::Users
            }
        };

        let music_on_hold = match raw.music_on_hold.as_deref() {
            Some("custom") => MusicOnHold::Custom,
            _ => MusicOnHold::Default,
        };

        CallQueue {
            app: VoiceApp {
                kind: VoiceAppKind::CallQueue,
                id: raw.id.clone(),
                name: raw.name.clone(),
                resource_accounts: self.resource_accounts_of(&raw.id),
            },
            settings: CallQueueSettings {
                overflow_threshold: raw.overflow_threshold,
                overflow_action: self.normalize_queue_action(&raw.overflow_action),
                overflow_target: raw
                    .overflow_target
                    .as_ref()
                    .map(|target| self.normalize_target(target)),
                timeout_threshold: raw.timeout_threshold,
                timeout_action: self.normalize_queue_action(&raw.timeout_action),
                timeout_target: raw
                    .timeout_target
                    .as_ref()
                    .map(|target| self.normalize_target(target)),
                routing_method,
                agent_alert_time: raw.agent_alert_time,
                music_on_hold,
                conference_mode_enabled: raw.conference_mode_enabled,
                agent_opt_out_allowed: raw.agent_opt_out_allowed,
                presence_based_routing: raw.presence_based_routing,
                agent_list_kind,
                agents: raw
                    .agents
                    .iter()
                    .map(|agent| Agent {
                        id: agent.id.clone(),
                        display_name: self.resolve_user(&agent.id).unwrap_or_else(|| {
                            warn!("agent {} not found in directory", agent.id);
                            "Unknown Agent".to_string()
                        }),
                    })
                    .collect(),
            },
        }
    }
}

impl DirectoryProvider for SnapshotProvider {
    fn find_voice_app_by_phone_number(&self, number: &str) -> Option<VoiceAppConfig> {
        let wanted = strip_phone_scheme(number);
        let account = self.snapshot.resource_accounts.iter().find(|account| {
            account
                .phone_number
                .as_deref()
                .map(strip_phone_scheme)
                .is_some_and(|assigned| assigned == wanted)
        })?;
        self.resolve_application_endpoint(&account.voice_app_id)
    }

    fn list_voice_apps(&self) -> Vec<VoiceApp> {
        let mut apps = Vec::new();
        for aa in &self.snapshot.auto_attendants {
            if let Some(app) = self.voice_app_identity(&aa.id) {
                apps.push(app);
            }
        }
        for cq in &self.snapshot.call_queues {
            if let Some(app) = self.voice_app_identity(&cq.id) {
                apps.push(app);
            }
        }
        apps
    }

    fn resolve_application_endpoint(&self, app_id: &str) -> Option<VoiceAppConfig> {
        if let Some(aa) = self.snapshot.auto_attendants.iter().find(|a| a.id == app_id) {
            return Some(VoiceAppConfig::AutoAttendant(
                self.normalize_auto_attendant(aa),
            ));
        }
        if let Some(cq) = self.snapshot.call_queues.iter().find(|q| q.id == app_id) {
            return Some(VoiceAppConfig::CallQueue(self.normalize_call_queue(cq)));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("00:00"), Some(0));
        assert_eq!(parse_time("09:30"), Some(570));
        assert_eq!(parse_time("24:00"), Some(1440));
        assert_eq!(parse_time("1.00:00"), Some(1440));
        assert_eq!(parse_time("24:30"), None);
        assert_eq!(parse_time("garbage"), None);
    }

    #[test]
    fn test_strip_phone_scheme() {
        assert_eq!(strip_phone_scheme("tel:+15551234"), "+15551234");
        assert_eq!(strip_phone_scheme("+15551234"), "+15551234");
    }

    fn sample_provider() -> SnapshotProvider {
        SnapshotProvider::from_json(
            r#"{
                "autoAttendants": [{
                    "id": "aa-1",
                    "name": "Reception",
                    "defaultCallFlow": {
                        "greeting": "audioFile",
                        "action": "transferCallToTarget",
                        "target": { "kind": "user", "reference": "u-1" }
                    }
                }],
                "callQueues": [{
                    "id": "cq-1",
                    "name": "Support",
                    "routingMethod": "roundRobin",
                    "overflowThreshold": 10,
                    "overflowAction": "disconnectWithBusy",
                    "timeoutThreshold": 45,
                    "timeoutAction": "forward",
                    "timeoutTarget": { "kind": "applicationEndpoint", "reference": "ra-1" },
                    "agents": [{ "id": "u-1" }]
                }],
                "resourceAccounts": [
                    { "id": "ra-1", "phoneNumber": "tel:+15550100", "voiceAppId": "aa-1" },
                    { "id": "ra-2", "phoneNumber": "+15550101", "voiceAppId": "cq-1" }
                ],
                "users": { "u-1": "Ada Lovelace" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_find_by_phone_number_strips_scheme() {
        let provider = sample_provider();
        let config = provider.find_voice_app_by_phone_number("+15550100").unwrap();
        assert_eq!(config.app().name, "Reception");
        assert!(provider.find_voice_app_by_phone_number("+19990000").is_none());
    }

    #[test]
    fn test_list_voice_apps_in_snapshot_order() {
        let provider = sample_provider();
        let apps = provider.list_voice_apps();
        let names: Vec<&str> = apps.iter().map(|app| app.name.as_str()).collect();
        assert_eq!(names, vec!["Reception", "Support"]);
        assert_eq!(apps[1].phone_numbers().collect::<Vec<_>>(), vec!["+15550101"]);
    }

    #[test]
    fn test_user_target_resolution() {
        let provider = sample_provider();
        let config = provider.resolve_application_endpoint("aa-1").unwrap();
        let VoiceAppConfig::AutoAttendant(attendant) = config else {
            panic!("expected auto attendant");
        };
        assert_eq!(
            attendant.default_call_flow.target,
            Some(CallTarget::User {
                id: "u-1".to_string(),
                display_name: "Ada Lovelace".to_string(),
            })
        );
    }

    #[test]
    fn test_application_endpoint_resolves_one_level() {
        let provider = sample_provider();
        let config = provider.resolve_application_endpoint("cq-1").unwrap();
        let VoiceAppConfig::CallQueue(queue) = config else {
            panic!("expected call queue");
        };
        match queue.settings.timeout_target {
            Some(CallTarget::ApplicationEndpoint { ref app }) => {
                assert_eq!(app.id, "aa-1");
                assert_eq!(app.kind, VoiceAppKind::AutoAttendant);
            }
            ref other => panic!("expected application endpoint, got {other:?}"),
        }
    }

    #[test]
    fn test_stale_endpoint_degrades_to_unknown() {
        let provider = SnapshotProvider::from_json(
            r#"{
                "autoAttendants": [{
                    "id": "aa-1",
                    "name": "Reception",
                    "defaultCallFlow": {
                        "action": "transferCallToTarget",
                        "target": { "kind": "applicationEndpoint", "reference": "ra-gone" }
                    }
                }]
            }"#,
        )
        .unwrap();

        let config = provider.resolve_application_endpoint("aa-1").unwrap();
        let VoiceAppConfig::AutoAttendant(attendant) = config else {
            panic!("expected auto attendant");
        };
        assert_eq!(
            attendant.default_call_flow.target,
            Some(CallTarget::Unknown {
                reference: "ra-gone".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_action_arm() {
        let provider = SnapshotProvider::from_json(
            r#"{
                "autoAttendants": [{
                    "id": "aa-1",
                    "name": "Reception",
                    "defaultCallFlow": { "action": "teleport" }
                }]
            }"#,
        )
        .unwrap();

        let config = provider.resolve_application_endpoint("aa-1").unwrap();
        let VoiceAppConfig::AutoAttendant(attendant) = config else {
            panic!("expected auto attendant");
        };
        assert_eq!(attendant.default_call_flow.action, CallFlowAction::Unknown);
    }
}
