//! End-to-end renders over snapshot fixtures
//!
//! These tests drive the public API with realistic tenant snapshots and
//! check the structural guarantees of the output: linear chains for plain
//! attendants, gate omission, shared-target deduplication, nested expansion
//! with cycle markers, id uniqueness and byte-for-byte determinism.

use std::collections::HashSet;

use pretty_assertions::assert_eq;

use callflow_generator_mermaid::{
    CallFlowGenerator, DocType, RenderOptions, SnapshotProvider, VoiceAppSelector,
};

fn mermaid_options() -> RenderOptions {
    RenderOptions {
        doc_type: DocType::Mermaid,
        ..RenderOptions::default()
    }
}

fn render(json: &str, options: RenderOptions, number: &str) -> String {
    let provider = SnapshotProvider::from_json(json).unwrap();
    let generator = CallFlowGenerator::new(options);
    generator
        .generate(
            &provider,
            &VoiceAppSelector::PhoneNumber(number.to_string()),
        )
        .unwrap()
        .text
}

/// Node and subgraph ids declared by a flowchart body, in order
fn declared_ids(body: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line == "flowchart TB" || line == "end" {
            continue;
        }
        if let Some(rest) = line.strip_prefix("subgraph ") {
            ids.push(rest.split('[').next().unwrap().to_string());
            continue;
        }
        if line.contains("--") || line.contains("-.") {
            continue;
        }
        let id: String = line
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !id.is_empty() {
            ids.push(id);
        }
    }
    ids
}

/// Auto attendant transferring straight to an external number, no schedules
const SIMPLE_ATTENDANT: &str = r#"{
    "autoAttendants": [{
        "id": "aa-1",
        "name": "Front Desk",
        "defaultCallFlow": {
            "greeting": "audioFile",
            "action": "transferCallToTarget",
            "target": { "kind": "externalPstn", "reference": "+1555123456" }
        }
    }],
    "resourceAccounts": [
        { "id": "ra-1", "phoneNumber": "+15550100", "voiceAppId": "aa-1" }
    ]
}"#;

/// Full tenant: attendant with holiday and after-hours gates in front of a
/// call queue whose overflow and timeout forward to the same user, plus a
/// self-targeting escalation queue
const FULL_TENANT: &str = r#"{
    "autoAttendants": [{
        "id": "aa-main",
        "name": "Main Line",
        "timeZone": "W. Europe Standard Time",
        "defaultCallFlow": {
            "greeting": "audioFile",
            "action": "transferCallToTarget",
            "target": { "kind": "applicationEndpoint", "reference": "ra-support" }
        },
        "callFlows": [
            {
                "id": "cf-ah",
                "name": "After hours",
                "greeting": "textToSpeech",
                "action": "disconnect"
            },
            {
                "id": "cf-hol",
                "name": "Christmas",
                "action": "disconnect"
            }
        ],
        "schedules": [
            {
                "id": "sch-bh",
                "name": "Business hours",
                "kind": "businessHours",
                "complementEnabled": true,
                "weekly": {
                    "monday": [{ "start": "09:00", "end": "17:00" }],
                    "tuesday": [{ "start": "09:00", "end": "17:00" }],
                    "wednesday": [{ "start": "09:00", "end": "17:00" }],
                    "thursday": [{ "start": "09:00", "end": "17:00" }],
                    "friday": [{ "start": "09:00", "end": "17:00" }]
                }
            },
            {
                "id": "sch-hol",
                "name": "Christmas",
                "kind": "holiday",
                "dateRanges": [{ "start": "25/12/2025", "end": "26/12/2025" }]
            }
        ],
        "callHandlingAssociations": [
            { "kind": "afterHours", "scheduleId": "sch-bh", "callFlowId": "cf-ah" },
            { "kind": "holiday", "scheduleId": "sch-hol", "callFlowId": "cf-hol" }
        ]
    }],
    "callQueues": [
        {
            "id": "cq-support",
            "name": "Support",
            "routingMethod": "roundRobin",
            "agentAlertTime": 30,
            "overflowThreshold": 10,
            "overflowAction": "forward",
            "overflowTarget": { "kind": "user", "reference": "u-ada" },
            "timeoutThreshold": 45,
            "timeoutAction": "forward",
            "timeoutTarget": { "kind": "user", "reference": "u-ada" },
            "agentListKind": "users",
            "agents": [{ "id": "u-ada" }, { "id": "u-grace" }]
        },
        {
            "id": "cq-esc",
            "name": "Escalations",
            "routingMethod": "serial",
            "overflowThreshold": 5,
            "overflowAction": "disconnectWithBusy",
            "timeoutThreshold": 60,
            "timeoutAction": "forward",
            "timeoutTarget": { "kind": "applicationEndpoint", "reference": "ra-esc" },
            "agents": [{ "id": "u-grace" }]
        }
    ],
    "resourceAccounts": [
        { "id": "ra-main", "phoneNumber": "+15550100", "voiceAppId": "aa-main" },
        { "id": "ra-support", "phoneNumber": "+15550200", "voiceAppId": "cq-support" },
        { "id": "ra-esc", "phoneNumber": "+15550300", "voiceAppId": "cq-esc" }
    ],
    "users": { "u-ada": "Ada Lovelace", "u-grace": "Grace Hopper" }
}"#;

#[test]
fn simple_attendant_renders_linear_chain_without_gates() {
    let body = render(SIMPLE_ATTENDANT, mermaid_options(), "+15550100");

    assert!(!body.contains("During Holiday?"));
    assert!(!body.contains("During Business Hours?"));
    assert!(!body.contains("{\""), "no decision rhombus expected:\n{body}");

    assert!(body.contains("aaDefault1Greeting[[\"Greeting<br>Audio File\"]]"));
    assert!(body.contains("aaDefault1Action(\"Transfer Call\")"));
    assert!(body.contains("aaDefaultTarget1(\"External Number<br>+1555123456\")"));
    assert!(body.contains("voiceApp1 --> aaDefault1Greeting"));
    assert!(body.contains("aaDefault1Greeting --> aaDefault1Action"));
    assert!(body.contains("aaDefault1Action --> aaDefaultTarget1"));
}

#[test]
fn always_open_sentinel_suppresses_after_hours_gate() {
    let json = r#"{
        "autoAttendants": [{
            "id": "aa-1",
            "name": "Front Desk",
            "defaultCallFlow": { "action": "disconnect" },
            "callFlows": [
                { "id": "cf-ah", "name": "After hours", "action": "disconnect" }
            ],
            "schedules": [{
                "id": "sch-bh",
                "name": "Always open",
                "kind": "businessHours",
                "complementEnabled": true,
                "weekly": {
                    "monday": [{ "start": "00:00", "end": "24:00" }],
                    "tuesday": [{ "start": "00:00", "end": "24:00" }],
                    "wednesday": [{ "start": "00:00", "end": "24:00" }],
                    "thursday": [{ "start": "00:00", "end": "24:00" }],
                    "friday": [{ "start": "00:00", "end": "24:00" }],
                    "saturday": [{ "start": "00:00", "end": "24:00" }],
                    "sunday": [{ "start": "00:00", "end": "24:00" }]
                }
            }],
            "callHandlingAssociations": [
                { "kind": "afterHours", "scheduleId": "sch-bh", "callFlowId": "cf-ah" }
            ]
        }],
        "resourceAccounts": [
            { "id": "ra-1", "phoneNumber": "+15550100", "voiceAppId": "aa-1" }
        ]
    }"#;

    let body = render(json, mermaid_options(), "+15550100");
    assert!(!body.contains("During Business Hours?"));
    assert!(body.contains("voiceApp1 --> aaDefault1Greeting"));
}

#[test]
fn gates_render_in_front_of_default_flow() {
    let body = render(FULL_TENANT, mermaid_options(), "+15550100");

    assert!(body.contains("aaHolidayCheck1{\"During Holiday?\"}"));
    assert!(body.contains("Time Zone: W. Europe Standard Time"));
    assert!(body.contains("Monday: 09:00 - 17:00"));
    assert!(body.contains("Saturday: Closed"));
    assert!(body.contains("aaHolidayCheck1 -->|\"Yes\"| subgraphHolidays1"));
    assert!(body.contains("aaHolidayCheck1 -->|\"No\"| aaBusinessHoursCheck1"));
    assert!(body.contains("aaBusinessHoursCheck1 -->|\"Yes\"| aaDefault1Greeting"));
    assert!(body.contains("aaBusinessHoursCheck1 -->|\"No\"| aaAfterHours1Greeting"));
    assert!(body.contains("subgraph subgraphHoliday1[\"Christmas\"]"));
    assert!(body.contains("25/12/2025 - 26/12/2025"));
}

#[test]
fn shared_overflow_and_timeout_target_collapse_to_one_node() {
    let body = render(FULL_TENANT, mermaid_options(), "+15550200");

    let target_nodes = body
        .lines()
        .filter(|line| line.contains("User<br>Ada Lovelace"))
        .count();
    assert_eq!(target_nodes, 1, "expected one shared target node:\n{body}");

    assert!(body.contains("cqConnectedCheck1 -->|\"No\"| cqTimeoutTarget1"));
    assert!(body.contains("cqOverflow1 -->|\"Yes\"| cqTimeoutTarget1"));
    assert!(!body.contains("cqOverflowTarget"));
}

#[test]
fn distinct_outcome_targets_get_their_own_nodes() {
    let json = FULL_TENANT.replace(
        r#""timeoutTarget": { "kind": "user", "reference": "u-ada" }"#,
        r#""timeoutTarget": { "kind": "user", "reference": "u-grace" }"#,
    );
    let body = render(&json, mermaid_options(), "+15550200");

    assert!(body.contains("cqOverflowTarget1(\"User<br>Ada Lovelace\")"));
    assert!(body.contains("cqTimeoutTarget1(\"User<br>Grace Hopper\")"));
}

/// Queue whose overflow and timeout both land in the same voicemail group
const VOICEMAIL_QUEUE: &str = r#"{
    "callQueues": [{
        "id": "cq-night",
        "name": "Night Desk",
        "routingMethod": "serial",
        "overflowThreshold": 3,
        "overflowAction": "sharedVoicemail",
        "overflowTarget": { "kind": "sharedVoicemail", "reference": "g-1" },
        "timeoutThreshold": 20,
        "timeoutAction": "sharedVoicemail",
        "timeoutTarget": { "kind": "sharedVoicemail", "reference": "g-1" },
        "agents": [{ "id": "u-ada" }]
    }],
    "resourceAccounts": [
        { "id": "ra-night", "phoneNumber": "+15550400", "voiceAppId": "cq-night" }
    ],
    "users": { "u-ada": "Ada Lovelace" },
    "groups": { "g-1": "Helpdesk" }
}"#;

#[test]
fn shared_voicemail_outcomes_collapse_to_one_node() {
    let body = render(VOICEMAIL_QUEUE, mermaid_options(), "+15550400");

    let voicemail_nodes = body
        .lines()
        .filter(|line| line.contains("Shared Voicemail<br>Helpdesk"))
        .count();
    assert_eq!(voicemail_nodes, 1, "expected one shared voicemail node:\n{body}");

    assert!(body.contains("cqConnectedCheck1 -->|\"No\"| cqTimeoutTarget1"));
    assert!(body.contains("cqOverflow1 -->|\"Yes\"| cqTimeoutTarget1"));
    assert!(!body.contains("cqOverflowTarget"));
}

#[test]
fn mixed_forward_and_voicemail_outcomes_collapse() {
    let json = VOICEMAIL_QUEUE.replace(
        r#""overflowAction": "sharedVoicemail""#,
        r#""overflowAction": "forward""#,
    );
    let body = render(&json, mermaid_options(), "+15550400");

    let voicemail_nodes = body
        .lines()
        .filter(|line| line.contains("Shared Voicemail<br>Helpdesk"))
        .count();
    assert_eq!(voicemail_nodes, 1);
    assert!(body.contains("cqOverflow1 -->|\"Yes\"| cqTimeoutTarget1"));
}

#[test]
fn queue_renders_distribution_settings_and_agents() {
    let body = render(FULL_TENANT, mermaid_options(), "+15550200");

    assert!(body.contains("cqOverflow1{\"More than 10 Active Calls?\"}"));
    assert!(body.contains("cqOverflow1 -->|\"No\"| cqDistribution1"));
    assert!(body.contains("subgraph subgraphSettings1[\"Settings\"]"));
    assert!(body.contains("cqSettingsRouting1[(\"Routing Method: Round Robin\")]"));
    assert!(body.contains("cqSettingsTimeout1[(\"Timeout: 45 Seconds\")]"));
    assert!(body.contains("cqAgentList1(\"Agent List Type: Users\")"));

    // Agent roster keeps the list's native order.
    let ada = body.find("cqAgent1_1(\"Agent<br>Ada Lovelace\")").unwrap();
    let grace = body.find("cqAgent1_2(\"Agent<br>Grace Hopper\")").unwrap();
    assert!(ada < grace);

    assert!(body.contains("cqTimeout1 --> cqConnectedCheck1"));
    assert!(body.contains("cqConnectedCheck1 -->|\"Yes\"| cqConnected1"));
}

#[test]
fn nested_queue_expansion_follows_transfer_target() {
    let options = RenderOptions {
        show_nested_queues: true,
        ..mermaid_options()
    };
    let body = render(FULL_TENANT, options, "+15550100");

    assert!(body.contains("aaDefaultTarget1[\"Call Queue<br>Support\"]"));
    assert!(body.contains("aaDefaultTarget1 --> cqOverflow1"));
    assert!(body.contains("More than 10 Active Calls?"));
}

#[test]
fn nested_expansion_is_off_by_default() {
    let body = render(FULL_TENANT, mermaid_options(), "+15550100");

    assert!(body.contains("aaDefaultTarget1[\"Call Queue<br>Support\"]"));
    assert!(!body.contains("cqOverflow"));
}

#[test]
fn self_targeting_queue_emits_reference_marker() {
    let options = RenderOptions {
        show_nested_queues: true,
        ..mermaid_options()
    };
    let body = render(FULL_TENANT, options, "+15550300");

    assert!(body.contains("Call Queue<br>Escalations<br>(already shown)"));
    // Exactly one overflow decision: the cycle was not re-entered.
    let overflow_nodes = body
        .lines()
        .filter(|line| line.contains("More than 5 Active Calls?"))
        .count();
    assert_eq!(overflow_nodes, 1);
}

#[test]
fn nested_phone_numbers_annotate_placed_targets() {
    let options = RenderOptions {
        show_nested_queues: true,
        show_nested_phone_numbers: true,
        ..mermaid_options()
    };
    let body = render(FULL_TENANT, options, "+15550100");

    assert!(body.contains("topLevelNumber1(\"Incoming Call<br>+15550200\")"));
    assert!(body.contains("topLevelNumber1 -...-> aaDefaultTarget1"));
}

#[test]
fn node_ids_are_unique_for_all_option_combinations() {
    for (nested, numbers) in [(false, false), (true, false), (false, true), (true, true)] {
        let options = RenderOptions {
            show_nested_queues: nested,
            show_nested_phone_numbers: numbers,
            ..mermaid_options()
        };
        let body = render(FULL_TENANT, options, "+15550100");

        let ids = declared_ids(&body);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(
            ids.len(),
            unique.len(),
            "duplicate ids with nested={nested} numbers={numbers}:\n{body}"
        );
    }
}

#[test]
fn edges_reference_declared_nodes() {
    let options = RenderOptions {
        show_nested_queues: true,
        show_nested_phone_numbers: true,
        ..mermaid_options()
    };
    let body = render(FULL_TENANT, options, "+15550100");
    let ids: HashSet<String> = declared_ids(&body).into_iter().collect();

    for line in body.lines() {
        let line = line.trim();
        let Some((from, rest)) = line.split_once(" --") else {
            continue;
        };
        let to = rest
            .rsplit_once(' ')
            .map(|(_, to)| to)
            .unwrap_or(rest);
        assert!(ids.contains(from), "edge from undeclared {from}: {line}");
        assert!(ids.contains(to), "edge to undeclared {to}: {line}");
    }
}

#[test]
fn subgraphs_are_balanced() {
    let options = RenderOptions {
        show_nested_queues: true,
        ..mermaid_options()
    };
    let body = render(FULL_TENANT, options, "+15550100");

    let opened = body
        .lines()
        .filter(|line| line.trim().starts_with("subgraph "))
        .count();
    let closed = body.lines().filter(|line| line.trim() == "end").count();
    assert_eq!(opened, closed);
    assert!(opened >= 4, "holidays, distribution, settings, agents");
}

#[test]
fn rendering_twice_is_byte_identical() {
    let options = RenderOptions {
        show_nested_queues: true,
        show_nested_phone_numbers: true,
        ..mermaid_options()
    };
    let first = render(FULL_TENANT, options.clone(), "+15550100");
    let second = render(FULL_TENANT, options, "+15550100");
    assert_eq!(first, second);
}

#[test]
fn markdown_document_wraps_the_body() {
    let provider = SnapshotProvider::from_json(SIMPLE_ATTENDANT).unwrap();
    let generator = CallFlowGenerator::new(RenderOptions::default());
    let document = generator
        .generate(
            &provider,
            &VoiceAppSelector::PhoneNumber("+15550100".to_string()),
        )
        .unwrap();

    assert_eq!(document.extension, "md");
    assert!(document.text.starts_with("# Call Flow - Front Desk"));
    assert!(document.text.contains("```mermaid\nflowchart TB\n"));
}

#[test]
fn missing_number_aborts_with_not_found() {
    let provider = SnapshotProvider::from_json(SIMPLE_ATTENDANT).unwrap();
    let generator = CallFlowGenerator::new(RenderOptions::default());
    let err = generator
        .generate(
            &provider,
            &VoiceAppSelector::PhoneNumber("+19999999".to_string()),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        callflow_generator_mermaid::GeneratorError::NotFound(_)
    ));
}

#[test]
fn stale_endpoint_renders_unknown_target_leaf() {
    let json = r#"{
        "autoAttendants": [{
            "id": "aa-1",
            "name": "Front Desk",
            "defaultCallFlow": {
                "action": "transferCallToTarget",
                "target": { "kind": "applicationEndpoint", "reference": "ra-gone" }
            }
        }],
        "resourceAccounts": [
            { "id": "ra-1", "phoneNumber": "+15550100", "voiceAppId": "aa-1" }
        ]
    }"#;

    let body = render(json, mermaid_options(), "+15550100");
    assert!(body.contains("Unknown Target<br>ra-gone"));
}
