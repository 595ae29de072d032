use chrono::{Local, TimeZone};
use memoir::prelude::*;
use memoir::{MaskOutcome, MaskState};

// 2024-01-01T12:34:56Z
const TS: i64 = 1_704_112_496_000;

fn screenshot(seed: u8) -> Observation {
    Observation::screenshot("web", Media::new(ImageFormat::Png, vec![seed; 8]))
}

fn caching() -> MemoryConfig {
    MemoryConfig::default()
        .with_prompt_caching(true)
        .with_screenshot_bounds(3, 12)
}

fn visible_screenshots(messages: &[MultiMediaMessage]) -> usize {
    messages
        .iter()
        .filter(|m| {
            m.content
                .iter()
                .any(|p| matches!(p, MessagePart::Image { .. }))
        })
        .count()
}

#[tokio::test]
async fn render_is_idempotent_without_appends() {
    for config in [MemoryConfig::default(), caching()] {
        let mut memory = AgentMemory::new(config).unwrap();
        for i in 0..5u8 {
            memory.record_thought(format!("thought {i}")).unwrap();
            memory.record_observation(screenshot(i)).unwrap();
        }
        let first = memory.render().await.unwrap();
        let second = memory.render().await.unwrap();
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn thought_window_keeps_newest() {
    let mut memory = AgentMemory::new(MemoryConfig::default().with_thought_limit(4)).unwrap();
    memory
        .record_observation(Observation::new(
            ObservationSource::Task,
            MessageRole::User,
            [ContentPart::text("goal")],
        ))
        .unwrap();
    for i in 0..10 {
        memory.record_thought(format!("t{i}")).unwrap();
    }

    let messages = memory.render().await.unwrap();
    let texts: Vec<String> = messages.iter().map(MultiMediaMessage::text).collect();
    assert_eq!(texts.len(), 5);
    assert_eq!(texts[0], "goal");
    for (text, expected) in texts[1..].iter().zip(["t6", "t7", "t8", "t9"]) {
        assert!(text.ends_with(expected), "{text} should end with {expected}");
    }
}

#[tokio::test]
async fn thought_without_limit_uses_configured_default() {
    let mut memory = AgentMemory::new(MemoryConfig::default().with_thought_limit(2)).unwrap();
    for i in 0..4 {
        memory
            .record_observation(Observation::thought(
                format!("t{i}"),
                RetentionPolicy::thought_default(),
            ))
            .unwrap();
    }
    assert_eq!(memory.render().await.unwrap().len(), 2);
}

#[tokio::test]
async fn screenshot_hysteresis_drops_in_batches() {
    let mut memory = AgentMemory::new(caching()).unwrap();

    for k in 1..=12usize {
        memory.record_observation(screenshot(k as u8)).unwrap();
        let report = memory.render_with_report().await.unwrap();
        assert_eq!(visible_screenshots(&report.messages), k, "after append {k}");
        let expected = if k == 1 {
            MaskOutcome::Recomputed
        } else {
            MaskOutcome::Reused
        };
        assert_eq!(report.outcome, expected, "after append {k}");
    }

    memory.record_observation(screenshot(13)).unwrap();
    let report = memory.render_with_report().await.unwrap();
    assert_eq!(report.outcome, MaskOutcome::BatchDropped);
    assert_eq!(visible_screenshots(&report.messages), 3);
    // The three newest survive.
    assert_eq!(report.mask.as_slice()[10..], [true, true, true]);
    assert!(report.mask.as_slice()[..10].iter().all(|v| !v));

    // Frozen again: grows from 3 back up to 12, then drops on the next one.
    for k in 14..=22usize {
        memory.record_observation(screenshot(k as u8)).unwrap();
        let report = memory.render_with_report().await.unwrap();
        assert_eq!(report.outcome, MaskOutcome::Reused);
        assert_eq!(visible_screenshots(&report.messages), k - 10);
    }
    memory.record_observation(screenshot(23)).unwrap();
    let report = memory.render_with_report().await.unwrap();
    assert_eq!(report.outcome, MaskOutcome::BatchDropped);
    assert_eq!(visible_screenshots(&report.messages), 3);
}

#[tokio::test]
async fn frozen_mask_keeps_rendered_prefix_stable() {
    let mut memory = AgentMemory::new(caching()).unwrap();
    for i in 0..5u8 {
        memory.record_observation(screenshot(i)).unwrap();
    }
    let before = memory.render().await.unwrap();
    assert_eq!(visible_screenshots(&before), 3);

    memory
        .record_observation(Observation::action_taken("click", "clicked submit"))
        .unwrap();
    memory.record_thought("waiting for the page").unwrap();

    let report = memory.render_with_report().await.unwrap();
    assert_eq!(report.outcome, MaskOutcome::Reused);
    assert_eq!(report.messages.len(), before.len() + 2);
    assert_eq!(report.messages[..before.len()], before[..]);
}

#[tokio::test]
async fn caching_disabled_recomputes_every_render() {
    let mut memory =
        AgentMemory::new(MemoryConfig::default().with_screenshot_bounds(3, 12)).unwrap();
    for k in 1..=6u8 {
        memory.record_observation(screenshot(k)).unwrap();
        let report = memory.render_with_report().await.unwrap();
        assert_eq!(report.outcome, MaskOutcome::Recomputed);
        assert_eq!(visible_screenshots(&report.messages), usize::from(k).min(3));
    }
    assert_eq!(memory.mask_state(), &MaskState::NoMask);
}

#[tokio::test]
async fn render_emits_one_message_per_visible_record() {
    let mut memory = AgentMemory::new(caching().with_thought_limit(3)).unwrap();
    for i in 0..8u8 {
        memory.record_thought(format!("t{i}")).unwrap();
        memory.record_observation(screenshot(i)).unwrap();
        memory
            .record_observation(Observation::action_result(
                "scroll",
                [ContentPart::text(format!("scrolled {i}"))],
            ))
            .unwrap();
        let report = memory.render_with_report().await.unwrap();
        assert_eq!(report.messages.len(), report.mask.visible_count());
        assert_eq!(report.mask.len(), memory.len());
    }
}

#[tokio::test]
async fn snapshot_round_trip_is_lossless() {
    let mut memory = AgentMemory::new(caching().with_instructions("stay on task")).unwrap();
    memory
        .record_observation(Observation::action_taken("type", "typed password").with_timestamp(TS))
        .unwrap();
    memory
        .record_observation(screenshot(0xAB).with_timestamp(TS + 1))
        .unwrap();
    memory
        .record_observation(
            Observation::thought("check the banner", RetentionPolicy::thought(2))
                .with_timestamp(TS + 2),
        )
        .unwrap();
    memory
        .record_observation(
            Observation::new(
                ObservationSource::from("custom:probe"),
                MessageRole::Tool,
                [
                    ContentPart::text("raw"),
                    ContentPart::from(Media::new(ImageFormat::Jpeg, vec![0xFF, 0xD8, 0xFF])),
                ],
            )
            .with_timestamp(TS + 3),
        )
        .unwrap();
    memory.render().await.unwrap();

    let json = memory.export().unwrap().to_json().unwrap();
    let snapshot = MemorySnapshot::from_json(&json).unwrap();
    let restored = AgentMemory::from_snapshot(MemoryConfig::default(), &snapshot).unwrap();

    assert_eq!(restored.instructions(), Some("stay on task"));
    let original: Vec<_> = memory.log().iter().collect();
    let roundtrip: Vec<_> = restored.log().iter().collect();
    assert_eq!(original, roundtrip);
    assert_eq!(restored.export().unwrap(), snapshot);
    assert_eq!(restored.mask_state(), &MaskState::NoMask);
}

#[tokio::test]
async fn authored_records_are_time_prefixed() {
    let prefix = format!(
        "[{}]: ",
        Local.timestamp_millis_opt(TS).unwrap().format("%H:%M:%S")
    );
    let mut memory = AgentMemory::new(MemoryConfig::default()).unwrap();
    memory
        .record_observation(
            Observation::thought("plan", RetentionPolicy::thought(5)).with_timestamp(TS),
        )
        .unwrap();
    memory
        .record_observation(Observation::action_taken("click", "clicked").with_timestamp(TS))
        .unwrap();
    memory
        .record_observation(
            Observation::action_result("click", [ContentPart::text("ok")]).with_timestamp(TS),
        )
        .unwrap();
    memory
        .record_observation(screenshot(1).with_timestamp(TS))
        .unwrap();

    let messages = memory.render().await.unwrap();
    assert_eq!(messages[0].text(), format!("{prefix}plan"));
    assert_eq!(messages[1].text(), format!("{prefix}clicked"));
    assert_eq!(messages[2].text(), "ok");
    assert_eq!(messages[3].content.len(), 1);
    assert!(matches!(messages[3].content[0], MessagePart::Image { .. }));
}

#[tokio::test]
async fn source_tags_survive_round_trip() {
    let json = r#"{
        "observations": [
            {"source": "action:taken:", "role": "assistant", "timestamp": 1,
             "data": [{"type": "text", "text": "noop"}]},
            {"source": "connector:", "role": "user", "timestamp": 2,
             "data": [{"type": "text", "text": "page"}]},
            {"source": "connector", "role": "user", "timestamp": 3,
             "data": [{"type": "text", "text": "page"}]},
            {"source": "thoughtful", "role": "user", "timestamp": 4,
             "data": [{"type": "text", "text": "aside"}]}
        ]
    }"#;
    let snapshot = MemorySnapshot::from_json(json).unwrap();
    let mut memory = AgentMemory::from_snapshot(MemoryConfig::default(), &snapshot).unwrap();
    let before = memory.render().await.unwrap();

    let exported = memory.export().unwrap();
    let tags: Vec<String> = exported
        .observations
        .iter()
        .map(|o| o.source.to_string())
        .collect();
    assert_eq!(tags, ["action:taken:", "connector:", "connector", "thoughtful"]);
    assert_eq!(exported, snapshot);

    let reloaded = MemorySnapshot::from_json(&exported.to_json().unwrap()).unwrap();
    let mut restored = AgentMemory::from_snapshot(MemoryConfig::default(), &reloaded).unwrap();
    let original: Vec<_> = memory.log().iter().collect();
    let roundtrip: Vec<_> = restored.log().iter().collect();
    assert_eq!(original, roundtrip);
    // Same classes, so the same records are time-prefixed.
    assert_eq!(restored.render().await.unwrap(), before);
    assert_eq!(before[3].content.len(), 1);
}
