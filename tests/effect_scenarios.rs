use std::sync::Arc;
use std::time::Duration;

use lumen_bridge::runtime::Instant;
use lumen_bridge::{
    Brand, Brightness, Color, CommandKind, Device, DeviceAdapter, EffectDispatcher, EngineConfig,
    Error, GameEvent, LightCommand, LightManager, VirtualAdapter,
};

const WHITE: Color = Color::rgb(255, 255, 255);
const GREEN: Color = Color::rgb(0, 255, 0);

fn lamp(id: &str) -> Device {
    Device::new(id, id, Brand::Govee)
        .with_color(WHITE)
        .with_brightness(Brightness::clamped(80))
}

async fn dispatcher_with(adapter: Arc<VirtualAdapter>) -> EffectDispatcher {
    let mut manager = LightManager::new();
    manager.add_shared_adapter(adapter);
    let dispatcher = EffectDispatcher::new(Arc::new(manager));
    dispatcher.initialize().await.into_result().unwrap();
    dispatcher
}

#[tokio::test]
async fn victory_flashes_green_and_restores_snapshot_fields() {
    let config = EngineConfig::from_json_str(
        r##"{"effects": [{
            "eventType": "match:victory",
            "command": {"type": "setColor", "params": {"color": "#00FF00"}},
            "duration": 5000,
            "priority": 10,
            "restorePreviousState": true
        }]}"##,
    )
    .unwrap();

    let adapter = Arc::new(VirtualAdapter::new("room").with_device(lamp("X")));
    let mut dispatcher = dispatcher_with(adapter.clone()).await;
    for effect in config.effects() {
        dispatcher.add_effect(effect);
    }

    let t0 = Instant::now();
    dispatcher
        .handle_event_at(&GameEvent::new("match:victory"), t0)
        .await;
    let device = adapter.get_device("X").await.unwrap().unwrap();
    assert_eq!(device.color, Some(GREEN));

    adapter.clear_history().await;
    assert!(dispatcher
        .fire_due(t0 + Duration::from_millis(4999))
        .await
        .is_empty());
    let restored = dispatcher.fire_due(t0 + Duration::from_millis(5000)).await;
    assert_eq!(restored.len(), 1);

    let reissued: Vec<LightCommand> = adapter.history().await.executed().cloned().collect();
    assert_eq!(
        reissued,
        vec![
            LightCommand::new("X", CommandKind::SetColor(WHITE)),
            LightCommand::new("X", CommandKind::SetBrightness(80)),
        ]
    );
    let device = adapter.get_device("X").await.unwrap().unwrap();
    assert_eq!(device.color, Some(WHITE));
    assert_eq!(device.brightness, Some(Brightness::clamped(80)));
}

#[tokio::test]
async fn restore_skips_fields_missing_from_snapshot() {
    let adapter = Arc::new(
        VirtualAdapter::new("room").with_device(Device::new("X", "X", Brand::Lifx).with_color(WHITE)),
    );
    let mut dispatcher = dispatcher_with(adapter.clone()).await;
    dispatcher.add_effect(
        lumen_bridge::Effect::new("match:victory", CommandKind::SetColor(GREEN))
            .with_duration(Duration::from_millis(5000))
            .restoring(),
    );

    let t0 = Instant::now();
    dispatcher
        .handle_event_at(&GameEvent::new("match:victory"), t0)
        .await;
    adapter.clear_history().await;
    dispatcher.fire_due(t0 + Duration::from_millis(5000)).await;

    let reissued: Vec<_> = adapter
        .history()
        .await
        .executed()
        .map(|c| c.kind().clone())
        .collect();
    assert_eq!(reissued, vec![CommandKind::SetColor(WHITE)]);
}

#[tokio::test]
async fn brightness_above_range_is_clamped() {
    let adapter = Arc::new(VirtualAdapter::new("room").with_device(lamp("X")));
    let mut manager = LightManager::new();
    manager.add_shared_adapter(adapter.clone());
    manager.initialize().await;

    let cmd: LightCommand = serde_json::from_str(
        r#"{"type": "setBrightness", "deviceId": "X", "params": {"brightness": 150}}"#,
    )
    .unwrap();
    manager.execute_command(&cmd).await.unwrap();

    let device = manager.get_device("X").await.unwrap().unwrap();
    assert_eq!(device.brightness.unwrap().value(), 100);
}

#[tokio::test]
async fn equal_priority_effects_fire_in_registration_order() {
    let adapter = Arc::new(VirtualAdapter::new("room").with_device(lamp("X")));
    let mut dispatcher = dispatcher_with(adapter.clone()).await;
    let first = dispatcher.add_effect(lumen_bridge::Effect::new(
        "player:join",
        CommandKind::SetColor(Color::rgb(1, 1, 1)),
    ));
    dispatcher.add_effect(lumen_bridge::Effect::new(
        "player:join",
        CommandKind::SetColor(Color::rgb(2, 2, 2)),
    ));

    let report = dispatcher.handle_event(&GameEvent::new("player:join")).await;
    assert_eq!(report.effect, Some(first));
    let device = adapter.get_device("X").await.unwrap().unwrap();
    assert_eq!(device.color, Some(Color::rgb(1, 1, 1)));
}

#[tokio::test]
async fn manager_falls_back_past_failing_adapter() {
    let a = Arc::new(VirtualAdapter::new("a").with_device(lamp("shared")));
    let b = Arc::new(VirtualAdapter::new("b").with_device(lamp("only-b")));
    let mut manager = LightManager::new();
    manager.add_shared_adapter(a.clone());
    manager.add_shared_adapter(b.clone());
    manager.initialize().await;
    a.set_offline(true).await;

    manager
        .execute_command(&LightCommand::set_color("only-b", GREEN))
        .await
        .unwrap();
    assert_eq!(
        b.get_device("only-b").await.unwrap().unwrap().color,
        Some(GREEN)
    );

    let err = manager
        .execute_command(&LightCommand::turn_on("shared"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoAdapterHandled { .. }));
}
