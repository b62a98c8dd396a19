use serde_json::json;

use super::*;

#[test]
fn test_registers_every_audited_event() {
    let bus = EventBus::new();
    let plugin = AuditLogPlugin::default();

    plugin.register_events(&bus).unwrap();

    assert_eq!(bus.listener_count(None), AUDITED_EVENTS.len());
    for event in AUDITED_EVENTS {
        assert_eq!(bus.listener_count(Some(event)), 1, "{event}");
    }
    assert!(plugin.provider().is_none());
}

#[test]
fn test_trail_records_payloads_in_order() {
    let bus = EventBus::new();
    let trail = AuditTrail::new();
    AuditLogPlugin::with_trail(trail.clone()).register_events(&bus).unwrap();

    bus.emit(ORDER_CREATED, &[json!(1), json!("vps_provider")]);
    bus.emit(INVOICE_PAID, &[json!(1), json!(1)]);
    bus.emit("unrelated::Event", &[]);

    let records = trail.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].event, ORDER_CREATED);
    assert_eq!(records[0].args, vec![json!(1), json!("vps_provider")]);
    assert_eq!(trail.of(INVOICE_PAID).len(), 1);
    assert!(trail.of(ORDER_FAILED).is_empty());
}

#[test]
fn test_factory_plugin_starts_with_empty_trail() {
    let plugin = AuditLogPlugin::default();
    assert!(plugin.trail().is_empty());

    let bus = EventBus::new();
    plugin.register_events(&bus).unwrap();
    bus.emit(APP_LOAD, &[json!(["audit_log"])]);

    assert_eq!(plugin.trail().len(), 1);
    assert_eq!(factory().identifier(), IDENTIFIER);
}
