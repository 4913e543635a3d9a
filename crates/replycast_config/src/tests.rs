use super::settings::Settings;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.broker.subscriber_buffer, 64);
    assert_eq!(settings.broker.max_delivery_failures, 0);
    assert_eq!(settings.stream.heartbeat_interval_secs, 30);
    assert_eq!(settings.notify.webhook_url, None);
    assert_eq!(settings.log.level, "info");
}
