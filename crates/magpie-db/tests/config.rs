use magpie_db::ConnectionConfig;

#[test]
fn deserializes_from_json() {
    let json = r#"{
        "id": "read-replica",
        "host": "db2.internal",
        "port": 3307,
        "database": "shop",
        "username": "app",
        "password": "secret",
        "charset": "utf8mb4",
        "allow": ["user", "order"]
    }"#;

    let config: ConnectionConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.id.as_deref(), Some("read-replica"));
    assert_eq!(config.port, Some(3307));
    assert_eq!(config.allow, ["user", "order"]);
    assert_eq!(config.source(), "db2.internal");
}

#[test]
fn missing_fields_default() {
    let config: ConnectionConfig = serde_json::from_str(r#"{"database": "shop"}"#).unwrap();
    assert_eq!(config.id, None);
    assert!(config.allow.is_empty());
    assert_eq!(config.source(), "");
}

#[test]
fn round_trips_through_json() {
    let config = ConnectionConfig::new("shop")
        .id("main")
        .socket("/run/mysqld/mysqld.sock")
        .credentials("app", "secret")
        .option("ssl-mode", "required");

    let json = serde_json::to_string(&config).unwrap();
    let back: ConnectionConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
