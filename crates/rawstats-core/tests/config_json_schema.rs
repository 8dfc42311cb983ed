use rawstats_core::config_json_schema;

#[test]
fn json_schema_describes_realm_sections() {
    let schema = serde_json::to_value(config_json_schema()).expect("serialize generated schema");

    assert_eq!(schema["title"], "RawStatisticsConfig");
    assert!(schema["properties"]["realms"].is_object());

    let definitions = schema["definitions"]
        .as_object()
        .expect("schema definitions");
    for name in ["RealmConfig", "TableDef", "TableJoin", "FieldDef"] {
        assert!(definitions.contains_key(name), "missing definition {name}");
    }

    let field = &definitions["FieldDef"]["properties"];
    for key in ["tableAlias", "batchExport", "type", "documentation"] {
        assert!(field.get(key).is_some(), "missing field property {key}");
    }
    assert!(
        definitions["RealmConfig"]["properties"].get("name").is_none(),
        "realm name comes from the document key"
    );
}
