use sbexport::codec::{
    decode_base64, encode_base64, strip_magic, utf8_safe_decode, utf8_safe_encode,
};
use sbexport::{
    extract, inject, Error, Export, ExportConfig, ExportDecoder, ExportEncoder, ScriptArchive,
    ScriptMap,
};
use serde_json::{json, Value};

fn sample_tree() -> Value {
    json!({
        "meta": {"name": "Stream Pack", "author": "tester"},
        "data": {
            "actions": [
                {
                    "id": "a1",
                    "name": "Shoutout",
                    "triggers": [{"type": 1}],
                    "subActions": [
                        {"name": "Test", "byteCode": utf8_safe_encode("// first"), "references": []},
                        {"name": "Test", "byteCode": utf8_safe_encode("// second 😀")}
                    ]
                },
                {
                    "id": "a2",
                    "name": "Broken",
                    "subActions": [{"name": "Bad", "byteCode": "***"}]
                }
            ]
        }
    })
}

#[test]
fn test_tree_without_scripts_round_trips() {
    let tree = json!({"name": "plain", "values": [1, 2.5, null, true, "é"], "nested": {"x": {}}});

    let outcome = ExportEncoder::new().encode(&tree, &ScriptMap::new()).unwrap();
    let export = ExportDecoder::new().decode(&outcome.transport).unwrap();

    assert_eq!(outcome.injected, 0);
    assert_eq!(export.tree, tree);
    assert!(export.scripts.is_empty());
}

#[test]
fn test_single_script_round_trip() {
    let mut tree = json!({"name": "Foo", "byteCode": utf8_safe_encode("bar"), "weight": 3});
    let config = ExportConfig::default();

    let scripts = extract(&tree, &config);
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts.source("Foo.cs"), Some("bar"));

    let edited = ScriptMap::from_sources([("Foo.cs", "baz")]).unwrap();
    assert_eq!(inject(&mut tree, &edited, &config), 1);

    assert_eq!(utf8_safe_decode(tree["byteCode"].as_str().unwrap()).unwrap(), "baz");
    assert_eq!(tree["name"], "Foo");
    assert_eq!(tree["weight"], 3);
}

#[test]
fn test_utf8_safety() {
    let encoded = utf8_safe_encode("héllo 😀");
    assert_eq!(utf8_safe_decode(&encoded).unwrap(), "héllo 😀");
}

#[test]
fn test_collision_names_and_skipped_slot() {
    let export = ExportDecoder::new()
        .decode(&ExportEncoder::new().encode_tree(&sample_tree()).unwrap())
        .unwrap();

    let names: Vec<&str> = export.scripts.names().collect();
    assert_eq!(names, vec!["Test.cs", "Test_1.cs"]);
    assert_eq!(export.scripts.source("Test_1.cs"), Some("// second 😀"));

    let stats = export.stats();
    assert_eq!(stats.name, "Stream Pack");
    assert_eq!(stats.actions, 2);
    assert_eq!(stats.scripts, 2);
    assert_eq!(stats.triggers, 1);
}

#[test]
fn test_magic_marker_optional() {
    let transport = ExportEncoder::new().encode_tree(&sample_tree()).unwrap();
    let bytes = decode_base64(&transport).unwrap();
    let (bare, had_magic) = strip_magic(&bytes);
    assert!(had_magic);

    let decoder = ExportDecoder::new();
    let with_marker = decoder.decode(&transport).unwrap();
    let without_marker = decoder.decode(&encode_base64(bare)).unwrap();
    assert_eq!(with_marker, without_marker);
}

#[test]
fn test_missing_script_abort() {
    let template = json!({"actions": [{"subActions": [{"byteCode": "ghost.cs"}]}]});
    let err = ExportEncoder::new()
        .encode_template(&template, &ScriptMap::new())
        .unwrap_err();

    match err {
        Error::MissingScripts(names) => assert_eq!(names, vec!["ghost.cs".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_input() {
    let err = ExportDecoder::new().decode("not-base64!!").unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert_eq!(err.stage().label(), "base64");
}

#[test]
fn test_edit_cycle_keeps_duplicates_apart() {
    let decoder = ExportDecoder::new();
    let encoder = ExportEncoder::new();
    let mut export = decoder.decode(&encoder.encode_tree(&sample_tree()).unwrap()).unwrap();

    export.scripts.set_source("Test.cs", "// first, edited");
    let outcome = encoder.encode_export(&export).unwrap();
    assert_eq!(outcome.injected, 2);

    let again = decoder.decode(&outcome.transport).unwrap();
    assert_eq!(again.scripts.source("Test.cs"), Some("// first, edited"));
    assert_eq!(again.scripts.source("Test_1.cs"), Some("// second 😀"));
    assert_eq!(
        again.tree.pointer("/data/actions/1/subActions/0/byteCode"),
        Some(&json!("***"))
    );
}

#[test]
fn test_edited_tree_then_encode() {
    let decoder = ExportDecoder::new();
    let encoder = ExportEncoder::new();
    let mut export = decoder.decode(&encoder.encode_tree(&sample_tree()).unwrap()).unwrap();

    let mut edited = export.tree.clone();
    edited["meta"]["name"] = json!("Renamed");
    export.replace_tree_json(&edited.to_string()).unwrap();
    assert!(matches!(
        export.replace_tree_json("{"),
        Err(Error::InvalidJsonEdit(_))
    ));

    let again = decoder.decode(&encoder.encode_export(&export).unwrap().transport).unwrap();
    assert_eq!(again.stats().name, "Renamed");
    assert_eq!(again.scripts.len(), 2);
}

fn two_action_export() -> Export {
    let tree = json!({"actions": [
        {"name": "Alpha", "byteCode": utf8_safe_encode("alpha code")},
        {"name": "Beta", "byteCode": utf8_safe_encode("beta code")}
    ]});
    ExportDecoder::new()
        .decode(&ExportEncoder::new().encode_tree(&tree).unwrap())
        .unwrap()
}

fn reencode_with_tree(mut export: Export, tree: Value) -> Export {
    export.replace_tree_json(&tree.to_string()).unwrap();
    let outcome = ExportEncoder::new().encode_export(&export).unwrap();
    ExportDecoder::new().decode(&outcome.transport).unwrap()
}

#[test]
fn test_edited_tree_with_deleted_slot() {
    let mut export = two_action_export();
    export.scripts.set_source("Beta.cs", "beta edited");

    let mut tree = export.tree.clone();
    tree["actions"].as_array_mut().unwrap().remove(0);
    let again = reencode_with_tree(export, tree);

    assert_eq!(again.scripts.len(), 1);
    assert_eq!(again.scripts.source("Beta.cs"), Some("beta edited"));
    assert_eq!(again.scripts.source("Alpha.cs"), None);
}

#[test]
fn test_edited_tree_with_inserted_slot() {
    let mut export = two_action_export();
    export.scripts.set_source("Alpha.cs", "alpha edited");

    let mut tree = export.tree.clone();
    tree["actions"]
        .as_array_mut()
        .unwrap()
        .insert(0, json!({"name": "Gamma", "byteCode": utf8_safe_encode("gamma code")}));
    let again = reencode_with_tree(export, tree);

    let names: Vec<&str> = again.scripts.names().collect();
    assert_eq!(names, vec!["Gamma.cs", "Alpha.cs", "Beta.cs"]);
    assert_eq!(again.scripts.source("Gamma.cs"), Some("gamma code"));
    assert_eq!(again.scripts.source("Alpha.cs"), Some("alpha edited"));
    assert_eq!(again.scripts.source("Beta.cs"), Some("beta code"));
}

#[test]
fn test_edited_tree_with_reordered_slots() {
    let mut export = two_action_export();
    export.scripts.set_source("Alpha.cs", "alpha edited");
    export.scripts.set_source("Beta.cs", "beta edited");

    let mut tree = export.tree.clone();
    tree["actions"].as_array_mut().unwrap().swap(0, 1);
    let again = reencode_with_tree(export, tree);

    let names: Vec<&str> = again.scripts.names().collect();
    assert_eq!(names, vec!["Beta.cs", "Alpha.cs"]);
    assert_eq!(again.scripts.source("Alpha.cs"), Some("alpha edited"));
    assert_eq!(again.scripts.source("Beta.cs"), Some("beta edited"));
    assert_eq!(again.tree["actions"][0]["name"], "Beta");
}

#[test]
fn test_template_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Greeting.cs"), "Console.WriteLine(\"hé\");").unwrap();
    std::fs::write(dir.path().join("readme.md"), "not a script").unwrap();

    let template = json!({"name": "Greeting", "byteCode": "Greeting.cs"});
    let files = ScriptMap::load_dir(dir.path(), ".cs").unwrap();
    let outcome = ExportEncoder::new().encode_template(&template, &files).unwrap();
    assert_eq!(outcome.injected, 1);

    let export = ExportDecoder::new().decode(&outcome.transport).unwrap();
    assert_eq!(export.scripts.source("Greeting.cs"), Some("Console.WriteLine(\"hé\");"));

    let zip_path = dir.path().join("bundle.zip");
    ScriptArchive::from_export(&export, &ExportConfig::default())
        .unwrap()
        .write_zip_file(&zip_path)
        .unwrap();
    let reloaded = ScriptMap::from_zip(std::fs::File::open(&zip_path).unwrap(), ".cs").unwrap();
    assert_eq!(reloaded.source("Greeting.cs"), export.scripts.source("Greeting.cs"));
}
