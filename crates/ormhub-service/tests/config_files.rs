//! Registering plugins from option files on disk

use ormhub_service::{
    load_options_from_path, CollectionScope, HubError, MemoryEngine, OrmHub,
};
use std::io::Write;

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create options file");
    file.write_all(contents.as_bytes()).expect("write options file");
    path
}

#[tokio::test]
async fn test_register_from_toml_and_json_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let shared = write_file(
        &dir,
        "orm.toml",
        r#"
        teardownOnStop = true

        [adapters.memory]
        identity = "sails-memory"

        [connections.primary]
        adapter = "memory"

        [defaults]
        connection = "primary"
        "#,
    );
    let accounts_models = write_file(
        &dir,
        "accounts.json",
        r#"[{ "identity": "user" }, { "identity": "session" }]"#,
    );

    let engine = MemoryEngine::new();
    let mut hub = OrmHub::new(engine.clone());
    let root = hub.root();
    let accounts = hub.create_scope(root, "accounts")?;

    hub.register(root, load_options_from_path(&shared)?)?;
    hub.register(accounts, load_options_from_path(&accounts_models)?)?;
    assert_eq!(hub.collector().teardown_on_stop(), Some(true));

    hub.pre_start().await?;
    let collections = hub.collections(accounts, CollectionScope::Scoped);
    assert_eq!(collections.len(), 2);
    assert_eq!(collections["session"].connection(), "primary");

    hub.post_stop().await?;
    assert_eq!(engine.teardown_count().await, 1);
    Ok(())
}

#[test]
fn test_unsupported_and_missing_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let yaml = write_file(&dir, "orm.yaml", "models: []");

    assert!(matches!(
        load_options_from_path(&yaml),
        Err(HubError::Config { .. })
    ));
    assert!(matches!(
        load_options_from_path(&dir.path().join("absent.toml")),
        Err(HubError::Config { .. })
    ));
}

#[test]
fn test_option_files_keep_key_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let toml = write_file(
        &dir,
        "storage.toml",
        r#"
        [adapters.zeta]
        [adapters.alpha]

        [connections.zz]
        adapter = "zeta"

        [connections.aa]
        adapter = "alpha"
        "#,
    );
    let json = write_file(&dir, "defaults.json", r#"{ "defaults": { "z": 1, "a": 2 } }"#);

    let mut hub = OrmHub::new(MemoryEngine::new());
    let root = hub.root();
    hub.register(root, load_options_from_path(&toml)?)?;
    hub.register(root, load_options_from_path(&json)?)?;

    let collector = hub.collector();
    assert!(collector.adapters().keys().eq(["zeta", "alpha"]));
    assert!(collector.connections().keys().eq(["zz", "aa"]));
    assert!(collector.defaults().keys().eq(["z", "a"]));
    Ok(())
}
