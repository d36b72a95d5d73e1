use std::fs;

use esg_map::{AliasDictionary, AliasRepository};

fn overrides() -> AliasDictionary {
    AliasDictionary::from_json(
        r#"{
            "waste_logs": {"quantity": ["peso liquido", "kg coletados"]},
            "assets": {"tag": ["patrimonio", "plaqueta"]}
        }"#,
    )
    .expect("overrides")
}

#[test]
fn repository_save_and_load() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repo = AliasRepository::new(dir.path()).expect("create repo");

    let path = repo.save("acme-01", &overrides()).expect("save overrides");
    assert!(path.exists());
    assert!(path.to_string_lossy().ends_with("ACME_01_aliases.json"));
    assert!(repo.exists("acme-01"));

    let loaded = repo
        .load("acme-01")
        .expect("load overrides")
        .expect("overrides should exist");
    assert_eq!(loaded, overrides());

    let stored = repo
        .load_stored("acme-01")
        .expect("load stored")
        .expect("stored overrides");
    assert_eq!(stored.company_id, "acme-01");
    assert_eq!(stored.version, "1.0");
    assert!(stored.saved_at.is_some());
}

#[test]
fn repository_missing_company() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repo = AliasRepository::new(dir.path()).expect("create repo");
    assert!(repo.load("nobody").expect("load").is_none());
    assert!(!repo.exists("nobody"));
    assert!(!repo.delete("nobody").expect("delete"));
}

#[test]
fn repository_resolve_layers_overrides() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repo = AliasRepository::new(dir.path()).expect("create repo");
    let base = AliasDictionary::builtin().expect("builtin");

    let untouched = repo.resolve("acme", &base).expect("resolve");
    assert_eq!(untouched, base);

    repo.save("acme", &overrides()).expect("save");
    let merged = repo.resolve("acme", &base).expect("resolve");
    let quantity = &merged.entity("waste_logs").expect("waste_logs")["quantity"];
    assert_eq!(quantity.first().map(String::as_str), Some("quantidade"));
    assert!(quantity.iter().any(|a| a == "kg coletados"));
    assert!(merged.entity("assets").is_some());
    assert_eq!(merged.len(), base.len() + 1);
}

#[test]
fn repository_list_and_delete() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repo = AliasRepository::new(dir.path()).expect("create repo");

    repo.save("zeta", &overrides()).expect("save zeta");
    repo.save("alpha", &overrides()).expect("save alpha");
    fs::write(dir.path().join("broken_aliases.json"), "{not json").expect("write broken");
    fs::write(dir.path().join("README.txt"), "ignored").expect("write other");

    let listed = repo.list().expect("list");
    let companies: Vec<&str> = listed.iter().map(|m| m.company_id.as_str()).collect();
    assert_eq!(companies, vec!["alpha", "zeta"]);
    assert_eq!(listed[0].entity_count, 2);
    assert_eq!(listed[0].alias_count, 4);

    assert!(repo.delete("zeta").expect("delete"));
    assert!(!repo.exists("zeta"));
    assert_eq!(repo.list().expect("list").len(), 1);
}

#[test]
fn repository_creates_nested_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    let nested = dir.path().join("tenants").join("aliases");
    let repo = AliasRepository::new(&nested).expect("create repo");
    assert!(nested.is_dir());
    assert_eq!(repo.base_dir(), nested.as_path());
}

#[test]
fn colliding_company_ids_stay_isolated() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repo = AliasRepository::new(dir.path()).expect("create repo");
    let path = repo.save("acme-01", &overrides()).expect("save acme-01");

    // Same file name, different tenant.
    for other in ["acme_01", "ACME 01"] {
        assert!(repo.load(other).expect("load").is_none(), "{other}");
        assert!(!repo.exists(other), "{other}");
        assert!(!repo.delete(other).expect("delete"), "{other}");
        let error = repo.save(other, &overrides()).expect_err("collision");
        assert!(format!("{error:#}").contains("collides"), "{other}");
    }

    let base = AliasDictionary::builtin().expect("builtin");
    assert_eq!(repo.resolve("acme_01", &base).expect("resolve"), base);

    assert!(path.exists());
    assert!(repo.exists("acme-01"));
    assert!(repo.exists(" acme-01 "));
    repo.save("acme-01", &overrides()).expect("owner can overwrite");
}

#[test]
fn corrupt_file_can_be_replaced() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repo = AliasRepository::new(dir.path()).expect("create repo");
    fs::write(dir.path().join("ACME_aliases.json"), "{not json").expect("write broken");
    assert!(repo.load("acme").is_err());
    repo.save("acme", &overrides()).expect("save over broken file");
    assert_eq!(repo.load("acme").expect("load"), Some(overrides()));
}
