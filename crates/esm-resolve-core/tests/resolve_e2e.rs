//! End-to-end resolution against on-disk package fixtures.

use esm_resolve_core::{
    resolve_all_exports, resolve_all_exports_sync, resolve_import, resolve_import_sync, Error,
    ResolveOptions, ResolvedTarget, Resolver,
};
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap()
}

fn file_path(target: &ResolvedTarget) -> PathBuf {
    target.to_file_path().expect("file target")
}

#[test]
fn test_relative_from_nested_referrer() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "proj/x/y/a/b.js", "");
    write(root, "proj/x/y/z.js", "");

    let referrer = root.join("proj/x/y/z.js").display().to_string();
    let target = resolve_import_sync("./a/b.js", Some(&referrer), &ResolveOptions::default()).unwrap();
    assert_eq!(file_path(&target), canonical(&root.join("proj/x/y/a/b.js")));

    let err = resolve_import_sync("./a/b.js", None, &ResolveOptions::default()).unwrap_err();
    assert!(matches!(err, Error::RelativeImportWithoutReferrer { .. }));
}

#[test]
fn test_referrer_as_file_url() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "src/a.js", "");
    write(root, "src/b.js", "");

    let referrer = url::Url::from_file_path(root.join("src/a.js")).unwrap();
    let target =
        resolve_import_sync("./b.js", Some(referrer.as_str()), &ResolveOptions::default()).unwrap();
    assert_eq!(file_path(&target), canonical(&root.join("src/b.js")));
}

#[test]
fn test_missing_package_names_package() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "proj/a.js", "");

    let referrer = root.join("proj/a.js").display().to_string();
    let err = resolve_import_sync(
        "left-pad-never-installed",
        Some(&referrer),
        &ResolveOptions::default(),
    )
    .unwrap_err();
    match err {
        Error::PackageNotFound { package, from } => {
            assert_eq!(package, "left-pad-never-installed");
            assert_eq!(from, referrer);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_string_exports_reject_subpath() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "node_modules/dep/package.json", r#"{"exports": "./index.js"}"#);
    write(root, "node_modules/dep/index.js", "");
    write(root, "node_modules/dep/sub.js", "");
    let referrer = root.join("main.js").display().to_string();
    let options = ResolveOptions::default();

    assert!(resolve_import_sync("dep", Some(&referrer), &options).is_ok());
    let err = resolve_import_sync("dep/sub", Some(&referrer), &options).unwrap_err();
    assert_eq!(err.code(), Some("ERR_PACKAGE_PATH_NOT_EXPORTED"));
    assert!(matches!(err, Error::SubpathNotExported { ref subpath, .. } if subpath == "./sub"));
}

#[test]
fn test_conditions_select_branch() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "node_modules/dual/package.json",
        r#"{"exports": {".": {"import": "./esm.mjs", "require": "./cjs.cjs"}}}"#,
    );
    write(root, "node_modules/dual/esm.mjs", "");
    write(root, "node_modules/dual/cjs.cjs", "");
    let referrer = root.join("main.js").display().to_string();

    let esm = resolve_import_sync("dual", Some(&referrer), &ResolveOptions::default()).unwrap();
    assert!(file_path(&esm).ends_with("esm.mjs"));

    let options = ResolveOptions::default()
        .with_condition("require")
        .with_condition("!import");
    let cjs = resolve_import_sync("dual", Some(&referrer), &options).unwrap();
    assert!(file_path(&cjs).ends_with("cjs.cjs"));
}

#[test]
fn test_main_falls_back_to_index() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "node_modules/stale/package.json", r#"{"main": "./gone.js"}"#);
    write(root, "node_modules/stale/index.js", "");
    write(root, "node_modules/empty/package.json", r#"{"name": "empty"}"#);
    let referrer = root.join("main.js").display().to_string();

    let target =
        resolve_import_sync("stale", Some(&referrer), &ResolveOptions::default()).unwrap();
    assert!(file_path(&target).ends_with("stale/index.js"));

    let err = resolve_import_sync("empty", Some(&referrer), &ResolveOptions::default()).unwrap_err();
    assert!(matches!(err, Error::PackageNotFound { .. }));
}

#[test]
fn test_scoped_package() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "node_modules/@scope/pkg/package.json",
        r#"{"exports": {"./feature": "./lib/feature.js"}}"#,
    );
    write(root, "node_modules/@scope/pkg/lib/feature.js", "");
    let referrer = root.join("main.js").display().to_string();

    let target =
        resolve_import_sync("@scope/pkg/feature", Some(&referrer), &ResolveOptions::default())
            .unwrap();
    assert_eq!(
        file_path(&target),
        canonical(&root.join("node_modules/@scope/pkg/lib/feature.js"))
    );
}

#[cfg(unix)]
#[test]
fn test_symlinked_dependency_is_canonical() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "store/dep/package.json", r#"{"exports": "./index.js"}"#);
    write(root, "store/dep/index.js", "");
    fs::create_dir_all(root.join("app/node_modules")).unwrap();
    std::os::unix::fs::symlink(root.join("store/dep"), root.join("app/node_modules/dep")).unwrap();

    let referrer = root.join("app/main.js").display().to_string();
    let via_link = resolve_import_sync("dep", Some(&referrer), &ResolveOptions::default()).unwrap();
    let direct = resolve_import_sync(
        &root.join("store/dep/index.js").display().to_string(),
        None,
        &ResolveOptions::default(),
    )
    .unwrap();
    assert_eq!(via_link, direct);
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_keeps_package_location() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "shared/impl.js", "");
    fs::create_dir_all(root.join("node_modules/dep")).unwrap();
    std::os::unix::fs::symlink(root.join("shared/impl.js"), root.join("node_modules/dep/index.js"))
        .unwrap();

    let referrer = root.join("main.js").display().to_string();
    let target = resolve_import_sync("dep", Some(&referrer), &ResolveOptions::default()).unwrap();
    assert_eq!(
        file_path(&target),
        canonical(&root.join("node_modules/dep")).join("index.js")
    );
}

#[test]
fn test_malformed_exports_do_not_fall_back() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "node_modules/dep/package.json",
        r##"{"exports": {".": "./index.js", "#bad": "./x.js"}}"##,
    );
    write(root, "node_modules/dep/index.js", "");
    write(root, "node_modules/dep/secret.js", "");
    let referrer = root.join("main.js").display().to_string();
    let options = ResolveOptions::default();

    for specifier in ["dep", "dep/secret.js"] {
        let err = resolve_import_sync(specifier, Some(&referrer), &options).unwrap_err();
        assert!(
            matches!(err, Error::InvalidSubpathKey { field: "exports", .. }),
            "{specifier}: {err}"
        );
    }

    let err = resolve_all_exports_sync(&root.join("node_modules/dep/package.json"), &options)
        .unwrap_err();
    assert!(err.is_structural());
}

#[test]
fn test_malformed_inner_manifest_still_governs() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "package.json", r##"{"imports": {"#x": "./outer-x.js"}}"##);
    write(root, "outer-x.js", "");
    write(
        root,
        "inner/package.json",
        r##"{"exports": {"./a": {"import": 5}}, "imports": {"#x": "./inner-x.js"}}"##,
    );
    write(root, "inner/inner-x.js", "");
    write(root, "inner/main.js", "");

    let referrer = root.join("inner/main.js").display().to_string();
    let err = resolve_import_sync("#x", Some(&referrer), &ResolveOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidTarget { .. }), "{err}");
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_terminates() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "node_modules/a/package.json", r#"{"exports": {"./*": "./*.js"}}"#);
    write(root, "node_modules/a/x.js", "");
    std::os::unix::fs::symlink(root.join("node_modules"), root.join("node_modules/a/loop")).unwrap();

    let all = resolve_all_exports_sync(
        &root.join("node_modules/a/package.json"),
        &ResolveOptions::default(),
    )
    .unwrap();
    assert!(all.contains_key("./x"));
}

#[test]
#[serial]
fn test_bare_without_referrer_uses_process_cwd() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "node_modules/here/index.js", "");

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(root).unwrap();
    let result = resolve_import_sync("here", None, &ResolveOptions::default());
    std::env::set_current_dir(previous).unwrap();

    assert_eq!(
        file_path(&result.unwrap()),
        canonical(&root.join("node_modules/here/index.js"))
    );
}

#[test]
fn test_options_file_drives_conditions() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "node_modules/env/package.json",
        r#"{"exports": {"browser": "./browser.js", "default": "./node.js"}}"#,
    );
    write(root, "node_modules/env/browser.js", "");
    write(root, "node_modules/env/node.js", "");
    write(root, "options.json", r#"{"conditions": ["browser"]}"#);

    let options = ResolveOptions::from_json_file(&root.join("options.json")).unwrap();
    let referrer = root.join("main.js").display().to_string();
    let target = Resolver::new().resolve("env", Some(&referrer), &options).unwrap();
    assert!(file_path(&target).ends_with("browser.js"));
}

#[tokio::test]
async fn test_async_and_sync_agree() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "node_modules/lib/package.json",
        r#"{"exports": {".": "./index.js", "./utils/*": "./src/utils/*.js"}}"#,
    );
    write(root, "node_modules/lib/index.js", "");
    write(root, "node_modules/lib/src/utils/a.js", "");
    write(root, "node_modules/lib/src/utils/b/c.js", "");
    let referrer = root.join("main.js").display().to_string();
    let options = ResolveOptions::default();

    for specifier in ["lib", "lib/utils/a", "lib/utils/b/c", "node:fs"] {
        assert_eq!(
            resolve_import(specifier, Some(&referrer), &options).await.unwrap(),
            resolve_import_sync(specifier, Some(&referrer), &options).unwrap(),
            "{specifier}"
        );
    }

    let manifest = root.join("node_modules/lib/package.json");
    let all = resolve_all_exports(&manifest, &options).await.unwrap();
    assert_eq!(all, resolve_all_exports_sync(&manifest, &options).unwrap());
    assert_eq!(
        all.keys().map(String::as_str).collect::<Vec<_>>(),
        vec![".", "./utils/a", "./utils/b/c"]
    );
}
