// tests/config_load.rs
use portfolio_board::config::site::ENV_CONFIG_PATH;
use portfolio_board::SiteConfig;
use std::{env, fs};

#[test]
fn explicit_file_is_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("site.toml");
    fs::write(
        &p,
        r#"
[backend]
provider = "  Firebase "
demo_mode = false

[document_store]
database_url = "https://demo-db.firebaseio.com/"
api_key = "k"

[relational_store]
poll_interval_secs = 0

[publish]
owner = "someone"
repo = "portfolio"
"#,
    )
    .unwrap();

    let cfg = SiteConfig::load_from_file(&p).unwrap();
    assert_eq!(cfg.backend.provider, "firebase");
    assert!(!cfg.backend.demo_mode);
    assert_eq!(cfg.document_store.database_url, "https://demo-db.firebaseio.com");
    assert_eq!(cfg.relational_store.poll_interval_secs, 5);
    assert_eq!(cfg.publish.path, "content.json");
    assert_eq!(cfg.admin.secret, "admin12");
}

#[serial_test::serial]
#[test]
fn env_markers_resolve_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("site.json");
    fs::write(
        &p,
        r#"{"relational_store":{"url":"https://x.supabase.co","anon_key":"ENV"},
            "publish":{"token":"env"}}"#,
    )
    .unwrap();

    env::set_var("SUPABASE_ANON_KEY", "anon-from-env");
    env::remove_var("GITHUB_TOKEN");
    let cfg = SiteConfig::load_from_file(&p).unwrap();
    assert_eq!(cfg.relational_store.anon_key, "anon-from-env");
    // Missing token is tolerated.
    assert!(cfg.publish.token.is_none());

    env::remove_var("SUPABASE_ANON_KEY");
    assert!(SiteConfig::load_from_file(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // Nothing on disk: demo defaults.
    let cfg = SiteConfig::load_default().unwrap();
    assert!(cfg.backend.demo_mode);

    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("site.toml"),
        "[backend]\nprovider = \"supabase\"\ndemo_mode = false\n",
    )
    .unwrap();
    let cfg = SiteConfig::load_default().unwrap();
    assert!(!cfg.backend.demo_mode);

    // Env path wins over ./config.
    let p_env = tmp.path().join("other.json");
    fs::write(&p_env, r#"{"admin":{"secret":"s3"}}"#).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = SiteConfig::load_default().unwrap();
    assert_eq!(cfg.admin.secret, "s3");
    assert!(cfg.backend.demo_mode);

    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(SiteConfig::load_default().is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}
