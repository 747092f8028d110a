use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use quotedesk_cli::commands::catalog::CatalogCommand;
use quotedesk_cli::commands::memo::MemoCommand;
use quotedesk_cli::commands::rules::RulesCommand;
use quotedesk_cli::commands::sync::SyncCommand;
use quotedesk_cli::commands::{catalog, memo, migrate, quote_request, reset, rules, show, sync};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_device(|_| {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn invalid_config_is_reported_before_touching_storage() {
    with_env(&[("QUOTEDESK_STORAGE_DATABASE_URL", "postgres://elsewhere")], || {
        let result = show::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn fresh_device_shows_builtin_defaults() {
    with_device(|_| {
        let payload = parse_payload(&show::run().output);

        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["catalog"].as_array().map(Vec::len), Some(11));
        assert_eq!(payload["data"]["documents"].as_array().map(Vec::len), Some(0));
        assert!(payload["data"]["rule_text"]
            .as_str()
            .is_some_and(|text| text.contains("Microwave")));
    });
}

#[test]
fn catalog_edits_persist_between_commands() {
    with_device(|_| {
        let added = parse_payload(&catalog::run(CatalogCommand::Add).output);
        let id = added["data"]["id"].as_str().expect("new id").to_string();

        let category = CatalogCommand::Category { id: id.clone(), category: "MICROWAVE".into() };
        let moved = parse_payload(&catalog::run(category).output);
        assert_eq!(moved["status"], "ok");
        assert_eq!(moved["data"]["name"], "NeoChef Microwave");
        let plans = serde_json::json!(["36 months", "60 months"]);
        assert_eq!(moved["data"]["supportedPlans"], plans);

        let rejected = catalog::run(CatalogCommand::Plans {
            id: id.clone(),
            plans: vec!["84".into()],
            unchecked: false,
        });
        assert_eq!(rejected.exit_code, 6);
        assert_eq!(parse_payload(&rejected.output)["error_class"], "rejected");

        let listed = parse_payload(&catalog::run(CatalogCommand::List).output);
        let items = listed["data"].as_array().expect("items");
        assert_eq!(items.len(), 12);
        assert_eq!(items[11]["id"], id.as_str());
        assert_eq!(items[11]["category"], "MICROWAVE");
    });
}

#[test]
fn unknown_category_is_rejected() {
    with_device(|_| {
        let result = catalog::run(CatalogCommand::Category {
            id: "wp-1".into(),
            category: "TOASTER".into(),
        });
        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "rejected");
    });
}

#[test]
fn memo_upload_keeps_only_accepted_media_type() {
    with_device(|dir| {
        let pdf = dir.join("april-promo.pdf");
        let png = dir.join("banner.png");
        fs::write(&pdf, b"%PDF-1.7 promo").expect("write pdf");
        fs::write(&png, b"\x89PNG").expect("write png");

        let added = parse_payload(&memo::run(MemoCommand::Add { files: vec![pdf, png] }).output);
        assert_eq!(added["status"], "ok");

        let listed = parse_payload(&memo::run(MemoCommand::List).output);
        let documents = listed["data"].as_array().expect("documents");
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["name"], "april-promo.pdf");
        assert_eq!(documents[0]["is_system"], false);

        let removed = parse_payload(&memo::run(MemoCommand::Remove { index: 0 }).output);
        assert_eq!(removed["status"], "ok");
        let out_of_range = memo::run(MemoCommand::Remove { index: 0 });
        assert_eq!(out_of_range.exit_code, 6);
    });
}

#[test]
fn export_then_import_restores_configuration_on_a_reset_device() {
    with_device(|dir| {
        let custom = RulesCommand::Set { text: Some("bundle WP + AP: RM10 off".into()), file: None };
        rules::run(custom);
        let export_path = dir.join("backup.json");
        let export = SyncCommand::Export { out: Some(export_path.clone()) };
        let exported = parse_payload(&sync::run(export).output);
        assert_eq!(exported["status"], "ok");

        let reset_result = parse_payload(&reset::run(true).output);
        assert_eq!(reset_result["status"], "ok");
        let after_reset = parse_payload(&rules::run(RulesCommand::Show).output);
        assert_ne!(after_reset["data"], "bundle WP + AP: RM10 off");

        let imported =
            parse_payload(&sync::run(SyncCommand::Import { file: export_path }).output);
        assert_eq!(imported["status"], "ok");
        assert_eq!(imported["data"], serde_json::json!(["catalog", "rule text", "documents"]));

        let restored = parse_payload(&rules::run(RulesCommand::Show).output);
        assert_eq!(restored["data"], "bundle WP + AP: RM10 off");
    });
}

#[test]
fn export_defaults_to_dated_file_in_export_dir() {
    with_device(|dir| {
        let exported = parse_payload(&sync::run(SyncCommand::Export { out: None }).output);
        let path = exported["data"]["path"].as_str().expect("path").to_string();

        assert!(Path::new(&path).starts_with(dir));
        let file_name = Path::new(&path).file_name().expect("file name").to_string_lossy();
        assert!(file_name.starts_with("QuoteDesk_MasterConfig_"));
        assert!(file_name.ends_with(".json"));
    });
}

#[test]
fn sync_code_applies_partial_updates_only() {
    with_device(|_| {
        let apply = SyncCommand::ApplyCode { code: r#"{"masterKnowledge":"abc"}"#.into() };
        let applied = parse_payload(&sync::run(apply).output);
        assert_eq!(applied["data"], serde_json::json!(["rule text"]));

        let shown = parse_payload(&show::run().output);
        assert_eq!(shown["data"]["rule_text"], "abc");
        assert_eq!(shown["data"]["catalog"].as_array().map(Vec::len), Some(11));

        let code = parse_payload(&sync::run(SyncCommand::Code).output);
        let decoded: Value =
            serde_json::from_str(code["data"].as_str().expect("code")).expect("code is JSON");
        assert_eq!(decoded["masterKnowledge"], "abc");
    });
}

#[test]
fn malformed_sync_code_is_rejected() {
    with_device(|_| {
        let result = sync::run(SyncCommand::ApplyCode { code: "not a payload".into() });
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "rejected");
    });
}

#[test]
fn reset_requires_confirmation() {
    with_device(|_| {
        let result = reset::run(false);
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "confirmation_required");
    });
}

#[test]
fn quote_request_attaches_documents_and_rules() {
    with_device(|dir| {
        let pdf = dir.join("price-list.pdf");
        fs::write(&pdf, b"%PDF").expect("write pdf");
        memo::run(MemoCommand::Add { files: vec![pdf] });

        let order_path = dir.join("order.json");
        fs::write(
            &order_path,
            r#"{
                "customerType": "Existing",
                "lines": [{
                    "category": "WP",
                    "name": "PuriCare Self-Service",
                    "model": "WD518AN (Navy)",
                    "quantity": 2,
                    "contract": "84 months"
                }],
                "plan": "Subscribe",
                "promotion": "",
                "additionalContext": "",
                "wantsFullSettlement": true,
                "language": "EN"
            }"#,
        )
        .expect("write order");

        let payload = parse_payload(&quote_request::run(&order_path).output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["attachments"][0]["data"], "JVBERg==");
        assert_eq!(payload["data"]["fullSettlement"], true);
        assert_eq!(
            payload["data"]["lineItems"][0],
            "2x PuriCare Self-Service [WD518AN (Navy)] for 84 months"
        );
    });
}

#[test]
fn quote_request_rejects_contract_the_product_does_not_offer() {
    with_device(|dir| {
        let order_path = dir.join("order.json");
        fs::write(
            &order_path,
            r#"{
                "customerType": "New",
                "lines": [{
                    "category": "TV",
                    "name": "OLED evo C3",
                    "model": "OLED55C3PSA",
                    "quantity": 0,
                    "contract": "84 months"
                }],
                "plan": "Subscribe",
                "promotion": "",
                "additionalContext": "",
                "wantsFullSettlement": false,
                "language": "EN"
            }"#,
        )
        .expect("write order");

        let result = quote_request::run(&order_path);

        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "rejected");
    });
}

#[test]
fn shipped_defaults_payload_seeds_system_documents() {
    with_device(|dir| {
        let payload_path = dir.join("branch7-defaults.json");
        fs::write(
            &payload_path,
            r#"{
                "catalog": [{
                    "id": "mw-9",
                    "category": "MICROWAVE",
                    "name": "NeoChef Compact",
                    "models": ["MS2336GIB"],
                    "supportedPlans": ["36 months", "60 months"]
                }],
                "masterKnowledge": "Branch 7 rules",
                "memos": [{
                    "name": "price-list.pdf",
                    "base64": "data:application/pdf;base64,JVBERg==",
                    "mimeType": "application/pdf"
                }]
            }"#,
        )
        .expect("write payload");
        env::set_var("QUOTEDESK_DEFAULTS_PAYLOAD_PATH", &payload_path);

        let shown = parse_payload(&show::run().output);
        assert_eq!(shown["status"], "ok");
        assert_eq!(shown["data"]["catalog"][0]["name"], "NeoChef Compact");
        assert_eq!(shown["data"]["rule_text"], "Branch 7 rules");
        assert_eq!(shown["data"]["documents"][0]["name"], "price-list.pdf");
        assert_eq!(shown["data"]["documents"][0]["is_system"], true);

        let removal = memo::run(MemoCommand::Remove { index: 0 });
        assert_eq!(removal.exit_code, 6);

        let upload = dir.join("price-list.pdf");
        fs::write(&upload, b"%PDF-1.7 local copy").expect("write upload");
        memo::run(MemoCommand::Add { files: vec![upload] });

        let listed = parse_payload(&memo::run(MemoCommand::List).output);
        let documents = listed["data"].as_array().expect("documents");
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["is_system"], true);

        let reset_result = parse_payload(&reset::run(true).output);
        assert_eq!(reset_result["status"], "ok");
        let after_reset = parse_payload(&rules::run(RulesCommand::Show).output);
        assert_eq!(after_reset["data"], "Branch 7 rules");
    });
}

#[test]
fn unreadable_defaults_payload_is_a_configuration_error() {
    with_device(|dir| {
        let payload_path = dir.join("broken-defaults.json");
        fs::write(&payload_path, "not json").expect("write payload");
        env::set_var("QUOTEDESK_DEFAULTS_PAYLOAD_PATH", &payload_path);

        let result = show::run();

        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

/// Runs `test_fn` against a fresh on-disk device store.
fn with_device(test_fn: impl FnOnce(&Path)) {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("device.db").display());
    let export_dir = dir.path().display().to_string();
    with_env(
        &[
            ("QUOTEDESK_STORAGE_DATABASE_URL", url.as_str()),
            ("QUOTEDESK_SYNC_EXPORT_DIR", export_dir.as_str()),
        ],
        || test_fn(dir.path()),
    );
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "QUOTEDESK_STORAGE_DATABASE_URL",
        "QUOTEDESK_STORAGE_MAX_CONNECTIONS",
        "QUOTEDESK_STORAGE_TIMEOUT_SECS",
        "QUOTEDESK_DOCUMENTS_ACCEPTED_MEDIA_TYPE",
        "QUOTEDESK_SYNC_EXPORT_DIR",
        "QUOTEDESK_SYNC_EXPORT_PREFIX",
        "QUOTEDESK_DEFAULTS_PAYLOAD_PATH",
        "QUOTEDESK_LOGGING_LEVEL",
        "QUOTEDESK_LOGGING_FORMAT",
        "QUOTEDESK_LOG_LEVEL",
        "QUOTEDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_fn));

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }

    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
}
