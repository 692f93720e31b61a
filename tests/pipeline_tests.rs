//! End-to-end principal pipeline tests
//!
//! Exercises the public API the way a host broker would:
//! - config load + validation (fatal misconfiguration at startup)
//! - SASL and TLS events through shortening, extraction, and group lookup
//! - fail-open degradation and the composite matching contract

use std::collections::HashMap;
use std::io::Write;

use broker_principal::config::{GroupCacheConfig, GroupMappingConfig};
use broker_principal::realm::StaticRealmSource;
use broker_principal::{
    AuthEvent, CompositePrincipal, Error, PrincipalBuilder, PrincipalConfig, Principal,
};

fn static_config(mappings: &[(&str, &str)]) -> PrincipalConfig {
    let mut options = HashMap::new();
    for (user, groups) in mappings {
        options.insert(format!("provider.{user}"), (*groups).to_string());
    }
    PrincipalConfig {
        group_mapping: GroupMappingConfig {
            provider: "static".to_string(),
            options,
        },
        ..PrincipalConfig::default()
    }
}

#[tokio::test]
async fn sasl_pipeline_shortens_resolves_and_composes() {
    let mut config = static_config(&[("alice", "eng,wheel")]);
    config.shortening_rules = vec!["DEFAULT".to_string()];

    let builder = PrincipalBuilder::with_realm_source(
        &config,
        &StaticRealmSource("CORP.EXAMPLE.COM".to_string()),
    )
    .unwrap();

    let principal = builder
        .build(&AuthEvent::Sasl {
            authorization_id: "Alice@CORP.EXAMPLE.COM".to_string(),
        })
        .await;

    // Primary is the shortened name; members are self + groups, in order
    assert_eq!(principal.primary(), &Principal::user("alice"));
    assert_eq!(
        principal.members(),
        &[
            Principal::user("alice"),
            Principal::group("eng"),
            Principal::group("wheel"),
        ]
    );
    // Every group entry carries the Group kind, the self entry the User kind
    assert!(principal.members()[1..]
        .iter()
        .all(|m| m.kind == broker_principal::GROUP_KIND));
}

#[tokio::test]
async fn tls_pipeline_uses_configured_subject_attribute() {
    let mut config = static_config(&[("svc-backup", "backup-operators")]);
    config.cert_attribute = "OU".to_string();

    let builder = PrincipalBuilder::from_config(&config).unwrap();

    let principal = builder
        .build(&AuthEvent::Tls {
            subject_dn: "CN=host01.example.com,OU=svc-backup,DC=example".to_string(),
        })
        .await;

    assert_eq!(principal.primary(), &Principal::user("svc-backup"));
    assert!(principal.contains(&Principal::group("backup-operators")));
}

#[tokio::test]
async fn malformed_subject_still_yields_a_principal() {
    let config = static_config(&[]);
    let builder = PrincipalBuilder::from_config(&config).unwrap();

    let principal = builder
        .build(&AuthEvent::Tls {
            subject_dn: "not a dn".to_string(),
        })
        .await;

    assert_eq!(principal.primary(), &Principal::user("not a dn"));
    assert_eq!(principal.members().len(), 1);
}

#[tokio::test]
async fn unknown_user_degrades_to_username_only() {
    // The static provider knows nobody, so bob gets no groups - and no error
    let config = static_config(&[]);
    let builder = PrincipalBuilder::from_config(&config).unwrap();

    let principal = builder
        .build(&AuthEvent::Sasl {
            authorization_id: "bob".to_string(),
        })
        .await;

    assert_eq!(principal.members(), &[Principal::user("bob")]);
}

#[tokio::test]
async fn authorization_matching_contract() {
    let config = static_config(&[("alice", "eng"), ("bob", "eng"), ("mallory", "guests")]);
    let builder = PrincipalBuilder::from_config(&config).unwrap();

    let alice = builder
        .build(&AuthEvent::Sasl {
            authorization_id: "alice".to_string(),
        })
        .await;
    let bob = builder
        .build(&AuthEvent::Sasl {
            authorization_id: "bob".to_string(),
        })
        .await;
    let mallory = builder
        .build(&AuthEvent::Sasl {
            authorization_id: "mallory".to_string(),
        })
        .await;

    // Shared group → match; disjoint members → no match
    assert!(alice.matches(&bob));
    assert!(!alice.matches(&mallory));

    // A policy written against the plain group matches any carrier
    assert!(alice.contains(&Principal::group("eng")));
    assert!(bob.contains(&Principal::group("eng")));

    // A policy written against the bare user still matches (self-inclusive)
    let policy = CompositePrincipal::solo(Principal::user("alice"));
    assert!(alice.matches(&policy));
}

#[tokio::test]
async fn group_cache_is_transparent_to_the_pipeline() {
    let mut config = static_config(&[("alice", "eng")]);
    config.cache = GroupCacheConfig {
        enabled: true,
        ttl_secs: 300,
        max_entries: 8,
    };
    let builder = PrincipalBuilder::from_config(&config).unwrap();

    let first = builder
        .build(&AuthEvent::Sasl {
            authorization_id: "alice".to_string(),
        })
        .await;
    let second = builder
        .build(&AuthEvent::Sasl {
            authorization_id: "alice".to_string(),
        })
        .await;

    assert_eq!(first, second);
}

#[test]
fn startup_rejects_unregistered_provider() {
    let config = PrincipalConfig {
        group_mapping: GroupMappingConfig {
            provider: "corporate-ldap".to_string(),
            options: HashMap::new(),
        },
        ..PrincipalConfig::default()
    };

    // validate() and builder construction both refuse the configuration
    assert!(matches!(config.validate(), Err(Error::Config(_))));
    assert!(matches!(
        PrincipalBuilder::from_config(&config),
        Err(Error::Config(_))
    ));
}

#[test]
fn config_loads_from_yaml_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(
        br#"
cert_attribute: CN
shortening_rules:
  - "DEFAULT CORP.EXAMPLE.COM"
group_mapping:
  provider: static
  options:
    provider.alice: "eng"
"#,
    )
    .unwrap();

    let config = PrincipalConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.group_mapping.provider, "static");
    assert_eq!(config.shortening_rules.len(), 1);
}

#[test]
fn config_load_rejects_bad_rules_at_startup() {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(b"shortening_rules:\n  - \"RULE:broken\"\n")
        .unwrap();

    assert!(matches!(
        PrincipalConfig::load(Some(file.path())),
        Err(Error::Config(_))
    ));
}
