use mf_domain::config::{Config, ConfigSeverity, PriorityTier};

#[test]
fn default_state_path_is_data_state() {
    let config = Config::default();
    assert_eq!(config.storage.state_path, "./data/state");
}

#[test]
fn default_warning_threshold_is_80_percent() {
    let config = Config::default();
    assert_eq!(config.governor.warning_threshold, 0.8);
    assert!(config.governor.fallback_enabled);
}

#[test]
fn empty_config_validates_clean() {
    let issues = Config::default().validate();
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn full_config_parses() {
    let toml_str = r#"
[storage]
state_path = "/var/lib/museforge"

[limits.models.gpt-4]
daily_limit = 50
hourly_limit = 10
token_limit = 8000

[limits.models.mistral-large]
daily_limit = 100
hourly_limit = 20

[limits.tiers]
high = ["gpt-4"]
medium = ["mistral-large"]
unlimited = ["ollama/llama3"]

[governor]
warning_threshold = 0.9
fallback_enabled = false
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.storage.state_path, "/var/lib/museforge");
    assert_eq!(config.limits.models["gpt-4"].daily_limit, 50);
    assert_eq!(config.limits.models["mistral-large"].token_limit, 0);
    assert_eq!(config.limits.tiers.tier_of("gpt-4"), Some(PriorityTier::High));
    assert_eq!(config.governor.warning_threshold, 0.9);
    assert!(!config.governor.fallback_enabled);
    assert!(config.validate().is_empty());
}

#[test]
fn from_toml_str_rejects_bad_toml() {
    assert!(Config::from_toml_str("limits = nonsense").is_err());
}

#[test]
fn validate_flags_empty_state_path() {
    let config: Config = toml::from_str("[storage]\nstate_path = \"\"").unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.severity == ConfigSeverity::Error && i.field == "storage.state_path"));
}

#[test]
fn validate_flags_out_of_range_threshold() {
    let config: Config = toml::from_str("[governor]\nwarning_threshold = 1.5").unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.severity == ConfigSeverity::Error && i.field == "governor.warning_threshold"));
}

#[test]
fn validate_warns_on_tierless_model() {
    let toml_str = r#"
[limits.models.orphan]
daily_limit = 5
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.severity == ConfigSeverity::Warning && i.field == "limits.models.orphan"));
}

#[test]
fn validate_warns_on_limitless_tier_member() {
    let toml_str = r#"
[limits.tiers]
high = ["ghost"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.severity == ConfigSeverity::Warning && i.message.contains("ghost")));
}

#[test]
fn validate_skips_limitless_unlimited_members() {
    let toml_str = r#"
[limits.tiers]
unlimited = ["ollama/llama3"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.validate().is_empty());
}

#[test]
fn validate_warns_on_duplicate_tier_membership() {
    let toml_str = r#"
[limits.models.shared]
daily_limit = 5
hourly_limit = 1

[limits.tiers]
high = ["shared"]
low = ["shared"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.message.contains("more than one tier")));
}

#[test]
fn config_error_display_includes_severity_tag() {
    let config: Config = toml::from_str("[storage]\nstate_path = \"\"").unwrap();
    let issues = config.validate();
    let rendered = issues[0].to_string();
    assert!(rendered.starts_with("[ERROR] storage.state_path:"));
}
