use serde::Serialize;
use serde_json::{json, Value};
use crate::config::Config;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Switch,
    Text,
    Secret,
    Number,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub model: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

/// Settings form rendered by a front end, plus the values it starts from
#[derive(Debug, Clone, Serialize)]
pub struct ConfigForm {
    pub fields: Vec<FormField>,
    pub note: &'static str,
    pub defaults: Value,
}

fn field(model: &'static str, label: &'static str, kind: FieldKind, placeholder: Option<&'static str>) -> FormField {
    FormField { model, label, kind, placeholder }
}

pub fn config_form() -> ConfigForm {
    use FieldKind::*;

    let fields = vec![
        field("enable", "Enable sync", Switch, None),
        field("private", "Only visible to me on Douban", Switch, None),
        field("only_movies", "Movies only", Switch, None),
        field("trakt_username", "Trakt username", Text, Some("e.g. ialex-cube")),
        field(
            "trakt_client_id",
            "Trakt Client ID",
            Text,
            Some("Create an app at trakt.tv/oauth/applications"),
        ),
        field("cron", "Schedule (cron)", Text, Some("Default 0 2 * * * (02:00 daily)")),
        field("douban_cookie", "Douban cookie", Secret, Some("Leave empty to read cookie_file")),
        field("max_sync_count", "Max items per run", Number, Some("0 = unlimited")),
    ];

    ConfigForm {
        fields,
        note: "Reading public Trakt ratings needs a Client ID from https://trakt.tv/oauth/applications. \
               The Douban cookie is used to mark titles as watched and submit the star rating.",
        defaults: form_values(&Config::default()),
    }
}

/// Current values of the form-backed options
pub fn form_values(config: &Config) -> Value {
    json!({
        "enable": config.enable,
        "trakt_username": config.trakt_username,
        "trakt_client_id": config.trakt_client_id,
        "douban_cookie": config.douban_cookie,
        "private": config.private,
        "only_movies": config.only_movies,
        "max_sync_count": config.max_sync_count,
        "cron": config.cron,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_a_default() {
        let form = config_form();
        for field in &form.fields {
            assert!(form.defaults.get(field.model).is_some(), "no default for {}", field.model);
        }
        assert_eq!(form.defaults["cron"], "0 2 * * *");
        assert_eq!(form.defaults["private"], true);
        assert_eq!(form.defaults["max_sync_count"], 0);
    }

    #[test]
    fn test_cookie_field_is_secret() {
        let form = config_form();
        let cookie = form.fields.iter().find(|f| f.model == "douban_cookie").unwrap();
        assert_eq!(cookie.kind, FieldKind::Secret);
        let json = serde_json::to_value(cookie).unwrap();
        assert_eq!(json["kind"], "secret");
    }
}
