//! Bridge to the host application the console is embedded in.
//!
//! Every call is best-effort. Hosts that cannot honour a request log it at
//! debug level and carry on.

use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};

use serde_json::json;

use crate::auth::HostUser;
use crate::fields::Theme;

/// Environment variable carrying the raw init data string.
pub const INIT_DATA_ENV: &str = "STAFFDESK_INIT_DATA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    Light,
    Medium,
    Heavy,
    Success,
    Error,
    Warning,
    Selection,
}

pub trait HostBridge {
    fn is_available(&self) -> bool;
    fn ready(&mut self);
    fn expand(&mut self);
    /// Raw `key=value&...` launch parameters.
    fn init_data(&self) -> Option<String>;
    fn theme(&self) -> Theme;
    fn set_theme(&mut self, theme: Theme);
    fn set_back_button(&mut self, visible: bool);
    fn set_main_button(&mut self, label: Option<&str>);
    fn haptic(&mut self, kind: Haptic);

    /// The user the host launched us for, if the init data names one.
    fn user(&self) -> Option<HostUser> {
        self.init_data().and_then(|raw| parse_init_data(&raw).user)
    }
}

/// Decoded launch parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitData {
    pub user: Option<HostUser>,
    pub auth_date: Option<i64>,
    pub params: BTreeMap<String, String>,
}

/// Decode a url-encoded init data string. Malformed pairs are skipped.
pub fn parse_init_data(raw: &str) -> InitData {
    let mut data = InitData::default();
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = match urlencoding::decode(&value.replace('+', " ")) {
            Ok(v) => v.into_owned(),
            Err(e) => {
                log::debug!("skipping init data field {key}: {e}");
                continue;
            }
        };
        match key {
            "user" => match serde_json::from_str::<HostUser>(&value) {
                Ok(user) => data.user = Some(user),
                Err(e) => log::debug!("unreadable user in init data: {e}"),
            },
            "auth_date" => data.auth_date = value.parse().ok(),
            _ => {}
        }
        data.params.insert(key.to_string(), value);
    }
    data
}

/// Init data naming only a user id, as produced by `--user`.
pub fn init_data_for_user(id: i64) -> String {
    let user = json!({ "id": id, "first_name": "Terminal", "username": "terminal" });
    format!("user={}", urlencoding::encode(&user.to_string()))
}

/// The terminal session acting as host.
#[derive(Debug)]
pub struct TerminalHost {
    init_data: Option<String>,
    attached: bool,
    theme: Theme,
    bell_on_error: bool,
    pub back_visible: bool,
    pub main_button: Option<String>,
}

impl TerminalHost {
    /// `user_override` wins over the environment.
    pub fn new(user_override: Option<i64>, theme: Theme, bell_on_error: bool) -> Self {
        let init_data = match user_override {
            Some(id) => Some(init_data_for_user(id)),
            None => std::env::var(INIT_DATA_ENV).ok().filter(|s| !s.trim().is_empty()),
        };
        let attached = init_data.is_some() || io::stdin().is_terminal();
        TerminalHost {
            init_data,
            attached,
            theme,
            bell_on_error,
            back_visible: false,
            main_button: None,
        }
    }
}

impl HostBridge for TerminalHost {
    fn is_available(&self) -> bool {
        self.attached
    }

    fn ready(&mut self) {
        log::debug!("terminal host ready");
    }

    fn expand(&mut self) {}

    fn init_data(&self) -> Option<String> {
        self.init_data.clone()
    }

    fn theme(&self) -> Theme {
        self.theme
    }

    fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    fn set_back_button(&mut self, visible: bool) {
        self.back_visible = visible;
    }

    fn set_main_button(&mut self, label: Option<&str>) {
        self.main_button = label.map(str::to_string);
    }

    fn haptic(&mut self, kind: Haptic) {
        if kind == Haptic::Error && self.bell_on_error {
            let mut out = io::stdout();
            if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
                log::debug!("bell failed: {e}");
            }
        }
    }
}

/// No host at all.
#[derive(Debug, Default)]
pub struct NullHost;

impl HostBridge for NullHost {
    fn is_available(&self) -> bool {
        false
    }
    fn ready(&mut self) {}
    fn expand(&mut self) {}
    fn init_data(&self) -> Option<String> {
        None
    }
    fn theme(&self) -> Theme {
        Theme::Auto
    }
    fn set_theme(&mut self, _theme: Theme) {}
    fn set_back_button(&mut self, _visible: bool) {}
    fn set_main_button(&mut self, _label: Option<&str>) {}
    fn haptic(&mut self, _kind: Haptic) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_init_data_decodes_user() {
        let raw = "query_id=AAE&user=%7B%22id%22%3A123456789%2C%22first_name%22%3A%22Ivan%22%7D&auth_date=1700000000";
        let data = parse_init_data(raw);
        let user = data.user.unwrap();
        assert_eq!(user.id, 123456789);
        assert_eq!(user.first_name, "Ivan");
        assert_eq!(data.auth_date, Some(1700000000));
        assert_eq!(data.params.get("query_id").map(String::as_str), Some("AAE"));
    }

    #[test]
    fn test_garbage_user_is_ignored() {
        let data = parse_init_data("user=not-json&&x");
        assert!(data.user.is_none());
        assert!(data.params.contains_key("x"));
    }

    #[test]
    fn test_user_override_round_trips() {
        let host = TerminalHost::new(Some(42), Theme::Dark, false);
        assert!(host.is_available());
        assert_eq!(host.user().map(|u| u.id), Some(42));
        assert!(NullHost.user().is_none());
    }
}
