//! Allow-list check for the user the host launched us for.
//!
//! The init data is taken at face value; this is an access filter, not a
//! security boundary.

use serde::{Deserialize, Serialize};

use crate::host::HostBridge;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Admin {
    pub host_user_id: i64,
    pub name: String,
}

pub fn default_admins() -> Vec<Admin> {
    vec![
        Admin { host_user_id: 123456789, name: "Chief Administrator".into() },
        Admin { host_user_id: 987654321, name: "Director Ivanov".into() },
    ]
}

/// User record as the host sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub language_code: String,
    pub is_premium: bool,
    pub photo_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: HostUser,
    pub admin: Admin,
    /// Set when dev mode stood in for a missing host or user.
    pub impersonated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    #[error("the console only runs inside the host")]
    HostUnavailable,
    #[error("could not read the user data")]
    NoUserData,
    #[error("account {0} has no access to this console")]
    NotAllowed(i64),
}

impl DenyReason {
    pub fn title(&self) -> &'static str {
        match self {
            DenyReason::HostUnavailable => "Launch error",
            DenyReason::NoUserData => "Authorization error",
            DenyReason::NotAllowed(_) => "Access denied",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            DenyReason::NotAllowed(_) => "Ask an administrator to add your account.",
            _ => "Open the console from the host application.",
        }
    }
}

pub fn find_admin(admins: &[Admin], host_user_id: i64) -> Option<&Admin> {
    admins.iter().find(|a| a.host_user_id == host_user_id)
}

fn impersonate(admins: &[Admin]) -> Session {
    let admin = admins
        .first()
        .cloned()
        .unwrap_or_else(|| Admin { host_user_id: 999999999, name: "Dev Admin".into() });
    log::info!("dev mode: acting as {}", admin.name);
    Session {
        user: HostUser {
            id: admin.host_user_id,
            first_name: "Dev".into(),
            last_name: "Admin".into(),
            username: "dev_admin".into(),
            ..HostUser::default()
        },
        admin,
        impersonated: true,
    }
}

/// Decide who is using the console. In dev mode a missing host or user is
/// replaced by the first admin; an unknown user is still refused.
pub fn authenticate(host: &dyn HostBridge, admins: &[Admin], dev_mode: bool) -> Result<Session, DenyReason> {
    if !host.is_available() {
        return if dev_mode { Ok(impersonate(admins)) } else { Err(DenyReason::HostUnavailable) };
    }
    let user = match host.user().filter(|u| u.id != 0) {
        Some(u) => u,
        None if dev_mode => return Ok(impersonate(admins)),
        None => return Err(DenyReason::NoUserData),
    };
    match find_admin(admins, user.id) {
        Some(admin) => {
            log::info!("authenticated {} ({})", admin.name, user.id);
            Ok(Session { admin: admin.clone(), user, impersonated: false })
        }
        None => {
            log::warn!("refused host user {}", user.id);
            Err(DenyReason::NotAllowed(user.id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Theme;
    use crate::host::{init_data_for_user, Haptic, NullHost};

    struct FakeHost(Option<String>);

    impl HostBridge for FakeHost {
        fn is_available(&self) -> bool {
            true
        }
        fn ready(&mut self) {}
        fn expand(&mut self) {}
        fn init_data(&self) -> Option<String> {
            self.0.clone()
        }
        fn theme(&self) -> Theme {
            Theme::Light
        }
        fn set_theme(&mut self, _theme: Theme) {}
        fn set_back_button(&mut self, _visible: bool) {}
        fn set_main_button(&mut self, _label: Option<&str>) {}
        fn haptic(&mut self, _kind: Haptic) {}
    }

    #[test]
    fn test_known_admin_is_let_in() {
        let host = FakeHost(Some(init_data_for_user(987654321)));
        let session = authenticate(&host, &default_admins(), false).unwrap();
        assert_eq!(session.admin.name, "Director Ivanov");
        assert!(!session.impersonated);
    }

    #[test]
    fn test_unknown_user_refused_even_in_dev_mode() {
        let host = FakeHost(Some(init_data_for_user(5)));
        assert_eq!(authenticate(&host, &default_admins(), true), Err(DenyReason::NotAllowed(5)));
    }

    #[test]
    fn test_missing_host_and_user() {
        assert_eq!(authenticate(&NullHost, &default_admins(), false), Err(DenyReason::HostUnavailable));
        assert_eq!(authenticate(&FakeHost(None), &default_admins(), false), Err(DenyReason::NoUserData));
    }

    #[test]
    fn test_dev_mode_impersonates_first_admin() {
        let session = authenticate(&NullHost, &default_admins(), true).unwrap();
        assert!(session.impersonated);
        assert_eq!(session.admin.host_user_id, 123456789);

        let session = authenticate(&FakeHost(None), &[], true).unwrap();
        assert_eq!(session.admin.name, "Dev Admin");
    }
}
