//! Login presentation descriptor

use serde::{Deserialize, Serialize};

/// How a presentation layer should render the login entry for an
/// authenticator. Opaque to the directory client itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginStyle {
    /// Icon identifier, e.g. "c-square-fill"
    pub icon: String,

    /// Route the login form submits to
    #[serde(default = "default_login_route")]
    pub login_route: String,

    /// Submit directly without showing a credential form
    #[serde(default)]
    pub direct_submit: bool,
}

fn default_login_route() -> String {
    "maeser.login".to_string()
}

impl LoginStyle {
    pub fn new(icon: impl Into<String>, login_route: impl Into<String>, direct_submit: bool) -> Self {
        Self {
            icon: icon.into(),
            login_route: login_route.into(),
            direct_submit,
        }
    }

    /// Credential-form style with the default route
    pub fn form(icon: impl Into<String>) -> Self {
        Self::new(icon, default_login_route(), false)
    }
}

impl Default for LoginStyle {
    fn default() -> Self {
        Self::form("c-square-fill")
    }
}
