pub fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

pub fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

pub fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

pub fn default_userinfo_url() -> String {
    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
}

pub fn default_revoke_url() -> String {
    "https://oauth2.googleapis.com/revoke".to_string()
}

pub fn default_redirect_port() -> u16 {
    8765
}

pub fn default_scopes() -> Vec<String> {
    vec!["openid".to_string(), "email".to_string(), "profile".to_string()]
}

pub fn default_sign_in_timeout() -> u64 {
    120
}
