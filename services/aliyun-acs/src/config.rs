use crate::constants::*;
use acsign_core::Context;

/// Config carries all the configuration for Aliyun OpenAPI clients.
#[derive(Clone, Debug)]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `access_key_secret` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_SECRET`]
    pub access_key_secret: Option<String>,
    /// `security_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_SECURITY_TOKEN`]
    pub security_token: Option<String>,
    /// `bearer_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_BEARER_TOKEN`]
    pub bearer_token: Option<String>,
    /// `region_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_REGION_ID`]
    pub region_id: Option<String>,
    /// `signature_method` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_SIGNATURE_METHOD`]
    /// - default to `HMAC-SHA1`
    pub signature_method: Option<String>,
    /// `location_service_endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_LOCATION_ENDPOINT`]
    /// - default to `location-readonly.aliyuncs.com`
    pub location_service_endpoint: Option<String>,
    /// Scheme used when building request urls, default to `https`.
    pub protocol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key_id: None,
            access_key_secret: None,
            security_token: None,
            bearer_token: None,
            region_id: None,
            signature_method: None,
            location_service_endpoint: None,
            protocol: "https".to_string(),
        }
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_ACCESS_KEY_SECRET) {
            self.access_key_secret.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_SECURITY_TOKEN) {
            self.security_token.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_BEARER_TOKEN) {
            self.bearer_token.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_REGION_ID) {
            self.region_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_SIGNATURE_METHOD) {
            self.signature_method.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_LOCATION_ENDPOINT) {
            self.location_service_endpoint.get_or_insert(v);
        }

        self
    }

    /// The location service host, falling back to the public readonly endpoint.
    pub fn location_service_endpoint(&self) -> &str {
        self.location_service_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_LOCATION_SERVICE_ENDPOINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acsign_core::StaticEnv;
    use std::collections::HashMap;

    #[test]
    fn test_config_from_env() {
        let ctx = Context::new().with_env(StaticEnv {
            envs: HashMap::from([
                (ALIBABA_CLOUD_ACCESS_KEY_ID.to_string(), "env_ak".to_string()),
                (ALIBABA_CLOUD_ACCESS_KEY_SECRET.to_string(), "env_sk".to_string()),
                (ALIBABA_CLOUD_REGION_ID.to_string(), "cn-shanghai".to_string()),
                (
                    ALIBABA_CLOUD_SIGNATURE_METHOD.to_string(),
                    "HMAC-SHA256".to_string(),
                ),
            ]),
        });

        let config = Config {
            access_key_id: Some("field_ak".to_string()),
            ..Default::default()
        }
        .from_env(&ctx);

        // Fields set explicitly win over env.
        assert_eq!(config.access_key_id.as_deref(), Some("field_ak"));
        assert_eq!(config.access_key_secret.as_deref(), Some("env_sk"));
        assert_eq!(config.region_id.as_deref(), Some("cn-shanghai"));
        assert_eq!(config.signature_method.as_deref(), Some("HMAC-SHA256"));
        assert_eq!(config.security_token, None);
        assert_eq!(
            config.location_service_endpoint(),
            DEFAULT_LOCATION_SERVICE_ENDPOINT
        );
        assert_eq!(config.protocol, "https");
    }
}
