use acsign_core::{
    Context, ProvideCredential, ProvideCredentialChain, Result, SigningCredential, StaticEnv,
};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct ApiKey {
    key: String,
    secret: String,
}

impl SigningCredential for ApiKey {
    fn is_valid(&self) -> bool {
        !self.key.is_empty() && !self.secret.is_empty()
    }
}

/// Loads the key from `MY_API_KEY` / `MY_API_SECRET`.
#[derive(Debug)]
struct EnvApiKeyProvider;

#[async_trait]
impl ProvideCredential for EnvApiKeyProvider {
    type Credential = ApiKey;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let (Some(key), Some(secret)) = (ctx.env_var("MY_API_KEY"), ctx.env_var("MY_API_SECRET"))
        else {
            return Ok(None);
        };
        Ok(Some(ApiKey { key, secret }))
    }
}

/// Always offers the same key.
#[derive(Debug)]
struct FallbackProvider;

#[async_trait]
impl ProvideCredential for FallbackProvider {
    type Credential = ApiKey;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(ApiKey {
            key: "fallback".to_string(),
            secret: "fallback-secret".to_string(),
        }))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();

    let chain = ProvideCredentialChain::new()
        .push(EnvApiKeyProvider)
        .push(FallbackProvider);

    let empty = Context::new().with_env(StaticEnv::default());
    let cred = chain.provide_credential(&empty).await?;
    println!("without env: {:?}", cred.map(|c| c.key));

    let with_env = Context::new().with_env(StaticEnv {
        envs: HashMap::from([
            ("MY_API_KEY".to_string(), "from-env".to_string()),
            ("MY_API_SECRET".to_string(), "env-secret".to_string()),
        ]),
    });
    let cred = chain.provide_credential(&with_env).await?;
    println!(
        "with env: {:?}, valid: {}",
        cred.as_ref().map(|c| &c.key),
        cred.is_valid()
    );

    Ok(())
}
