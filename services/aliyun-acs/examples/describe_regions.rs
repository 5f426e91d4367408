use acsign_aliyun_acs::endpoint::{EndpointResolver, LocationServiceClient, ResolveEndpointRequest};
use acsign_aliyun_acs::{AcsRequest, Config, Signer};
use acsign_core::{Context, OsEnv, Result};
use acsign_http_send_reqwest::ReqwestHttpSend;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();

    let ctx = Context::new()
        .with_env(OsEnv)
        .with_http_send(ReqwestHttpSend::default());

    // Credentials and region come from ALIBABA_CLOUD_* env.
    let config = Config::default().from_env(&ctx);
    let signer = Signer::from_config(ctx.clone(), config.clone())?;

    let resolver = EndpointResolver::new(LocationServiceClient::new(signer.clone()))
        .with_location_endpoint(config.location_service_endpoint());
    let resolution = resolver
        .resolve(
            &ResolveEndpointRequest::new("Ecs", signer.region_id())
                .with_location_service_code("ecs"),
        )
        .await?;
    let host = resolution.endpoint().unwrap_or("ecs.aliyuncs.com").to_string();
    println!("ecs endpoint: {host}");

    let req = AcsRequest::new("Ecs", "2014-05-26", "DescribeRegions");
    let resp = ctx.http_send_as_string(signer.sign(&host, &req).await?).await?;
    println!("status: {}", resp.status());
    println!("{}", resp.body());

    Ok(())
}
