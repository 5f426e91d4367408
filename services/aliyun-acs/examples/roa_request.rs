use acsign_aliyun_acs::{AcsRequest, Config, Signer};
use acsign_core::{Context, OsEnv, Result};
use acsign_http_send_reqwest::ReqwestHttpSend;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();

    let ctx = Context::new()
        .with_env(OsEnv)
        .with_http_send(ReqwestHttpSend::default());
    let signer = Signer::from_config(ctx.clone(), Config::default())?;

    let req = AcsRequest::new_roa("CS", "2015-12-15", "DescribeClustersV1", "/api/v1/clusters")
        .with_query_param("page_size", Some("10"));
    let host = format!("cs.{}.aliyuncs.com", signer.region_id());

    let resp = ctx.http_send_as_string(signer.sign(&host, &req).await?).await?;
    println!("status: {}", resp.status());
    println!("{}", resp.body());

    Ok(())
}
