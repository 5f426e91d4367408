use acsign_core::{Context, Result};
use acsign_http_send_reqwest::ReqwestHttpSend;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .user_agent("acsign-example/1.0")
        .build()
        .map_err(|e| acsign_core::Error::config_invalid("invalid reqwest client").with_source(e))?;

    let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));

    // The location service answers unsigned requests with an error document,
    // which is enough to check connectivity.
    let req = http::Request::builder()
        .method("GET")
        .uri("https://location-readonly.aliyuncs.com/")
        .body(Bytes::new())?;

    let resp = ctx.http_send_as_string(req).await?;
    println!("status: {}", resp.status());
    println!("body: {}", resp.body());

    Ok(())
}
