use crate::prelude::*;
use crate::service::var_service::get_request_timeout;
use reqwest::Client;

const USER_AGENT: &str = "climate-locate/1.0";

pub async fn get_http_client() -> Result<Client> {
    let timeout = get_request_timeout().await?;
    tracing::debug!("Building HTTP client with {:?} timeout", timeout);

    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}
