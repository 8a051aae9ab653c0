use crate::configuration::Configuration;
use anyhow::{anyhow, Context, Result};
use ethers::abi::Abi;
use ethers::types::Address;
use log::{debug, info};
use serde_json::Value;
use url::Url;

/// Client for an Etherscan-compatible `getabi` endpoint.
pub struct ExplorerClient {
    pub base_url: String,
    pub api_key: String,
}

impl ExplorerClient {
    /// Returns `None` when no API key is configured.
    pub fn new(config: &Configuration) -> Option<Self> {
        config.etherscan_api_key.as_ref().map(|api_key| Self {
            base_url: config.explorer_api_url.clone(),
            api_key: api_key.clone(),
        })
    }

    pub async fn get_abi(&self, address: Address) -> Result<Abi> {
        let url = self.abi_url(address)?;
        let http_client = reqwest::Client::new();

        let response = http_client.get(url).send().await?;

        let response_body = match response.error_for_status_ref() {
            Ok(_) => response.json::<Value>().await?,
            Err(err) => {
                debug!("GET abi failed with body: {:?}", response.text().await?);
                return Err(anyhow!(err));
            }
        };

        let abi = parse_abi_response(&response_body)
            .with_context(|| format!("unable to resolve ABI for {:?}", address))?;

        info!(
            "resolved ABI for {:?} with {} functions",
            address,
            abi.functions.len()
        );

        Ok(abi)
    }

    fn abi_url(&self, address: Address) -> Result<Url> {
        Ok(Url::parse_with_params(
            &self.base_url,
            &[
                ("module", "contract"),
                ("action", "getabi"),
                ("address", &format!("{:?}", address)),
                ("apikey", &self.api_key),
            ],
        )?)
    }
}

fn parse_abi_response(response_body: &Value) -> Result<Abi> {
    let status = response_body["status"]
        .as_str()
        .context("unable to get `status` from explorer response")?;
    let result = response_body["result"]
        .as_str()
        .context("unable to get `result` from explorer response")?;

    if status != "1" {
        return Err(anyhow!("explorer rejected ABI request: {}", result));
    }

    Ok(serde_json::from_str::<Abi>(result)?)
}
