use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use async_trait::async_trait;
use drift_domain::{Provider as ProviderKind, Resource};
use hmac::{Hmac, Mac};
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader as XmlReader;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{ConnectionStatus, DiscoverOptions, DiscoverSummary, Provider};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct AwsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub tagging_base_url: String,
}

impl AwsConfig {
    /// `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`/`AWS_SESSION_TOKEN` (optional).
    pub fn from_env(region: &str) -> Result<Self, ProviderError> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| ProviderError::CredentialError("AWS_ACCESS_KEY_ID not set".into()))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| ProviderError::CredentialError("AWS_SECRET_ACCESS_KEY not set".into()))?;
        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: std::env::var("AWS_SESSION_TOKEN").ok(),
            tagging_base_url: format!("https://tagging.{}.amazonaws.com", region),
        })
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Percent-encode a query/body value per RFC 3986 unreserved-char rules,
/// matching what SigV4 canonical requests expect.
fn percent_encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

fn url_host(url: &str) -> &str {
    let without_scheme = url.trim_start_matches("https://").trim_start_matches("http://");
    match without_scheme.find('/') {
        Some(pos) => &without_scheme[..pos],
        None => without_scheme,
    }
}

/// Build SigV4 headers for an AWS API call. Caller still sets Content-Type.
fn sigv4_headers(
    method: &str,
    uri_path: &str,
    content_type: &str,
    body: &[u8],
    config: &AwsConfig,
    region: &str,
    service: &str,
    host: &str,
) -> BTreeMap<String, String> {
    let now = chrono::Utc::now();
    let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(body);

    let mut canon_hdrs: BTreeMap<String, String> = BTreeMap::new();
    canon_hdrs.insert("content-type".into(), content_type.into());
    canon_hdrs.insert("host".into(), host.into());
    canon_hdrs.insert("x-amz-content-sha256".into(), payload_hash.clone());
    canon_hdrs.insert("x-amz-date".into(), timestamp.clone());
    if let Some(ref token) = config.session_token {
        canon_hdrs.insert("x-amz-security-token".into(), token.clone());
    }

    let signed_headers: String = canon_hdrs.keys().cloned().collect::<Vec<_>>().join(";");
    let canonical_headers: String =
        canon_hdrs.iter().map(|(k, v)| format!("{}:{}\n", k, v.trim())).collect();

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method, uri_path, "", canonical_headers, signed_headers, payload_hash
    );

    let scope = format!("{}/{}/{}/aws4_request", date, region, service);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        timestamp,
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(&config.secret_access_key, &date, region, service);
    let signature = hmac_sha256(&signing_key, string_to_sign.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>();

    let auth = format!(
        "AWS4-HMAC-SHA256 Credential={}/{},SignedHeaders={},Signature={}",
        config.access_key_id, scope, signed_headers, signature
    );

    let mut out = BTreeMap::new();
    out.insert("Authorization".into(), auth);
    out.insert("x-amz-date".into(), timestamp);
    out.insert("x-amz-content-sha256".into(), payload_hash);
    if let Some(ref token) = config.session_token {
        out.insert("x-amz-security-token".into(), token.clone());
    }
    out
}

fn xml_error_code(xml: &str) -> String {
    xml_text(xml, "Code").unwrap_or_else(|| "Unknown".into())
}

fn xml_error_message(xml: &str) -> String {
    xml_text(xml, "Message").unwrap_or_else(|| "unknown error".into())
}

fn xml_text(xml: &str, tag: &str) -> Option<String> {
    let tag_bytes = tag.as_bytes();
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut in_tag = false;
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                if !in_tag && e.local_name().as_ref() == tag_bytes {
                    in_tag = true;
                    depth = 0;
                } else if in_tag {
                    depth += 1;
                }
            }
            Ok(XmlEvent::End(_)) => {
                if in_tag {
                    if depth == 0 {
                        return None;
                    }
                    depth -= 1;
                }
            }
            Ok(XmlEvent::Text(e)) if in_tag && depth == 0 => {
                return e.unescape().ok().map(|s| s.into_owned());
            }
            Ok(XmlEvent::Eof) | Err(_) => break,
            _ => {}
        }
    }
    None
}

pub struct AwsProvider {
    config: AwsConfig,
    client: reqwest::Client,
}

impl AwsProvider {
    pub fn new(config: AwsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// POST an AWS JSON-protocol (Target API) request, returning parsed JSON.
    async fn json_api(
        &self,
        base_url: &str,
        region: &str,
        service: &str,
        target: &str,
        body: &Value,
    ) -> Result<Value, ProviderError> {
        let host = url_host(base_url).to_string();
        let url = format!("{}/", base_url.trim_end_matches('/'));
        let body_str = serde_json::to_string(body).unwrap_or_default();
        let body_bytes = body_str.as_bytes();
        let ct = "application/x-amz-json-1.1";

        let sig_headers = sigv4_headers("POST", "/", ct, body_bytes, &self.config, region, service, &host);

        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", ct)
            .header("X-Amz-Target", target)
            .body(body_bytes.to_vec());
        for (k, v) in &sig_headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let resp = req.send().await.map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Throttled("aws rate limit".into()));
        }
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::CredentialError(format!(
                "aws rejected credentials: {}",
                body
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::NetworkError(format!("aws returned {}: {}", status, body)));
        }
        Ok(body)
    }

    /// POST an AWS Query-protocol request against the EC2 endpoint, returning raw XML.
    async fn ec2_query(
        &self,
        ec2_base_url: &str,
        region: &str,
        params: &[(&str, &str)],
    ) -> Result<String, ProviderError> {
        let host = url_host(ec2_base_url).to_string();
        let url = format!("{}/", ec2_base_url.trim_end_matches('/'));
        let body_str = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let body_bytes = body_str.as_bytes();
        let ct = "application/x-www-form-urlencoded; charset=utf-8";

        let sig_headers = sigv4_headers("POST", "/", ct, body_bytes, &self.config, region, "ec2", &host);
        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", ct)
            .body(body_bytes.to_vec());
        for (k, v) in &sig_headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let resp = req.send().await.map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Throttled("aws rate limit".into()));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::CredentialError(format!(
                "aws rejected credentials: {} — {}",
                xml_error_code(&text),
                xml_error_message(&text)
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::NetworkError(format!(
                "aws returned {}: {} — {}",
                status,
                xml_error_code(&text),
                xml_error_message(&text)
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl Provider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    async fn discover(
        &self,
        region: &str,
        _options: &DiscoverOptions,
    ) -> Result<(Vec<Resource>, DiscoverSummary), ProviderError> {
        debug!(region, "AwsProvider: discover");
        let start = Instant::now();
        let resp = self
            .json_api(
                &self.config.tagging_base_url,
                region,
                "tagging",
                "ResourceGroupsTaggingAPI_20170126.GetResources",
                &json!({}),
            )
            .await?;

        let empty = vec![];
        let list = resp["ResourceTagMappingList"].as_array().unwrap_or(&empty);
        let resources: Vec<Resource> = list
            .iter()
            .map(|item| {
                let arn = item["ResourceARN"].as_str().unwrap_or("").to_string();
                let resource_type = arn.split(':').nth(2).unwrap_or("unknown").to_string();
                let name = arn.rsplit(['/', ':']).next().unwrap_or(&arn).to_string();
                let tags: HashMap<String, String> = item["Tags"]
                    .as_array()
                    .unwrap_or(&empty)
                    .iter()
                    .filter_map(|t| {
                        let k = t["Key"].as_str()?;
                        let v = t["Value"].as_str()?;
                        Some((k.to_string(), v.to_string()))
                    })
                    .collect();
                Resource {
                    id: arn,
                    name,
                    resource_type,
                    provider: ProviderKind::Aws,
                    region: region.to_string(),
                    account: None,
                    status: "unknown".to_string(),
                    tags,
                    properties: HashMap::new(),
                    dependencies: vec![],
                    modified_at: None,
                    last_scanned: None,
                }
            })
            .collect();

        let summary = DiscoverSummary {
            region: region.to_string(),
            resource_count: resources.len(),
            errors: vec![],
            duration: start.elapsed(),
        };
        Ok((resources, summary))
    }

    async fn list_regions(&self) -> Result<Vec<String>, ProviderError> {
        let ec2_base_url = format!("https://ec2.{}.amazonaws.com", "us-east-1");
        let xml = self
            .ec2_query(&ec2_base_url, "us-east-1", &[("Action", "DescribeRegions"), ("Version", "2016-11-15")])
            .await?;
        let mut reader = XmlReader::from_str(&xml);
        reader.config_mut().trim_text(true);
        let mut regions = Vec::new();
        let mut in_region_name = false;
        loop {
            match reader.read_event() {
                Ok(XmlEvent::Start(e)) if e.local_name().as_ref() == b"regionName" => in_region_name = true,
                Ok(XmlEvent::Text(e)) if in_region_name => {
                    if let Ok(s) = e.unescape() {
                        regions.push(s.into_owned());
                    }
                    in_region_name = false;
                }
                Ok(XmlEvent::Eof) | Err(_) => break,
                _ => {}
            }
        }
        Ok(regions)
    }

    async fn test_connection(&self, region: &str) -> Result<ConnectionStatus, ProviderError> {
        let start = Instant::now();
        match self
            .json_api(
                &self.config.tagging_base_url,
                region,
                "tagging",
                "ResourceGroupsTaggingAPI_20170126.GetResources",
                &json!({}),
            )
            .await
        {
            Ok(_) => Ok(ConnectionStatus {
                ok: true,
                latency: start.elapsed(),
                message: "tagging API reachable".to_string(),
            }),
            Err(e) => Ok(ConnectionStatus {
                ok: false,
                latency: start.elapsed(),
                message: e.to_string(),
            }),
        }
    }
}
