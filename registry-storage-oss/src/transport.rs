//! HTTP 传输层
//!
//! [`OssClient`](crate::client::OssClient) 只负责组装和签名请求，
//! 真正的收发交给 [`Transport`]，默认实现基于 reqwest。

use crate::config::OssConfig;
use crate::error::Result;
use crate::headers::ResponseHeaders;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};
use std::io;

pub use reqwest::{Method, StatusCode};

/// 响应体字节流
pub type ResponseBody = BoxStream<'static, io::Result<Bytes>>;

/// 发往 OSS 的请求
#[derive(Debug, Clone)]
pub struct OssRequest {
    pub method: Method,
    /// 对象键，bucket 级请求为空
    pub key: String,
    /// 参与签名的子资源，如 `uploads`、`partNumber`、`uploadId`
    pub sub_resources: Vec<(String, Option<String>)>,
    /// 不参与签名的查询参数，如 `prefix`、`marker`
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl OssRequest {
    pub fn new(method: Method, key: &str) -> Self {
        Self {
            method,
            key: key.to_string(),
            sub_resources: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn sub_resource(mut self, name: &str, value: Option<String>) -> Self {
        self.sub_resources.push((name.to_string(), value));
        self
    }

    pub fn query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// 忽略大小写查找请求头
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 子资源与查询参数拼成的 query string，不含 `?`
    pub fn query_string(&self) -> String {
        let subs = self.sub_resources.iter().map(|(k, v)| match v {
            Some(v) => format!("{}={}", k, urlencoding::encode(v)),
            None => k.clone(),
        });
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)));
        subs.chain(query).collect::<Vec<_>>().join("&")
    }
}

/// OSS 的响应
pub struct OssResponse {
    pub status: StatusCode,
    /// 原始响应头列表
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl OssResponse {
    /// 用一段完整内容构造响应
    pub fn from_bytes(status: StatusCode, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body: stream::once(async move { Ok(body) }).boxed(),
        }
    }

    pub fn headers(&self) -> ResponseHeaders {
        ResponseHeaders::from_raw(&self.headers)
    }

    /// 读取完整响应体
    pub async fn bytes(self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        let mut body = self.body;
        while let Some(chunk) = body.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

/// 请求收发
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OssRequest) -> Result<OssResponse>;
}

/// 基于 reqwest 的传输实现，使用虚拟主机风格的地址 `https://{bucket}.{host}/{key}`
pub struct HttpTransport {
    client: reqwest::Client,
    scheme: String,
    host: String,
    bucket: String,
}

impl HttpTransport {
    /// 超时按连接建立和读空闲计算，不限制整个请求的总时长
    pub fn new(config: &OssConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .read_timeout(config.timeout())
            .build()?;
        let (scheme, host) = split_endpoint(config.host());
        Ok(Self {
            client,
            scheme: scheme.to_string(),
            host: host.to_string(),
            bucket: config.bucket().to_string(),
        })
    }

    fn url(&self, request: &OssRequest) -> String {
        let mut url = format!(
            "{}://{}.{}/{}",
            self.scheme,
            self.bucket,
            self.host,
            encode_key(&request.key)
        );
        let query = request.query_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OssRequest) -> Result<OssResponse> {
        let url = self.url(&request);
        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let resp = builder.body(request.body).send().await?;

        let status = resp.status();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = resp.bytes_stream().map_err(io::Error::other).boxed();

        Ok(OssResponse {
            status,
            headers,
            body,
        })
    }
}

/// 拆出端点的协议和主机，未写协议时默认 https
fn split_endpoint(endpoint: &str) -> (&str, &str) {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if let Some(host) = endpoint.strip_prefix("https://") {
        ("https", host)
    } else if let Some(host) = endpoint.strip_prefix("http://") {
        ("http", host)
    } else {
        ("https", endpoint)
    }
}

/// 逐段编码对象键，保留 `/`
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
