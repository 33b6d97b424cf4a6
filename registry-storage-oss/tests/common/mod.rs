//! 内存版 OSS 模拟服务
//!
//! 实现 [`Transport`]，按 OSS 的状态码与 XML 报文应答，
//! 同时记录收到的请求，便于断言分片数量与顺序。

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use registry_storage_oss::{
    Method, OssConfig, OssRequest, OssResponse, OssStorage, StatusCode, Transport,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

pub const MIB: usize = 1024 * 1024;

/// 注入的故障
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// 初始化分片上传返回 500
    Initiate,
    /// 指定编号的分片返回 500
    Part(u32),
    /// 完成分片上传返回 400
    Complete,
    /// 列举返回 404
    ListNotFound,
    /// 读取对象返回 500
    GetServerError,
    /// HEAD 响应不带 Content-Length
    HeadWithoutLength,
    /// 分片响应不带 ETag
    PartWithoutEtag,
}

/// 记录下来的请求
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub key: String,
    pub sub_resources: Vec<(String, Option<String>)>,
    pub body_len: usize,
    pub signed: bool,
}

impl Recorded {
    pub fn has_sub_resource(&self, name: &str) -> bool {
        self.sub_resources.iter().any(|(k, _)| k == name)
    }
}

struct Upload {
    key: String,
    parts: BTreeMap<u32, Bytes>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, Bytes>,
    uploads: HashMap<String, Upload>,
    next_upload: u64,
    requests: Vec<Recorded>,
    faults: Vec<Fault>,
    page_limit: Option<usize>,
    completed: Vec<Vec<u32>>,
}

#[derive(Clone, Default)]
pub struct MockOss {
    state: Arc<Mutex<State>>,
}

impl MockOss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, fault: Fault) {
        self.state.lock().unwrap().faults.push(fault);
    }

    /// 限制每页返回的条数，用于验证翻页
    pub fn set_page_limit(&self, limit: usize) {
        self.state.lock().unwrap().page_limit = Some(limit);
    }

    pub fn insert(&self, key: &str, content: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(key.to_string(), Bytes::copy_from_slice(content));
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// 每次成功完成的分片上传所引用的分片编号
    pub fn completed_uploads(&self) -> Vec<Vec<u32>> {
        self.state.lock().unwrap().completed.clone()
    }

    pub fn pending_uploads(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }

    pub fn storage(&self, root: &str, buffer_size: usize) -> OssStorage {
        let config = OssConfig::new("oss-cn-hangzhou.aliyuncs.com", "test-id", "test-secret", "bkt")
            .with_root_path(root)
            .with_buffer_size(buffer_size);
        OssStorage::with_transport(config, Arc::new(self.clone())).unwrap()
    }

    fn handle(&self, req: &OssRequest) -> OssResponse {
        let mut state = self.state.lock().unwrap();
        let sub = |name: &str| -> Option<Option<String>> {
            req.sub_resources
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        let query = |name: &str| -> Option<String> {
            req.query
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };

        match req.method {
            Method::GET if req.key.is_empty() => {
                if state.faults.contains(&Fault::ListNotFound) {
                    return error(StatusCode::NOT_FOUND, "NoSuchBucket");
                }
                let prefix = query("prefix").unwrap_or_default();
                let marker = query("marker").unwrap_or_default();
                let mut max_keys: usize = query("max-keys")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000);
                if let Some(limit) = state.page_limit {
                    max_keys = max_keys.min(limit);
                }
                let matched: Vec<&String> = state
                    .objects
                    .keys()
                    .filter(|k| k.starts_with(&prefix) && k.as_str() > marker.as_str())
                    .collect();
                let truncated = matched.len() > max_keys;
                let page: Vec<&String> = matched.into_iter().take(max_keys).collect();
                let contents: String = page
                    .iter()
                    .map(|k| {
                        format!(
                            "<Contents><Key>{}</Key><Size>{}</Size></Contents>",
                            k,
                            state.objects[*k].len()
                        )
                    })
                    .collect();
                let next_marker = if truncated {
                    format!("<NextMarker>{}</NextMarker>", page[page.len() - 1])
                } else {
                    String::new()
                };
                let body = format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ListBucketResult><Name>bkt</Name><Prefix>{}</Prefix><Marker>{}</Marker><MaxKeys>{}</MaxKeys><IsTruncated>{}</IsTruncated>{}{}</ListBucketResult>",
                    prefix, marker, max_keys, truncated, next_marker, contents
                );
                xml(StatusCode::OK, body)
            }
            Method::GET => {
                if state.faults.contains(&Fault::GetServerError) {
                    return error(StatusCode::INTERNAL_SERVER_ERROR, "InternalError");
                }
                let Some(content) = state.objects.get(&req.key).cloned() else {
                    return error(StatusCode::NOT_FOUND, "NoSuchKey");
                };
                match req.header_value("range").and_then(|r| parse_range(r, content.len())) {
                    Some((start, end)) => {
                        let slice = content.slice(start..=end);
                        OssResponse::from_bytes(
                            StatusCode::PARTIAL_CONTENT,
                            vec![("Content-Length".to_string(), slice.len().to_string())],
                            slice,
                        )
                    }
                    None => OssResponse::from_bytes(
                        StatusCode::OK,
                        vec![("Content-Length".to_string(), content.len().to_string())],
                        content,
                    ),
                }
            }
            Method::HEAD => match state.objects.get(&req.key) {
                Some(content) => {
                    let mut headers = vec![("ETag".to_string(), "\"head\"".to_string())];
                    if !state.faults.contains(&Fault::HeadWithoutLength) {
                        headers.push(("Content-Length".to_string(), content.len().to_string()));
                    }
                    OssResponse::from_bytes(StatusCode::OK, headers, Bytes::new())
                }
                None => OssResponse::from_bytes(StatusCode::NOT_FOUND, Vec::new(), Bytes::new()),
            },
            Method::PUT => match (sub("partNumber"), sub("uploadId")) {
                (Some(Some(number)), Some(Some(upload_id))) => {
                    let number: u32 = number.parse().unwrap();
                    if state.faults.contains(&Fault::Part(number)) {
                        return error(StatusCode::INTERNAL_SERVER_ERROR, "InternalError");
                    }
                    let without_etag = state.faults.contains(&Fault::PartWithoutEtag);
                    let Some(upload) = state.uploads.get_mut(&upload_id) else {
                        return error(StatusCode::NOT_FOUND, "NoSuchUpload");
                    };
                    upload.parts.insert(number, req.body.clone());
                    let headers = if without_etag {
                        Vec::new()
                    } else {
                        vec![("ETag".to_string(), part_etag(&upload_id, number))]
                    };
                    OssResponse::from_bytes(StatusCode::OK, headers, Bytes::new())
                }
                _ => {
                    state.objects.insert(req.key.clone(), req.body.clone());
                    OssResponse::from_bytes(
                        StatusCode::OK,
                        vec![("ETag".to_string(), "\"object\"".to_string())],
                        Bytes::new(),
                    )
                }
            },
            Method::POST if sub("uploads").is_some() => {
                if state.faults.contains(&Fault::Initiate) {
                    return error(StatusCode::INTERNAL_SERVER_ERROR, "InternalError");
                }
                state.next_upload += 1;
                let upload_id = format!("UPLOAD{:04}", state.next_upload);
                state.uploads.insert(
                    upload_id.clone(),
                    Upload {
                        key: req.key.clone(),
                        parts: BTreeMap::new(),
                    },
                );
                xml(
                    StatusCode::OK,
                    format!(
                        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<InitiateMultipartUploadResult><Bucket>bkt</Bucket><Key>{}</Key><UploadId>{}</UploadId></InitiateMultipartUploadResult>",
                        req.key, upload_id
                    ),
                )
            }
            Method::POST => {
                let Some(Some(upload_id)) = sub("uploadId") else {
                    return error(StatusCode::BAD_REQUEST, "InvalidRequest");
                };
                if state.faults.contains(&Fault::Complete) {
                    return error(StatusCode::BAD_REQUEST, "InvalidPart");
                }
                let body = String::from_utf8_lossy(&req.body).into_owned();
                let numbers = tag_values(&body, "PartNumber");
                let etags = tag_values(&body, "ETag");
                let Some(upload) = state.uploads.remove(&upload_id) else {
                    return error(StatusCode::NOT_FOUND, "NoSuchUpload");
                };
                let mut content = Vec::new();
                for (number, etag) in numbers.iter().zip(etags.iter()) {
                    let number: u32 = number.parse().unwrap();
                    if *etag != part_etag(&upload_id, number) {
                        return error(StatusCode::BAD_REQUEST, "InvalidPart");
                    }
                    match upload.parts.get(&number) {
                        Some(part) => content.extend_from_slice(part),
                        None => return error(StatusCode::BAD_REQUEST, "InvalidPart"),
                    }
                }
                let numbers = numbers.iter().map(|n| n.parse().unwrap()).collect();
                state.completed.push(numbers);
                state.objects.insert(upload.key, Bytes::from(content));
                xml(
                    StatusCode::OK,
                    "<CompleteMultipartUploadResult></CompleteMultipartUploadResult>".to_string(),
                )
            }
            Method::DELETE => {
                state.objects.remove(&req.key);
                OssResponse::from_bytes(StatusCode::NO_CONTENT, Vec::new(), Bytes::new())
            }
            _ => error(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed"),
        }
    }
}

#[async_trait]
impl Transport for MockOss {
    async fn send(&self, request: OssRequest) -> registry_storage_oss::Result<OssResponse> {
        let signed = request.header_value("date").is_some()
            && request
                .header_value("authorization")
                .is_some_and(|v| v.starts_with("OSS test-id:"));
        let response = self.handle(&request);
        self.state.lock().unwrap().requests.push(Recorded {
            method: request.method.clone(),
            key: request.key.clone(),
            sub_resources: request.sub_resources.clone(),
            body_len: request.body.len(),
            signed,
        });
        Ok(response)
    }
}

fn part_etag(upload_id: &str, number: u32) -> String {
    format!("\"{}-{}\"", upload_id, number)
}

fn xml(status: StatusCode, body: String) -> OssResponse {
    OssResponse::from_bytes(
        status,
        vec![("Content-Type".to_string(), "application/xml".to_string())],
        Bytes::from(body),
    )
}

fn error(status: StatusCode, code: &str) -> OssResponse {
    xml(
        status,
        format!(
            "<Error><Code>{}</Code><Message>mock</Message><RequestId>MOCK</RequestId></Error>",
            code
        ),
    )
}

/// 解析 `bytes=a-b` 或 `bytes=a-`，返回闭区间
fn parse_range(header: &str, len: usize) -> Option<(usize, usize)> {
    let value = header.strip_prefix("bytes=")?;
    let (start, end) = value.split_once('-')?;
    let start: usize = start.parse().ok()?;
    if start >= len {
        return None;
    }
    let end = if end.is_empty() {
        len - 1
    } else {
        end.parse::<usize>().ok()?.min(len - 1)
    };
    Some((start, end))
}

/// 按出现顺序取出某个标签的文本，复原 XML 转义的引号
fn tag_values(body: &str, tag: &str) -> Vec<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let mut values = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(end) = after.find(&close) else {
            break;
        };
        values.push(after[..end].replace("&quot;", "\""));
        rest = &after[end + close.len()..];
    }
    values
}
