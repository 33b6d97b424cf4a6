//! 对象键解析
//!
//! OSS 不接受以 `/` 开头的对象键，而且不会给出任何错误提示，
//! 所以每次访问远端之前都要先把相对路径规整成完整的键。

/// 规整根路径：去掉首尾的 `/`
pub fn normalize_root(root: &str) -> String {
    root.trim_matches('/').to_string()
}

/// 把相对路径解析为完整对象键
///
/// - 空路径返回根路径
/// - 已经带有根路径前缀的路径原样返回（重复解析结果不变）
/// - 其余情况用单个 `/` 拼接根路径与路径
pub fn resolve(root: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return root.to_string();
    }
    if root.is_empty() || has_root_prefix(root, path) {
        return path.to_string();
    }
    format!("{}/{}", root, path)
}

/// 按路径段判断前缀，`registry2/a` 不算带有 `registry` 前缀
fn has_root_prefix(root: &str, path: &str) -> bool {
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
