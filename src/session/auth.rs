// src/session/auth.rs

use crate::constants;
use regex::Regex;
use std::sync::LazyLock;

static AUTH_FAILURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", constants::AUTH_ERROR_KEYWORDS.join("|"))).unwrap()
});

/// 同步失败的粗略分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 账号或密码问题，需要回到登录页
    Authentication,
    Operational,
}

// 仅凭错误文本中的关键字判断，"login" 之类的词可能误判
pub fn classify_failure(message: &str) -> FailureKind {
    if AUTH_FAILURE_RE.is_match(message) {
        FailureKind::Authentication
    } else {
        FailureKind::Operational
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failure_by_keyword() {
        assert_eq!(classify_failure("Invalid password"), FailureKind::Authentication);
        assert_eq!(classify_failure("LOGIN page did not load"), FailureKind::Authentication);
        assert_eq!(classify_failure("Bad Credentials supplied"), FailureKind::Authentication);
        assert_eq!(classify_failure("OAuth redirect failed"), FailureKind::Authentication);
        assert_eq!(classify_failure("Network timeout"), FailureKind::Operational);
        assert_eq!(classify_failure("磁盘空间不足"), FailureKind::Operational);
    }
}
