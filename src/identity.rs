// ==========================================
// 仓库物资管理系统 - 身份提供者
// ==========================================
// 职责: 提供当前操作人身份, 用于盖章 counted_by / responsible_id / created_by
// 说明: 认证会话本身在系统边界之外, 这里只消费其结果;
//       拿不到身份时审计字段留空, 不阻断业务
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Actor - 操作人
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,           // 不透明标识
    pub display_name: String, // 展示名
}

// ==========================================
// IdentityProvider - 身份提供者接口
// ==========================================
pub trait IdentityProvider: Send + Sync {
    /// 当前操作人身份（未登录/不可用时为 None）
    fn current_actor(&self) -> Option<Actor>;
}

// ==========================================
// FixedIdentityProvider - 固定身份实现
// ==========================================
// 用途: 单机部署与测试
#[derive(Debug, Clone)]
pub struct FixedIdentityProvider {
    actor: Option<Actor>,
}

impl FixedIdentityProvider {
    /// 以固定操作人构造
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            actor: Some(Actor {
                id: id.into(),
                display_name: display_name.into(),
            }),
        }
    }

    /// 匿名（无身份）构造
    pub fn anonymous() -> Self {
        Self { actor: None }
    }
}

impl IdentityProvider for FixedIdentityProvider {
    fn current_actor(&self) -> Option<Actor> {
        self.actor.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_identity() {
        let provider = FixedIdentityProvider::new("u-001", "张三");
        let actor = provider.current_actor().unwrap();
        assert_eq!(actor.id, "u-001");
        assert_eq!(actor.display_name, "张三");

        assert!(FixedIdentityProvider::anonymous().current_actor().is_none());
    }
}
